use crate::types::CheckoutPhase;

/// Error type returned by [`BoundedCheckoutExecutor`](crate::BoundedCheckoutExecutor).
///
/// `E` is the backend's own error type, passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError<E> {
    /// The checkout, including its single retry, did not fit the SLA.
    #[error("checkout timed out after {elapsed_ms} ms (sla {sla_ms} ms): {message}")]
    Timeout {
        /// Human-readable reason, e.g. `payment gateway exceeded 5s`.
        message: String,
        /// Wall-clock time from start to the failing check.
        elapsed_ms: u64,
        /// SLA the checkout was held to.
        sla_ms: u64,
        /// Phase the checkout was in when it gave up.
        phase: CheckoutPhase,
    },
    /// Non-timeout error raised by the payment backend.
    #[error("payment backend error: {0}")]
    Backend(#[source] E),
}

impl<E> CheckoutError<E> {
    pub(crate) fn timeout(sla_ms: u64, elapsed_ms: u64, phase: CheckoutPhase) -> Self {
        Self::Timeout {
            message: sla_exceeded_message(sla_ms),
            elapsed_ms,
            sla_ms,
            phase,
        }
    }

    /// Timeout raised by the retry while the checkout is still inside the SLA.
    pub(crate) fn retry_timeout(message: String, sla_ms: u64, elapsed_ms: u64) -> Self {
        Self::Timeout {
            message,
            elapsed_ms,
            sla_ms,
            phase: CheckoutPhase::Retrying,
        }
    }

    /// Returns `true` for [`CheckoutError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the backend error, if this is a pass-through failure.
    pub fn backend(&self) -> Option<&E> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Timeout { .. } => None,
        }
    }

    pub fn into_backend(self) -> Option<E> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Timeout { .. } => None,
        }
    }
}

fn sla_exceeded_message(sla_ms: u64) -> String {
    if sla_ms % 1_000 == 0 {
        format!("payment gateway exceeded {}s", sla_ms / 1_000)
    } else {
        format!("payment gateway exceeded {sla_ms} ms")
    }
}

/// Error type of the bundled [`SimulatedGateway`](crate::SimulatedGateway).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The gateway refused the payment.
    #[error("payment declined: {reason}")]
    Declined { reason: String },
    /// The gateway could not be reached or answered with a server fault.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
    /// The gateway gave up on its own deadline.
    #[error("payment gateway timed out")]
    TimedOut,
}
