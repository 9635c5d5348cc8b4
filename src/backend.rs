//! Seam between the executor and the payment gateway it guards.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Which of the two backend calls a [`PaymentCall`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attempt {
    Primary,
    Retry,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Retry => f.write_str("retry"),
        }
    }
}

/// A single call into the payment backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaymentCall {
    pub amount: f64,
    /// Nominal latency of this call. Simulated backends sleep for it; real
    /// ones may ignore it.
    pub latency_hint: Duration,
    pub attempt: Attempt,
}

/// External payment collaborator driven by
/// [`BoundedCheckoutExecutor`](crate::BoundedCheckoutExecutor).
///
/// The executor drops the future returned by [`process_payment`] when its
/// deadline fires, which cancels any work owned by the future itself. It then
/// calls [`abandon`] so that backends with work living outside the future
/// (spawned tasks, remote holds) can release it.
///
/// [`process_payment`]: PaymentBackend::process_payment
/// [`abandon`]: PaymentBackend::abandon
pub trait PaymentBackend: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Processes one payment call. Settles after roughly `call.latency_hint`.
    fn process_payment(
        &self,
        call: PaymentCall,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns `true` if `err` is the backend's own timeout signal. Such
    /// errors take the retry path; all others are passed to the caller.
    fn is_timeout(&self, _err: &Self::Error) -> bool {
        false
    }

    /// Called after the future for `call` was dropped on a deadline.
    fn abandon(&self, _call: &PaymentCall) {}
}

impl<B: PaymentBackend> PaymentBackend for Arc<B> {
    type Error = B::Error;

    fn process_payment(
        &self,
        call: PaymentCall,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).process_payment(call)
    }

    fn is_timeout(&self, err: &Self::Error) -> bool {
        (**self).is_timeout(err)
    }

    fn abandon(&self, call: &PaymentCall) {
        (**self).abandon(call)
    }
}
