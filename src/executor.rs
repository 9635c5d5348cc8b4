use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};

use crate::{
    backend::{Attempt, PaymentBackend, PaymentCall},
    CheckoutError, CheckoutOptions, CheckoutPhase, CheckoutReceipt, CheckoutRequest, SlaPolicy,
    CHECKOUT_OK,
};

/// How the single retry settled.
enum RetrySettlement<E> {
    Settled,
    Failed(E),
    /// Backend reported its own timeout.
    TimedOut,
    /// Retry deadline fired first.
    DeadlineFired,
}

/// Runs checkouts against a payment backend under a latency SLA.
///
/// Each checkout races the backend against the SLA timer. If the timer wins,
/// the primary call is dropped and exactly one retry runs under the shorter
/// retry deadline, after which elapsed time is checked against the SLA again.
/// Non-timeout backend errors are returned as-is without a retry.
///
/// The executor holds no per-checkout state, so one instance can serve any
/// number of concurrent checkouts.
pub struct BoundedCheckoutExecutor<B> {
    backend: Arc<B>,
    options: CheckoutOptions,
}

impl<B> Clone for BoundedCheckoutExecutor<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            options: self.options.clone(),
        }
    }
}

impl<B> fmt::Debug for BoundedCheckoutExecutor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCheckoutExecutor")
            .field("backend", &std::any::type_name::<B>())
            .field("options", &self.options)
            .finish()
    }
}

impl<B: PaymentBackend> BoundedCheckoutExecutor<B> {
    /// Creates an executor with [`CheckoutOptions::default`].
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Creates an executor sharing an existing backend handle.
    pub fn from_arc(backend: Arc<B>) -> Self {
        Self {
            backend,
            options: CheckoutOptions::default(),
        }
    }

    /// Applies deadline and latency options.
    ///
    /// Options built by hand are not checked here; see
    /// [`CheckoutOptions::validate`].
    pub fn with_options(mut self, options: CheckoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CheckoutOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs a checkout and returns the literal status `"OK"` on success.
    pub async fn checkout(&self, amount: f64) -> Result<String, CheckoutError<B::Error>> {
        let receipt = self.execute(CheckoutRequest::new(amount)).await?;
        Ok(receipt.status.to_owned())
    }

    /// Runs a checkout and returns a receipt describing how it completed.
    pub async fn execute(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError<B::Error>> {
        let started = Instant::now();
        let sla = self.options.sla();

        let primary = PaymentCall {
            amount: request.amount,
            latency_hint: self.options.primary_latency_hint(),
            attempt: Attempt::Primary,
        };

        match timeout(sla, self.backend.process_payment(primary)).await {
            Ok(Ok(())) => {
                let elapsed = started.elapsed();
                if elapsed > sla {
                    return Err(self.sla_exceeded(elapsed, CheckoutPhase::Racing));
                }
                return Ok(receipt(1, elapsed));
            }
            Ok(Err(err)) if !self.backend.is_timeout(&err) => {
                return Err(CheckoutError::Backend(err));
            }
            Ok(Err(_)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(amount = request.amount, "backend reported timeout, retrying");
            }
            Err(_) => {
                self.backend.abandon(&primary);

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    amount = request.amount,
                    sla_ms = self.options.sla_ms,
                    "primary payment call missed the sla, retrying"
                );
            }
        }

        let settlement = self.retry(request).await;
        let elapsed = started.elapsed();

        if self.options.sla_policy == SlaPolicy::Strict && elapsed > sla {
            return Err(self.sla_exceeded(elapsed, CheckoutPhase::Retrying));
        }

        match settlement {
            RetrySettlement::Settled => Ok(receipt(2, elapsed)),
            RetrySettlement::Failed(err) => Err(CheckoutError::Backend(err)),
            RetrySettlement::TimedOut | RetrySettlement::DeadlineFired if elapsed > sla => {
                Err(self.sla_exceeded(elapsed, CheckoutPhase::Retrying))
            }
            RetrySettlement::TimedOut => {
                Err(self.retry_timed_out("payment gateway retry timed out".to_owned(), elapsed))
            }
            RetrySettlement::DeadlineFired => Err(self.retry_timed_out(
                format!(
                    "payment gateway retry exceeded {} ms",
                    self.options.retry_timeout_ms
                ),
                elapsed,
            )),
        }
    }

    async fn retry(&self, request: CheckoutRequest) -> RetrySettlement<B::Error> {
        let call = PaymentCall {
            amount: request.amount,
            latency_hint: self.options.retry_latency_hint(),
            attempt: Attempt::Retry,
        };

        match timeout(self.options.retry_timeout(), self.backend.process_payment(call)).await {
            Ok(Ok(())) => RetrySettlement::Settled,
            Ok(Err(err)) if self.backend.is_timeout(&err) => RetrySettlement::TimedOut,
            Ok(Err(err)) => RetrySettlement::Failed(err),
            Err(_) => {
                self.backend.abandon(&call);

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    retry_timeout_ms = self.options.retry_timeout_ms,
                    "retry payment call missed its deadline"
                );

                RetrySettlement::DeadlineFired
            }
        }
    }

    fn sla_exceeded(&self, elapsed: Duration, phase: CheckoutPhase) -> CheckoutError<B::Error> {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        #[cfg(feature = "tracing")]
        tracing::warn!(
            elapsed_ms,
            sla_ms = self.options.sla_ms,
            %phase,
            "checkout exceeded sla"
        );

        CheckoutError::timeout(self.options.sla_ms, elapsed_ms, phase)
    }

    fn retry_timed_out(&self, message: String, elapsed: Duration) -> CheckoutError<B::Error> {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        #[cfg(feature = "tracing")]
        tracing::warn!(elapsed_ms, %message, "checkout retry timed out");

        CheckoutError::retry_timeout(message, self.options.sla_ms, elapsed_ms)
    }
}

fn receipt(attempts: u8, elapsed: Duration) -> CheckoutReceipt {
    CheckoutReceipt {
        status: CHECKOUT_OK,
        attempts,
        retried: attempts > 1,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::BoundedCheckoutExecutor;
    use crate::backend::{Attempt, PaymentBackend, PaymentCall};
    use crate::{
        BackendError, CheckoutError, CheckoutOptions, CheckoutPhase, CheckoutRequest,
        SimulatedGateway,
    };

    /// Records every call and abandon, then behaves like the simulated gateway.
    #[derive(Default)]
    struct RecordingGateway {
        inner: SimulatedGateway,
        calls: Mutex<Vec<PaymentCall>>,
        abandoned: Mutex<Vec<Attempt>>,
    }

    impl RecordingGateway {
        fn abandoned(&self) -> Vec<Attempt> {
            self.abandoned
                .lock()
                .expect("abandon log mutex must not be poisoned")
                .clone()
        }
    }

    impl PaymentBackend for RecordingGateway {
        type Error = BackendError;

        async fn process_payment(&self, call: PaymentCall) -> Result<(), BackendError> {
            self.calls
                .lock()
                .expect("call log mutex must not be poisoned")
                .push(call);
            self.inner.process_payment(call).await
        }

        fn abandon(&self, call: &PaymentCall) {
            self.abandoned
                .lock()
                .expect("abandon log mutex must not be poisoned")
                .push(call.attempt);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reference_scenario_times_out_after_retry() {
        let executor = BoundedCheckoutExecutor::new(RecordingGateway::default());

        let err = executor
            .checkout(100.0)
            .await
            .expect_err("6s gateway must break the 5s sla");

        match err {
            CheckoutError::Timeout {
                message,
                elapsed_ms,
                sla_ms,
                phase,
            } => {
                assert_eq!(message, "payment gateway exceeded 5s");
                assert_eq!(sla_ms, 5_000);
                assert!(elapsed_ms >= 8_000 && elapsed_ms < 9_000);
                assert_eq!(phase, CheckoutPhase::Retrying);
            }
            CheckoutError::Backend(err) => panic!("expected timeout, got {err}"),
        }

        let calls = executor
            .backend()
            .calls
            .lock()
            .expect("call log mutex must not be poisoned")
            .clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].latency_hint, Duration::from_millis(6_000));
        assert_eq!(calls[1].attempt, Attempt::Retry);
        assert_eq!(calls[1].latency_hint, Duration::from_millis(3_000));
        assert_eq!(calls[1].amount, 100.0);
        let abandoned = executor.backend().abandoned();
        assert_eq!(abandoned.first(), Some(&Attempt::Primary));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_primary_skips_retry() {
        let executor = BoundedCheckoutExecutor::new(RecordingGateway::default()).with_options(
            CheckoutOptions {
                primary_latency_hint_ms: 1_200,
                ..CheckoutOptions::default()
            },
        );

        let receipt = executor
            .execute(CheckoutRequest::from(42.0))
            .await
            .expect("fast gateway must succeed");

        assert_eq!(receipt.status, "OK");
        assert_eq!(receipt.attempts, 1);
        assert!(!receipt.retried);
        assert!(receipt.elapsed <= Duration::from_millis(5_000));
        assert!(executor.backend().abandoned().is_empty());
    }

    #[test]
    fn debug_shows_backend_type_and_options() {
        let executor = BoundedCheckoutExecutor::new(SimulatedGateway::new());
        let debug = format!("{executor:?}");
        assert!(debug.contains("SimulatedGateway"));
        assert!(debug.contains("sla_ms: 5000"));
    }
}
