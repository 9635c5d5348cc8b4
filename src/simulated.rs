//! Stand-in gateway that only burns time.

use tokio::time::sleep;

use crate::{
    backend::{PaymentBackend, PaymentCall},
    BackendError,
};

/// Payment backend that sleeps for each call's latency hint, then settles.
///
/// With the default options this reproduces the slow-gateway scenario: the
/// primary call takes 6 s against a 5 s SLA.
#[derive(Clone, Debug, Default)]
pub struct SimulatedGateway {
    decline_reason: Option<String>,
}

impl SimulatedGateway {
    /// Creates a gateway that approves every payment after the delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that declines every payment after the delay.
    pub fn declining(reason: impl Into<String>) -> Self {
        Self {
            decline_reason: Some(reason.into()),
        }
    }
}

impl PaymentBackend for SimulatedGateway {
    type Error = BackendError;

    async fn process_payment(&self, call: PaymentCall) -> Result<(), BackendError> {
        sleep(call.latency_hint).await;
        match &self.decline_reason {
            Some(reason) => Err(BackendError::Declined {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn is_timeout(&self, err: &BackendError) -> bool {
        matches!(err, BackendError::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::SimulatedGateway;
    use crate::backend::{Attempt, PaymentBackend, PaymentCall};
    use crate::BackendError;

    fn call(latency_ms: u64) -> PaymentCall {
        PaymentCall {
            amount: 100.0,
            latency_hint: Duration::from_millis(latency_ms),
            attempt: Attempt::Primary,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_latency_hint() {
        let started = Instant::now();
        SimulatedGateway::new()
            .process_payment(call(6_000))
            .await
            .expect("simulated payment must succeed");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(6_000));
        assert!(elapsed < Duration::from_millis(6_100));
    }

    #[tokio::test(start_paused = true)]
    async fn declining_gateway_returns_reason() {
        let gateway = SimulatedGateway::declining("insufficient funds");
        let err = gateway
            .process_payment(call(10))
            .await
            .expect_err("payment must be declined");

        assert_eq!(
            err,
            BackendError::Declined {
                reason: "insufficient funds".to_owned()
            }
        );
        assert!(!gateway.is_timeout(&err));
        assert!(gateway.is_timeout(&BackendError::TimedOut));
    }
}
