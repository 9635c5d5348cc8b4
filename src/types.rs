use std::fmt;
use std::time::Duration;

/// Status string returned by a successful checkout.
pub const CHECKOUT_OK: &str = "OK";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckoutRequest {
    pub amount: f64,
}

impl CheckoutRequest {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl From<f64> for CheckoutRequest {
    fn from(amount: f64) -> Self {
        Self::new(amount)
    }
}

/// Successful checkout outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Always [`CHECKOUT_OK`].
    pub status: &'static str,
    /// Backend calls made, primary included (1 or 2).
    pub attempts: u8,
    pub retried: bool,
    /// Wall-clock time at the final SLA check.
    pub elapsed: Duration,
}

/// Phase a checkout was in when it gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Primary attempt running against the SLA timer.
    Racing,
    /// Single retry running against its own timer.
    Retrying,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Racing => "racing",
            Self::Retrying => "retrying",
        };
        f.write_str(name)
    }
}
