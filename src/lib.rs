//! `bounded-checkout` holds a payment call to a latency SLA.
//!
//! [`BoundedCheckoutExecutor`] races a [`PaymentBackend`] against the SLA
//! timer, runs exactly one deadline-bounded retry when the timer wins, and
//! re-checks total elapsed time before reporting:
//! - [`BoundedCheckoutExecutor::checkout`] resolves to `"OK"`
//! - [`BoundedCheckoutExecutor::execute`] resolves to a [`CheckoutReceipt`]
//!
//! Failures are a typed [`CheckoutError::Timeout`] or the backend's own error
//! passed through as [`CheckoutError::Backend`].

mod backend;
mod error;
mod executor;
mod options;
mod simulated;
mod types;

pub use backend::{Attempt, PaymentBackend, PaymentCall};
pub use error::{BackendError, CheckoutError};
pub use executor::BoundedCheckoutExecutor;
pub use options::{CheckoutOptions, SlaPolicy};
pub use simulated::SimulatedGateway;
pub use types::{CheckoutPhase, CheckoutReceipt, CheckoutRequest, CHECKOUT_OK};

pub type Result<T, E = BackendError> = std::result::Result<T, CheckoutError<E>>;
