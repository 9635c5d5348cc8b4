use std::time::Duration;

use serde::{de, Deserialize, Deserializer};

/// Decides what a retry that finished after the SLA counts as.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SlaPolicy {
    /// Elapsed time is always checked against the SLA, even after a
    /// successful retry.
    #[default]
    Strict,
    /// A successful retry returns OK regardless of elapsed time.
    AcceptRetrySuccess,
}

impl SlaPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "accept_retry_success" | "accept-retry-success" => Some(Self::AcceptRetrySuccess),
            _ => None,
        }
    }
}

/// Configures deadlines and latency hints for a checkout.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct CheckoutOptions {
    /// Overall SLA in milliseconds. Also the deadline on the primary attempt.
    /// Must be greater than zero.
    #[serde(deserialize_with = "positive_millis")]
    pub sla_ms: u64,
    /// Deadline on the single retry in milliseconds.
    pub retry_timeout_ms: u64,
    /// Latency hint handed to the backend for the primary attempt.
    pub primary_latency_hint_ms: u64,
    /// Latency hint handed to the backend for the retry.
    pub retry_latency_hint_ms: u64,
    pub sla_policy: SlaPolicy,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            sla_ms: 5_000,
            retry_timeout_ms: 3_000,
            primary_latency_hint_ms: 6_000,
            retry_latency_hint_ms: 3_000,
            sla_policy: SlaPolicy::Strict,
        }
    }
}

impl CheckoutOptions {
    pub fn sla(&self) -> Duration {
        Duration::from_millis(self.sla_ms)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    pub fn primary_latency_hint(&self) -> Duration {
        Duration::from_millis(self.primary_latency_hint_ms)
    }

    pub fn retry_latency_hint(&self) -> Duration {
        Duration::from_millis(self.retry_latency_hint_ms)
    }

    /// Checks invariants that struct literals can bypass.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sla_ms == 0 {
            return Err("sla_ms must be greater than zero".to_owned());
        }
        Ok(())
    }

    /// Reads options from the environment, falling back to defaults.
    ///
    /// Reads:
    /// - `CHECKOUT_SLA_MS`
    /// - `CHECKOUT_RETRY_TIMEOUT_MS`
    /// - `CHECKOUT_PRIMARY_LATENCY_MS`
    /// - `CHECKOUT_RETRY_LATENCY_MS`
    /// - `CHECKOUT_SLA_POLICY` — `strict` or `accept_retry_success`
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if the
    /// SLA is zero.
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let millis = |key: &str, slot: &mut u64| -> std::result::Result<(), String> {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|err| format!("{key} is not a millisecond count: {err}"))?;
            }
            Ok(())
        };

        millis("CHECKOUT_SLA_MS", &mut options.sla_ms)?;
        millis("CHECKOUT_RETRY_TIMEOUT_MS", &mut options.retry_timeout_ms)?;
        millis("CHECKOUT_PRIMARY_LATENCY_MS", &mut options.primary_latency_hint_ms)?;
        millis("CHECKOUT_RETRY_LATENCY_MS", &mut options.retry_latency_hint_ms)?;

        if let Some(raw) = lookup("CHECKOUT_SLA_POLICY") {
            options.sla_policy = SlaPolicy::parse(&raw)
                .ok_or_else(|| format!("CHECKOUT_SLA_POLICY has unknown value '{raw}'"))?;
        }

        options
            .validate()
            .map_err(|err| format!("CHECKOUT_SLA_MS is invalid: {err}"))?;
        Ok(options)
    }
}

fn positive_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u64::deserialize(deserializer)?;
    if value == 0 {
        return Err(de::Error::custom("sla_ms must be greater than zero"));
    }
    Ok(value)
}
