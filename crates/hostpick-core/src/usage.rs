//! Usage telemetry.
//!
//! The workflow reports which phase it reached through a [`UsageSink`] handle
//! it is given at construction. Recording is fire-and-forget: sinks return
//! nothing, and a sink that cannot record simply drops the attribute.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

/// `tracing` target used by [`TracingUsageSink`].
pub const USAGE_TARGET: &str = "hostpick::usage";

/// Attribute key identifying a workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum UsageKey {
    /// Services found and a target picked.
    #[serde(rename = "app.init.detected.services")]
    DetectedServices,
    /// The user confirmed the detected services.
    #[serde(rename = "app.init.confirmed.services")]
    ConfirmedServices,
}

impl UsageKey {
    /// Attribute name as reported to telemetry.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DetectedServices => "app.init.detected.services",
            Self::ConfirmedServices => "app.init.confirmed.services",
        }
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for usage attributes.
pub trait UsageSink {
    /// Record `values` under `key`, replacing any earlier value for `key`.
    fn record_usage(&self, key: UsageKey, values: &[String]);
}

impl<S: UsageSink + ?Sized> UsageSink for &S {
    fn record_usage(&self, key: UsageKey, values: &[String]) {
        (**self).record_usage(key, values);
    }
}

/// Sink that emits each attribute as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUsageSink;

impl UsageSink for TracingUsageSink {
    fn record_usage(&self, key: UsageKey, values: &[String]) {
        info!(target: USAGE_TARGET, key = key.as_str(), ?values, "usage recorded");
    }
}

/// Sink that keeps attributes in memory.
///
/// Later records for a key overwrite earlier ones; [`events`](Self::events)
/// keeps the full history.
#[derive(Debug, Default)]
pub struct InMemoryUsage {
    inner: Mutex<UsageLog>,
}

#[derive(Debug, Default)]
struct UsageLog {
    attributes: BTreeMap<UsageKey, Vec<String>>,
    events: Vec<(UsageKey, Vec<String>)>,
}

impl InMemoryUsage {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current attribute set.
    pub fn attributes(&self) -> BTreeMap<UsageKey, Vec<String>> {
        self.inner
            .lock()
            .map(|log| log.attributes.clone())
            .unwrap_or_default()
    }

    /// Every record, in the order received.
    pub fn events(&self) -> Vec<(UsageKey, Vec<String>)> {
        self.inner
            .lock()
            .map(|log| log.events.clone())
            .unwrap_or_default()
    }

    /// Number of records received for `key`.
    pub fn count(&self, key: UsageKey) -> usize {
        self.events().iter().filter(|(k, _)| *k == key).count()
    }
}

impl UsageSink for InMemoryUsage {
    fn record_usage(&self, key: UsageKey, values: &[String]) {
        let Ok(mut log) = self.inner.lock() else {
            warn!(key = key.as_str(), "usage log poisoned; dropping record");
            return;
        };
        log.attributes.insert(key, values.to_vec());
        log.events.push((key, values.to_vec()));
    }
}

/// Fans a record out to two sinks.
#[derive(Debug, Clone, Copy)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: UsageSink, B: UsageSink> UsageSink for Tee<A, B> {
    fn record_usage(&self, key: UsageKey, values: &[String]) {
        self.0.record_usage(key, values);
        self.1.record_usage(key, values);
    }
}
