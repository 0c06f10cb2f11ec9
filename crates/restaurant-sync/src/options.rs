//! Sync tuning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Records kept per capped set unless configured otherwise.
pub const DEFAULT_RETENTION: usize = 30;

/// What a drain does with pending reviews the server refused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayPolicy {
    /// Failed reviews stay queued for the next drain.
    #[default]
    RetainFailed,
    /// The drained batch is cleared whatever the outcome; failures are lost.
    LossyClear,
}

impl fmt::Display for ReplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayPolicy::RetainFailed => write!(f, "retain-failed"),
            ReplayPolicy::LossyClear => write!(f, "lossy-clear"),
        }
    }
}

impl FromStr for ReplayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain-failed" | "retain" => Ok(ReplayPolicy::RetainFailed),
            "lossy-clear" | "lossy" => Ok(ReplayPolicy::LossyClear),
            other => Err(format!(
                "unknown replay policy '{}' (expected retain-failed or lossy-clear)",
                other
            )),
        }
    }
}

/// Options for a [`SyncCoordinator`](crate::SyncCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Maximum records kept in the restaurant and synced review sets.
    pub retention: usize,
    pub replay_policy: ReplayPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            replay_policy: ReplayPolicy::default(),
        }
    }
}

impl SyncOptions {
    pub fn retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn replay_policy(mut self, policy: ReplayPolicy) -> Self {
        self.replay_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SyncOptions::default();
        assert_eq!(options.retention, 30);
        assert_eq!(options.replay_policy, ReplayPolicy::RetainFailed);
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("lossy-clear".parse::<ReplayPolicy>(), Ok(ReplayPolicy::LossyClear));
        assert_eq!("Retain".parse::<ReplayPolicy>(), Ok(ReplayPolicy::RetainFailed));
        assert!("sometimes".parse::<ReplayPolicy>().is_err());
        assert_eq!(ReplayPolicy::LossyClear.to_string(), "lossy-clear");
    }

    #[test]
    fn test_policy_serde_kebab_case() {
        let json = serde_json::to_string(&ReplayPolicy::RetainFailed).unwrap();
        assert_eq!(json, r#""retain-failed""#);

        let options: SyncOptions =
            serde_json::from_str(r#"{"replay_policy": "lossy-clear"}"#).unwrap();
        assert_eq!(options.retention, DEFAULT_RETENTION);
        assert_eq!(options.replay_policy, ReplayPolicy::LossyClear);
    }
}
