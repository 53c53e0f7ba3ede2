use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_BUSINESS_OPEN: (u32, u32) = (9, 0);
const DEFAULT_BUSINESS_CLOSE: (u32, u32) = (18, 0);

/// Clinic-wide opening window used when a lookup asks for business hours
/// instead of a practitioner's own schedule. Open is inclusive, close exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl BusinessHours {
    /// Returns `None` when the window is empty or inverted.
    pub fn new(open: NaiveTime, close: NaiveTime) -> Option<Self> {
        (open < close).then_some(Self { open, close })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.open <= time && time < self.close
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: hm(DEFAULT_BUSINESS_OPEN),
            close: hm(DEFAULT_BUSINESS_CLOSE),
        }
    }
}

/// How the reconciler picks a saved entity when several share a natural key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// First eligible saved entity in response order wins.
    #[default]
    FirstMatch,
    /// Map only when exactly one saved entity is eligible.
    UniqueOnly,
}

impl FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_match" => Ok(Self::FirstMatch),
            "unique_only" => Ok(Self::UniqueOnly),
            other => Err(format!("unknown reconcile policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub business_hours: BusinessHours,
    pub reconcile_policy: ReconcilePolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = BusinessHours::default();

        let open = time_from_env("BUSINESS_HOURS_OPEN", defaults.open);
        let close = time_from_env("BUSINESS_HOURS_CLOSE", defaults.close);

        let business_hours = BusinessHours::new(open, close).unwrap_or_else(|| {
            warn!(
                "Business hours window {}-{} is empty or inverted, using default {}-{}",
                open.format("%H:%M"),
                close.format("%H:%M"),
                defaults.open.format("%H:%M"),
                defaults.close.format("%H:%M")
            );
            defaults
        });

        let reconcile_policy = match env::var("RECONCILE_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using first_match", e);
                ReconcilePolicy::FirstMatch
            }),
            Err(_) => ReconcilePolicy::default(),
        };

        Self {
            business_hours,
            reconcile_policy,
        }
    }
}

fn time_from_env(key: &str, fallback: NaiveTime) -> NaiveTime {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", key, raw, fallback.format("%H:%M"));
            fallback
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, fallback.format("%H:%M"));
            fallback
        }
    }
}

fn hm((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_default_business_hours() {
        let hours = BusinessHours::default();
        assert_eq!(hours.open, t(9, 0));
        assert_eq!(hours.close, t(18, 0));
    }

    #[test]
    fn test_business_hours_boundaries() {
        let hours = BusinessHours::default();
        assert!(hours.contains(t(9, 0)));
        assert!(hours.contains(t(17, 59)));
        assert!(!hours.contains(t(18, 0)));
        assert!(!hours.contains(t(8, 59)));
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(BusinessHours::new(t(18, 0), t(9, 0)).is_none());
        assert!(BusinessHours::new(t(9, 0), t(9, 0)).is_none());
        assert!(BusinessHours::new(t(8, 30), t(17, 0)).is_some());
    }

    #[test]
    fn test_reconcile_policy_parsing() {
        assert_eq!("first_match".parse::<ReconcilePolicy>(), Ok(ReconcilePolicy::FirstMatch));
        assert_eq!(" UNIQUE_ONLY ".parse::<ReconcilePolicy>(), Ok(ReconcilePolicy::UniqueOnly));
        assert!("latest".parse::<ReconcilePolicy>().is_err());
    }
}
