use std::sync::Once;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared_config::{AppConfig, BusinessHours, ReconcilePolicy};
use shared_models::PractitionerId;

static TRACING: Once = Once::new();

/// Installs a test-friendly subscriber once per test binary. Honors `RUST_LOG`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            ))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub struct TestConfig {
    pub business_open: (u32, u32),
    pub business_close: (u32, u32),
    pub reconcile_policy: ReconcilePolicy,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            business_open: (9, 0),
            business_close: (18, 0),
            reconcile_policy: ReconcilePolicy::FirstMatch,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        let open = clock(self.business_open);
        let close = clock(self.business_close);

        AppConfig {
            business_hours: BusinessHours::new(open, close).unwrap_or_default(),
            reconcile_policy: self.reconcile_policy,
        }
    }
}

/// Builds raw schedule feeds shaped like the transport layer delivers them.
#[derive(Default)]
pub struct ScheduleFeedBuilder {
    entries: Vec<Value>,
}

impl ScheduleFeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, practitioner_id: PractitionerId, date: &str, intervals: &[(&str, &str)]) -> Self {
        self.entries.push(json!({
            "practitionerId": practitioner_id,
            "date": date,
            "intervals": intervals
                .iter()
                .map(|(start, end)| json!({ "start": start, "end": end }))
                .collect::<Vec<_>>()
        }));
        self
    }

    /// One entry per consecutive day starting at `first_day`, all with the same intervals.
    pub fn days(
        mut self,
        practitioner_id: PractitionerId,
        first_day: NaiveDate,
        count: i64,
        intervals: &[(&str, &str)],
    ) -> Self {
        for offset in 0..count {
            let date = (first_day + Duration::days(offset)).format("%Y-%m-%d").to_string();
            self = self.entry(practitioner_id, &date, intervals);
        }
        self
    }

    pub fn raw(mut self, value: Value) -> Self {
        self.entries.push(value);
        self
    }

    pub fn build(self) -> Value {
        Value::Array(self.entries)
    }
}

pub struct MockScheduleFeeds;

impl MockScheduleFeeds {
    /// Practitioner 1 on 2024-01-15: 09:00-12:00 and 13:00-17:00.
    pub fn split_day() -> Value {
        ScheduleFeedBuilder::new()
            .entry(1, "2024-01-15", &[("09:00", "12:00"), ("13:00", "17:00")])
            .build()
    }

    /// Two practitioners, a closed day and a few malformed records.
    pub fn mixed_quality() -> Value {
        ScheduleFeedBuilder::new()
            .entry(1, "2024-01-15", &[("09:00", "12:00"), ("12:00", "09:00")])
            .entry(2, "2024-01-15", &[])
            .entry(2, "2024-01-16", &[("08:00", "10:00")])
            .raw(json!({ "practitionerId": 3, "date": "15-01-2024", "intervals": [] }))
            .raw(json!({ "practitionerId": null, "date": "2024-01-15", "intervals": [] }))
            .raw(json!(null))
            .build()
    }
}

fn clock((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.business_hours, BusinessHours::default());
        assert_eq!(config.reconcile_policy, ReconcilePolicy::FirstMatch);
    }

    #[test]
    fn test_feed_builder_days() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        let feed = ScheduleFeedBuilder::new()
            .days(5, first, 3, &[("09:00", "10:00")])
            .build();

        let entries = feed.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["date"], "2024-02-01");
        assert_eq!(entries[0]["intervals"][0]["end"], "10:00");
    }
}
