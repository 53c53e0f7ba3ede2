// libs/availability-cell/src/services/index.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use shared_models::{PractitionerId, ValidationError};

use crate::models::{
    parse_schedule_date, BuildReport, RawInterval, RawScheduleEntry, TimeInterval,
};

/// Validated opening intervals keyed by practitioner, then by date.
///
/// A missing practitioner or date means "no information". A date that is
/// present with no intervals means the practitioner is explicitly closed
/// that day. Intervals keep feed order and are not merged or de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityIndex {
    schedules: BTreeMap<PractitionerId, BTreeMap<NaiveDate, Vec<TimeInterval>>>,
}

impl AvailabilityIndex {
    /// Builds an index from already-deserialized feed entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = RawScheduleEntry>,
    {
        let mut builder = IndexBuilder::default();
        for entry in entries {
            builder.push(entry.practitioner_id, &entry.date, entry.intervals);
        }
        builder.finish().0
    }

    pub fn intervals_for(&self, practitioner_id: PractitionerId, date: NaiveDate) -> Option<&[TimeInterval]> {
        self.schedules
            .get(&practitioner_id)
            .and_then(|dates| dates.get(&date))
            .map(Vec::as_slice)
    }

    pub fn contains_practitioner(&self, practitioner_id: PractitionerId) -> bool {
        self.schedules.contains_key(&practitioner_id)
    }

    /// Practitioner ids in ascending order.
    pub fn practitioners(&self) -> Vec<PractitionerId> {
        self.schedules.keys().copied().collect()
    }

    /// Dates with schedule data for the practitioner, ascending.
    pub fn dates_for(&self, practitioner_id: PractitionerId) -> Vec<NaiveDate> {
        self.schedules
            .get(&practitioner_id)
            .map(|dates| dates.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of (practitioner, date) keys.
    pub fn len(&self) -> usize {
        self.schedules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

/// Builds an index from the raw schedule feed. Anything that is not an array
/// yields an empty index.
pub fn build_index(raw: &Value) -> AvailabilityIndex {
    build_index_with_report(raw).0
}

#[instrument(skip(raw))]
pub fn build_index_with_report(raw: &Value) -> (AvailabilityIndex, BuildReport) {
    let Some(entries) = raw.as_array() else {
        debug!("Schedule feed is not an array, building empty index");
        return (AvailabilityIndex::default(), BuildReport::default());
    };

    let mut builder = IndexBuilder::default();

    for (position, entry) in entries.iter().enumerate() {
        let envelope = match FeedEntry::deserialize(entry) {
            Ok(envelope) => envelope,
            Err(e) => {
                let e = ValidationError::MalformedEntry(e.to_string());
                debug!("Discarding schedule entry #{}: {}", position, e);
                builder.report.discarded_entries += 1;
                continue;
            }
        };

        let mut intervals = Vec::with_capacity(envelope.intervals.len());
        for value in &envelope.intervals {
            match RawInterval::deserialize(value) {
                Ok(interval) => intervals.push(interval),
                Err(e) => {
                    let e = ValidationError::MalformedEntry(e.to_string());
                    debug!(
                        "Dropping malformed interval in entry #{} for practitioner {}: {}",
                        position, envelope.practitioner_id, e
                    );
                    builder.report.dropped_intervals += 1;
                }
            }
        }

        builder.push(envelope.practitioner_id, &envelope.date, intervals);
    }

    let (index, report) = builder.finish();
    info!(
        "Built availability index: {} practitioners, {} dated schedules, {} intervals ({} entries and {} intervals dropped)",
        index.schedules.len(),
        index.len(),
        report.accepted_intervals,
        report.discarded_entries,
        report.dropped_intervals
    );

    (index, report)
}

/// Feed entry with intervals left untyped so one bad interval does not sink
/// the whole entry.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedEntry {
    #[serde(alias = "practitioner_id")]
    practitioner_id: PractitionerId,
    date: String,
    intervals: Vec<Value>,
}

#[derive(Default)]
struct IndexBuilder {
    index: AvailabilityIndex,
    report: BuildReport,
}

impl IndexBuilder {
    fn push<I>(&mut self, practitioner_id: PractitionerId, date: &str, intervals: I)
    where
        I: IntoIterator<Item = RawInterval>,
    {
        let date = match parse_schedule_date(date) {
            Ok(date) => date,
            Err(e) => {
                debug!("Discarding schedule entry for practitioner {}: {}", practitioner_id, e);
                self.report.discarded_entries += 1;
                return;
            }
        };
        self.report.accepted_entries += 1;

        // Repeated (practitioner, date) pairs concatenate in feed order.
        let slot = self
            .index
            .schedules
            .entry(practitioner_id)
            .or_default()
            .entry(date)
            .or_default();

        for raw in intervals {
            match TimeInterval::parse(&raw) {
                Ok(interval) => {
                    slot.push(interval);
                    self.report.accepted_intervals += 1;
                }
                Err(e) => {
                    debug!(
                        "Dropping interval {}-{} for practitioner {} on {}: {}",
                        raw.start, raw.end, practitioner_id, date, e
                    );
                    self.report.dropped_intervals += 1;
                }
            }
        }
    }

    fn finish(self) -> (AvailabilityIndex, BuildReport) {
        (self.index, self.report)
    }
}
