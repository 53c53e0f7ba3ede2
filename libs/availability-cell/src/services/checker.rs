// libs/availability-cell/src/services/checker.rs

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use shared_config::{AppConfig, BusinessHours};
use shared_models::PractitionerId;

use crate::models::AvailabilityMode;
use crate::services::index::AvailabilityIndex;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Answers point-in-time availability questions against an [`AvailabilityIndex`].
///
/// Holds only the configured business-hours window, so one checker can be
/// shared freely alongside the index it reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotAvailabilityChecker {
    business_hours: BusinessHours,
}

impl SlotAvailabilityChecker {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_business_hours(config.business_hours)
    }

    pub fn with_business_hours(business_hours: BusinessHours) -> Self {
        Self { business_hours }
    }

    pub fn business_hours(&self) -> BusinessHours {
        self.business_hours
    }

    /// Is `hour:minute` on `date` open?
    ///
    /// In [`AvailabilityMode::BusinessHours`] the practitioner and index are
    /// ignored. Otherwise an unset practitioner, an unknown practitioner or a
    /// date without schedule data all answer `false`. Out-of-range clock
    /// values answer `false` in both modes.
    pub fn is_available(
        &self,
        practitioner_id: Option<PractitionerId>,
        date: NaiveDate,
        hour: u32,
        minute: u32,
        index: &AvailabilityIndex,
        mode: AvailabilityMode,
    ) -> bool {
        match NaiveTime::from_hms_opt(hour, minute, 0) {
            Some(time) => self.is_available_at(practitioner_id, date, time, index, mode),
            None => {
                debug!("Rejecting out-of-range time {}:{}", hour, minute);
                false
            }
        }
    }

    pub fn is_available_at(
        &self,
        practitioner_id: Option<PractitionerId>,
        date: NaiveDate,
        time: NaiveTime,
        index: &AvailabilityIndex,
        mode: AvailabilityMode,
    ) -> bool {
        match mode {
            AvailabilityMode::BusinessHours => self.business_hours.contains(time),
            AvailabilityMode::PractitionerSchedule => {
                let Some(practitioner_id) = practitioner_id else {
                    return false;
                };
                match index.intervals_for(practitioner_id, date) {
                    Some(intervals) => intervals.iter().any(|interval| interval.contains(time)),
                    None => {
                        debug!("No schedule for practitioner {} on {}", practitioner_id, date);
                        false
                    }
                }
            }
        }
    }

    /// Slot starts on a `step_minutes` grid from midnight that fall inside the
    /// practitioner's intervals for `date`, ascending.
    pub fn open_slots(
        &self,
        practitioner_id: PractitionerId,
        date: NaiveDate,
        step_minutes: u32,
        index: &AvailabilityIndex,
    ) -> Vec<NaiveTime> {
        if step_minutes == 0 {
            return Vec::new();
        }
        let Some(intervals) = index.intervals_for(practitioner_id, date) else {
            return Vec::new();
        };

        let slots: Vec<NaiveTime> = (0..MINUTES_PER_DAY)
            .step_by(step_minutes as usize)
            .filter_map(|minute| NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0))
            .filter(|slot| intervals.iter().any(|interval| interval.contains(*slot)))
            .collect();

        debug!(
            "Found {} open {}-minute slots for practitioner {} on {}",
            slots.len(),
            step_minutes,
            practitioner_id,
            date
        );
        slots
    }
}
