use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::{
    config::ControlConfig,
    state::ControlContext,
    types::{HeatingMode, HotWaterMode, TimeOfDay},
};

/// Day reported before any clock has been seen (Monday).
const FALLBACK_DAY: u8 = 1;

/// Maps the wall clock onto a day-of-week and a time-of-day bucket.
#[derive(Debug, Clone)]
pub struct ScheduleClassifier {
    timezone: Tz,
}

impl ScheduleClassifier {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// `fetched_epoch` is `None` while the time source is unreachable.
    ///
    /// Once an epoch has been cached the schedule is derived from it on every
    /// call, so the reported time stands still until the next successful fetch.
    pub fn refresh(&self, ctx: &mut ControlContext, fetched_epoch: Option<i64>) {
        if let Some(epoch) = fetched_epoch.filter(|epoch| *epoch > 0) {
            if ctx.schedule.last_epoch.is_none() {
                info!(epoch, "first clock reading received");
            }
            ctx.schedule.last_epoch = Some(epoch);
        }

        let Some(local) = ctx.schedule.last_epoch.and_then(|epoch| self.local_time(epoch)) else {
            apply_fallback(ctx);
            return;
        };

        let hour = local.hour();
        let time_of_day = classify_hour(hour, &ctx.config);
        if time_of_day != ctx.schedule.time_of_day {
            debug!(hour, from = ?ctx.schedule.time_of_day, to = ?time_of_day, "time of day changed");
        }

        ctx.schedule.day_of_week = local.weekday().num_days_from_sunday() as u8;
        ctx.schedule.time_of_day = time_of_day;
        ctx.schedule.time_string = format!("{:>2}:{:02}", hour, local.minute());
    }

    pub fn local_time(&self, epoch: i64) -> Option<DateTime<Tz>> {
        Utc.timestamp_opt(epoch, 0)
            .single()
            .map(|utc| utc.with_timezone(&self.timezone))
    }
}

/// Bucket for a whole local hour; the last satisfied boundary wins.
pub fn classify_hour(hour: u32, config: &ControlConfig) -> TimeOfDay {
    let hour = hour as f32;
    let rules = [
        (config.morning_start, TimeOfDay::Morning),
        (config.day_start, TimeOfDay::Day),
        (config.evening_start, TimeOfDay::Evening),
        (config.night_start, TimeOfDay::Night),
    ];

    let mut bucket = TimeOfDay::Night;
    for (start, candidate) in rules {
        if hour >= start {
            bucket = candidate;
        }
    }
    bucket
}

fn apply_fallback(ctx: &mut ControlContext) {
    ctx.schedule.day_of_week = FALLBACK_DAY;
    ctx.schedule.time_of_day = TimeOfDay::Evening;
    ctx.schedule.time_string.clear();
    ctx.config.heating_mode = HeatingMode::Auto;
    ctx.config.hot_water_mode = HotWaterMode::Automatic;
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use chrono_tz::Europe::Berlin;
    use pretty_assertions::assert_eq;

    use super::*;

    fn utc_epoch(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn no_clock_forces_conservative_defaults() {
        let classifier = ScheduleClassifier::new(Berlin);
        let mut ctx = ControlContext::default();
        ctx.schedule.day_of_week = 4;
        ctx.schedule.time_of_day = TimeOfDay::Morning;
        ctx.config.heating_mode = HeatingMode::Boost;
        ctx.config.hot_water_mode = HotWaterMode::Manual;

        classifier.refresh(&mut ctx, None);

        assert_eq!(ctx.schedule.day_of_week, 1);
        assert_eq!(ctx.schedule.time_of_day, TimeOfDay::Evening);
        assert_eq!(ctx.config.heating_mode, HeatingMode::Auto);
        assert_eq!(ctx.config.hot_water_mode, HotWaterMode::Automatic);
        assert!(!ctx.schedule.clock_observed());
    }

    #[test]
    fn zero_epoch_is_not_a_clock() {
        let classifier = ScheduleClassifier::new(Berlin);
        let mut ctx = ControlContext::default();

        classifier.refresh(&mut ctx, Some(0));

        assert!(!ctx.schedule.clock_observed());
        assert_eq!(ctx.schedule.time_of_day, TimeOfDay::Evening);
    }

    #[test]
    fn classifies_local_winter_time() {
        let classifier = ScheduleClassifier::new(Berlin);
        let mut ctx = ControlContext::default();

        // Wednesday 2026-01-14 06:30 UTC is 07:30 CET.
        classifier.refresh(&mut ctx, Some(utc_epoch(2026, 1, 14, 6, 30)));

        assert_eq!(ctx.schedule.day_of_week, 3);
        assert_eq!(ctx.schedule.time_of_day, TimeOfDay::Morning);
        assert_eq!(ctx.schedule.time_string, " 7:30");
    }

    #[test]
    fn summer_time_shifts_by_two_hours() {
        let classifier = ScheduleClassifier::new(Berlin);
        let mut ctx = ControlContext::default();

        // 2026-07-01 14:05 UTC is 16:05 CEST.
        classifier.refresh(&mut ctx, Some(utc_epoch(2026, 7, 1, 14, 5)));

        assert_eq!(ctx.schedule.time_of_day, TimeOfDay::Evening);
        assert_eq!(ctx.schedule.time_string, "16:05");
    }

    #[test]
    fn dst_switches_on_last_sundays() {
        let classifier = ScheduleClassifier::new(Berlin);

        // 2026-03-29 is the last Sunday of March: 00:59 UTC is 01:59 CET,
        // 01:00 UTC is already 03:00 CEST.
        let before = classifier.local_time(utc_epoch(2026, 3, 29, 0, 59)).unwrap();
        let after = classifier.local_time(utc_epoch(2026, 3, 29, 1, 0)).unwrap();
        assert_eq!((before.hour(), before.minute()), (1, 59));
        assert_eq!((after.hour(), after.minute()), (3, 0));

        // 2026-10-25 is the last Sunday of October: 00:59 UTC is 02:59 CEST,
        // 01:00 UTC falls back to 02:00 CET.
        let before = classifier.local_time(utc_epoch(2026, 10, 25, 0, 59)).unwrap();
        let after = classifier.local_time(utc_epoch(2026, 10, 25, 1, 0)).unwrap();
        assert_eq!((before.hour(), before.minute()), (2, 59));
        assert_eq!((after.hour(), after.minute()), (2, 0));
    }

    #[test]
    fn cached_epoch_freezes_between_fetches() {
        let classifier = ScheduleClassifier::new(Berlin);
        let mut ctx = ControlContext::default();
        let epoch = utc_epoch(2026, 1, 11, 8, 15);

        classifier.refresh(&mut ctx, Some(epoch));
        let first = ctx.schedule.clone();

        classifier.refresh(&mut ctx, None);
        classifier.refresh(&mut ctx, None);

        assert_eq!(ctx.schedule, first);
        assert_eq!(ctx.schedule.last_epoch, Some(epoch));
        assert_eq!(ctx.schedule.day_of_week, 0);
        assert_eq!(ctx.schedule.time_of_day, TimeOfDay::Morning);
    }

    #[test]
    fn cached_clock_leaves_modes_alone() {
        let classifier = ScheduleClassifier::new(Berlin);
        let mut ctx = ControlContext::default();
        classifier.refresh(&mut ctx, Some(utc_epoch(2026, 1, 14, 12, 0)));

        ctx.config.heating_mode = HeatingMode::Boost;
        classifier.refresh(&mut ctx, None);

        assert_eq!(ctx.config.heating_mode, HeatingMode::Boost);
    }

    #[test]
    fn bucket_boundaries_follow_whole_hours() {
        let config = ControlConfig::default();
        let buckets: Vec<_> = [0, 5, 6, 9, 10, 15, 16, 20, 21, 23]
            .into_iter()
            .map(|hour| classify_hour(hour, &config))
            .collect();

        assert_eq!(
            buckets,
            vec![
                TimeOfDay::Night,
                TimeOfDay::Night,
                TimeOfDay::Morning,
                TimeOfDay::Morning,
                TimeOfDay::Day,
                TimeOfDay::Day,
                TimeOfDay::Evening,
                TimeOfDay::Evening,
                TimeOfDay::Night,
                TimeOfDay::Night,
            ]
        );
    }

    #[test]
    fn half_hour_boundary_starts_on_the_next_hour() {
        let config = ControlConfig {
            morning_start: 6.5,
            ..ControlConfig::default()
        };
        assert_eq!(classify_hour(6, &config), TimeOfDay::Night);
        assert_eq!(classify_hour(7, &config), TimeOfDay::Morning);
    }

    #[test]
    fn out_of_order_boundaries_let_the_last_rule_win() {
        let config = ControlConfig {
            evening_start: 9.0,
            day_start: 10.0,
            ..ControlConfig::default()
        };
        // Day (>= 10) is checked before Evening (>= 9), so Evening wins at 12:00.
        assert_eq!(classify_hour(12, &config), TimeOfDay::Evening);
        assert_eq!(classify_hour(9, &config), TimeOfDay::Evening);
    }
}
