use chrono_tz::Tz;
use tracing::{debug, info};

use crate::{
    command::Command,
    config::ControlConfig,
    control,
    response::CompletionQueue,
    schedule::ScheduleClassifier,
    state::ControlContext,
    transaction::{CycleOutcome, TransactionCycle, Transport},
    types::{
        ApplianceView, BoilerSnapshot, ControlAvailability, MeasurementsView, OutputsView,
        ScheduleView,
    },
};

/// What happened during one pass of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub responses_handled: usize,
    pub cycle: CycleOutcome,
}

/// Owns the control context and drives one cooperative iteration at a time.
#[derive(Debug, Clone)]
pub struct BoilerEngine {
    context: ControlContext,
    cycle: TransactionCycle,
    classifier: ScheduleClassifier,
    completions: CompletionQueue,
    publish_interval_ms: u64,
    last_publish_ms: Option<u64>,
    publish_forced: bool,
}

impl BoilerEngine {
    pub fn new(config: ControlConfig, timezone: Tz, publish_interval_ms: u64) -> Self {
        Self {
            context: ControlContext::new(config),
            cycle: TransactionCycle::new(),
            classifier: ScheduleClassifier::new(timezone),
            completions: CompletionQueue::new(),
            publish_interval_ms,
            last_publish_ms: None,
            publish_forced: false,
        }
    }

    pub fn context(&self) -> &ControlContext {
        &self.context
    }

    pub fn config(&self) -> &ControlConfig {
        &self.context.config
    }

    pub fn cycle_slot(&self) -> u8 {
        self.cycle.slot()
    }

    pub fn timezone(&self) -> Tz {
        self.classifier.timezone()
    }

    /// One loop pass: drain completions, refresh the schedule, recompute
    /// outputs, then offer the next transaction to the transport.
    pub fn tick<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        fetched_epoch: Option<i64>,
        now_ms: u64,
    ) -> TickReport {
        transport.poll(now_ms, &mut self.completions);
        let responses_handled = self.completions.drain_into(&mut self.context);

        self.classifier.refresh(&mut self.context, fetched_epoch);
        control::recompute(&mut self.context);
        let cycle = self.cycle.tick(&self.context, transport);

        TickReport {
            responses_handled,
            cycle,
        }
    }

    pub fn handle_command(&mut self, command: Command) -> bool {
        let changed = self.context.config.apply(command);
        if changed {
            info!(?command, "operator command applied");
        } else {
            debug!(?command, "operator command left config unchanged");
        }
        if command.forces_publish() {
            self.publish_forced = true;
        }
        changed
    }

    pub fn force_publish(&mut self) {
        self.publish_forced = true;
    }

    /// True at most once per publish interval, or right after a forced update.
    /// Marks the publish as done when it returns true.
    pub fn publish_due(&mut self, now_ms: u64) -> bool {
        let interval_elapsed = self
            .last_publish_ms
            .map(|last| now_ms.saturating_sub(last) >= self.publish_interval_ms)
            .unwrap_or(true);

        if !(interval_elapsed || self.publish_forced) {
            return false;
        }

        self.last_publish_ms = Some(now_ms);
        self.publish_forced = false;
        true
    }

    pub fn snapshot(&self) -> BoilerSnapshot {
        let ctx = &self.context;
        BoilerSnapshot {
            measurements: MeasurementsView {
                outside_temp: ctx.measurements.outside_temp,
                boiler_temp: ctx.measurements.boiler_temp,
                return_water_temp: ctx.measurements.return_water_temp,
                exhaust_temp: ctx.measurements.exhaust_temp,
                dhw_temp: ctx.measurements.dhw_temp,
            },
            appliance: ApplianceView {
                central_heating_active: ctx.appliance.central_heating_active,
                hot_water_active: ctx.appliance.hot_water_active,
                flame_on: ctx.appliance.flame_on,
                status: ctx.appliance.status_code.clone(),
            },
            outputs: OutputsView {
                central_heating_enabled: ctx.outputs.central_heating_enabled,
                hot_water_enabled: ctx.outputs.hot_water_enabled,
                boiler_setpoint: ctx.outputs.boiler_setpoint,
                dhw_setpoint: ctx.outputs.dhw_setpoint,
            },
            schedule: ScheduleView {
                day_of_week: ctx.schedule.day_of_week,
                time_of_day: ctx.schedule.time_of_day.as_str(),
                time_synced: ctx.schedule.clock_observed(),
                time_string: ctx.schedule.time_string.clone(),
            },
            heating_mode: ctx.config.heating_mode.as_str(),
            hot_water_mode: ctx.config.hot_water_mode.as_str(),
            config: ctx.config.clone(),
            availability: ControlAvailability::from_config(&ctx.config),
        }
    }
}
