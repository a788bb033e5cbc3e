use crate::{config::ControlConfig, types::TimeOfDay};

#[derive(Debug, Clone, PartialEq)]
pub struct ThermalMeasurements {
    /// Exponentially smoothed over roughly ten samples.
    pub outside_temp: f32,
    pub boiler_temp: f32,
    pub return_water_temp: f32,
    pub exhaust_temp: f32,
    pub dhw_temp: f32,
}

impl Default for ThermalMeasurements {
    fn default() -> Self {
        Self {
            outside_temp: -4.0,
            boiler_temp: 0.0,
            return_water_temp: 0.0,
            exhaust_temp: 0.0,
            dhw_temp: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceStatus {
    pub central_heating_active: bool,
    pub hot_water_active: bool,
    pub flame_on: bool,
    pub status_code: String,
}

impl Default for ApplianceStatus {
    fn default() -> Self {
        Self {
            central_heating_active: false,
            hot_water_active: false,
            flame_on: false,
            status_code: "Error".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    /// 0 = Sunday.
    pub day_of_week: u8,
    pub time_of_day: TimeOfDay,
    /// Last epoch fetched from the time source; `None` until the first fetch.
    pub last_epoch: Option<i64>,
    pub time_string: String,
}

impl ScheduleState {
    pub fn clock_observed(&self) -> bool {
        self.last_epoch.is_some()
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self {
            day_of_week: 1,
            time_of_day: TimeOfDay::Evening,
            last_epoch: None,
            time_string: String::new(),
        }
    }
}

/// Values the controller derives and the transaction cycle writes to the boiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlOutputs {
    pub central_heating_enabled: bool,
    pub hot_water_enabled: bool,
    pub cooling_enabled: bool,
    pub boiler_setpoint: f32,
    pub dhw_setpoint: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlContext {
    pub config: ControlConfig,
    pub measurements: ThermalMeasurements,
    pub appliance: ApplianceStatus,
    pub schedule: ScheduleState,
    pub outputs: ControlOutputs,
}

impl ControlContext {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}
