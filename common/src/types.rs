use serde::{Deserialize, Serialize};

use crate::config::ControlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeatingMode {
    Auto,
    Boost,
}

impl HeatingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Boost => "BOOST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HotWaterMode {
    Automatic,
    Manual,
}

impl HotWaterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::Manual => "MANUAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeOfDay {
    Night,
    Morning,
    Day,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Night => "NIGHT",
            Self::Morning => "MORNING",
            Self::Day => "DAY",
            Self::Evening => "EVENING",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementsView {
    #[serde(rename = "outsideTemp")]
    pub outside_temp: f32,
    #[serde(rename = "boilerTemp")]
    pub boiler_temp: f32,
    #[serde(rename = "returnWaterTemp")]
    pub return_water_temp: f32,
    #[serde(rename = "exhaustTemp")]
    pub exhaust_temp: f32,
    #[serde(rename = "dhwTemp")]
    pub dhw_temp: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplianceView {
    #[serde(rename = "centralHeatingActive")]
    pub central_heating_active: bool,
    #[serde(rename = "hotWaterActive")]
    pub hot_water_active: bool,
    #[serde(rename = "flameOn")]
    pub flame_on: bool,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputsView {
    #[serde(rename = "centralHeatingEnabled")]
    pub central_heating_enabled: bool,
    #[serde(rename = "hotWaterEnabled")]
    pub hot_water_enabled: bool,
    #[serde(rename = "boilerSetpoint")]
    pub boiler_setpoint: f32,
    #[serde(rename = "dhwSetpoint")]
    pub dhw_setpoint: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: u8,
    #[serde(rename = "timeOfDay")]
    pub time_of_day: &'static str,
    #[serde(rename = "timeSynced")]
    pub time_synced: bool,
    #[serde(rename = "timeString")]
    pub time_string: String,
}

/// Which operator controls make sense to expose given the enabled programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlAvailability {
    #[serde(rename = "hotWaterControls")]
    pub hot_water_controls: bool,
    #[serde(rename = "legionellaControls")]
    pub legionella_controls: bool,
    #[serde(rename = "heatingBoostControls")]
    pub heating_boost_controls: bool,
}

impl ControlAvailability {
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            hot_water_controls: config.hot_water_program,
            legionella_controls: config.legionella_program,
            heating_boost_controls: config.heating_program,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoilerSnapshot {
    pub measurements: MeasurementsView,
    pub appliance: ApplianceView,
    pub outputs: OutputsView,
    pub schedule: ScheduleView,
    #[serde(rename = "heatingMode")]
    pub heating_mode: &'static str,
    #[serde(rename = "hotWaterMode")]
    pub hot_water_mode: &'static str,
    pub config: ControlConfig,
    pub availability: ControlAvailability,
}
