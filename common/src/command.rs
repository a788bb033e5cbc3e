use serde::{Deserialize, Serialize};

use crate::{
    config::ControlConfig,
    error::CommandError,
    topics::*,
    types::{HeatingMode, HotWaterMode},
};

/// One variant per operator control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "camelCase")]
pub enum Command {
    DhwMorningSetpoint(f32),
    DhwDaySetpoint(f32),
    DhwEveningSetpoint(f32),
    DhwNightSetpoint(f32),
    DhwLegionellaSetpoint(f32),
    DhwBoostSetpoint(f32),
    BoilerBoostSetpoint(f32),
    HeatingThreshold(f32),
    TempShift(f32),
    NightOffsetFactor(f32),
    MorningStart(f32),
    DayStart(f32),
    EveningStart(f32),
    NightStart(f32),
    LegionellaDay(u8),
    HeatingBoost(bool),
    HotWaterBoost(bool),
    HeatingProgram(bool),
    HotWaterProgram(bool),
    LegionellaProgram(bool),
}

impl Command {
    /// Switch commands push every value out immediately instead of waiting
    /// for the regular publish interval.
    pub fn forces_publish(&self) -> bool {
        matches!(
            self,
            Self::HeatingBoost(_)
                | Self::HotWaterBoost(_)
                | Self::HeatingProgram(_)
                | Self::HotWaterProgram(_)
                | Self::LegionellaProgram(_)
        )
    }

    /// Parses a command published on one of the `boiler/cmnd/...` topics and
    /// checks it against the control's range.
    pub fn from_topic(topic: &str, payload: &str) -> Result<Self, CommandError> {
        let value = payload.trim();
        let command = match topic {
            TOPIC_CMD_DHW_MORNING => Self::DhwMorningSetpoint(number("dhwMorning", value)?),
            TOPIC_CMD_DHW_DAY => Self::DhwDaySetpoint(number("dhwDay", value)?),
            TOPIC_CMD_DHW_EVENING => Self::DhwEveningSetpoint(number("dhwEvening", value)?),
            TOPIC_CMD_DHW_NIGHT => Self::DhwNightSetpoint(number("dhwNight", value)?),
            TOPIC_CMD_DHW_LEGIONELLA => Self::DhwLegionellaSetpoint(number("dhwLegionella", value)?),
            TOPIC_CMD_DHW_BOOST => Self::DhwBoostSetpoint(number("dhwBoost", value)?),
            TOPIC_CMD_BOILER_BOOST => Self::BoilerBoostSetpoint(number("boilerBoost", value)?),
            TOPIC_CMD_HEATING_THRESHOLD => {
                Self::HeatingThreshold(number("heatingThreshold", value)?)
            }
            TOPIC_CMD_TEMP_SHIFT => Self::TempShift(number("tempShift", value)?),
            TOPIC_CMD_NIGHT_OFFSET => Self::NightOffsetFactor(number("nightOffsetFactor", value)?),
            TOPIC_CMD_MORNING_START => Self::MorningStart(hours("morningStart", value)?),
            TOPIC_CMD_DAY_START => Self::DayStart(hours("dayStart", value)?),
            TOPIC_CMD_EVENING_START => Self::EveningStart(hours("eveningStart", value)?),
            TOPIC_CMD_NIGHT_START => Self::NightStart(hours("nightStart", value)?),
            TOPIC_CMD_LEGIONELLA_DAY => Self::LegionellaDay(weekday(value)?),
            TOPIC_CMD_HEATING_BOOST => Self::HeatingBoost(switch("heatingBoost", value)?),
            TOPIC_CMD_HOT_WATER_BOOST => Self::HotWaterBoost(switch("hotWaterBoost", value)?),
            TOPIC_CMD_HEATING_PROGRAM => Self::HeatingProgram(switch("heatingProgram", value)?),
            TOPIC_CMD_HOT_WATER_PROGRAM => Self::HotWaterProgram(switch("hotWaterProgram", value)?),
            TOPIC_CMD_LEGIONELLA_PROGRAM => {
                Self::LegionellaProgram(switch("legionellaProgram", value)?)
            }
            other => return Err(CommandError::UnknownTopic(other.to_string())),
        };
        command.validate()?;
        Ok(command)
    }

    /// Range check shared by every inbound path (MQTT and HTTP).
    pub fn validate(&self) -> Result<(), CommandError> {
        match *self {
            Self::DhwMorningSetpoint(value) => within("dhwMorning", value, 10.0, 65.0),
            Self::DhwDaySetpoint(value) => within("dhwDay", value, 10.0, 65.0),
            Self::DhwEveningSetpoint(value) => within("dhwEvening", value, 10.0, 65.0),
            Self::DhwNightSetpoint(value) => within("dhwNight", value, 10.0, 65.0),
            Self::DhwLegionellaSetpoint(value) => within("dhwLegionella", value, 60.0, 75.0),
            Self::DhwBoostSetpoint(value) => within("dhwBoost", value, 40.0, 75.0),
            Self::BoilerBoostSetpoint(value) => within("boilerBoost", value, 40.0, 65.0),
            Self::HeatingThreshold(value) => within("heatingThreshold", value, 0.0, 30.0),
            Self::TempShift(value) => within("tempShift", value, -10.0, 10.0),
            Self::NightOffsetFactor(value) => within("nightOffsetFactor", value, 0.5, 1.5),
            Self::MorningStart(value) => half_hour("morningStart", value, 4.0, 9.5),
            Self::DayStart(value) => half_hour("dayStart", value, 8.0, 12.5),
            Self::EveningStart(value) => half_hour("eveningStart", value, 15.0, 19.5),
            Self::NightStart(value) => half_hour("nightStart", value, 18.0, 23.5),
            Self::LegionellaDay(day) => within("legionellaDay", f32::from(day), 0.0, 6.0),
            Self::HeatingBoost(_)
            | Self::HotWaterBoost(_)
            | Self::HeatingProgram(_)
            | Self::HotWaterProgram(_)
            | Self::LegionellaProgram(_) => Ok(()),
        }
    }
}

impl ControlConfig {
    /// Applies one operator command; returns whether anything changed.
    ///
    /// Enabling the hot-water program also enables legionella protection, and
    /// disabling legionella protection also disables the hot-water program.
    pub fn apply(&mut self, command: Command) -> bool {
        let before = self.clone();
        match command {
            Command::DhwMorningSetpoint(value) => self.dhw_morning_sp = value,
            Command::DhwDaySetpoint(value) => self.dhw_day_sp = value,
            Command::DhwEveningSetpoint(value) => self.dhw_evening_sp = value,
            Command::DhwNightSetpoint(value) => self.dhw_night_sp = value,
            Command::DhwLegionellaSetpoint(value) => self.dhw_legionella_sp = value,
            Command::DhwBoostSetpoint(value) => self.dhw_boost_sp = value,
            Command::BoilerBoostSetpoint(value) => self.boiler_boost_sp = value,
            Command::HeatingThreshold(value) => self.heating_threshold = value,
            Command::TempShift(value) => self.temp_shift = value,
            Command::NightOffsetFactor(value) => self.night_offset_factor = value,
            Command::MorningStart(value) => self.morning_start = value,
            Command::DayStart(value) => self.day_start = value,
            Command::EveningStart(value) => self.evening_start = value,
            Command::NightStart(value) => self.night_start = value,
            Command::LegionellaDay(day) => self.legionella_day = day % 7,
            Command::HeatingBoost(on) => {
                self.heating_mode = if on {
                    HeatingMode::Boost
                } else {
                    HeatingMode::Auto
                };
            }
            Command::HotWaterBoost(on) => {
                self.hot_water_mode = if on {
                    HotWaterMode::Manual
                } else {
                    HotWaterMode::Automatic
                };
            }
            Command::HeatingProgram(on) => self.heating_program = on,
            Command::HotWaterProgram(on) => {
                self.hot_water_program = on;
                if on {
                    self.legionella_program = true;
                }
            }
            Command::LegionellaProgram(on) => {
                self.legionella_program = on;
                if !on {
                    self.hot_water_program = false;
                }
            }
        }
        *self != before
    }
}

fn invalid(control: &'static str, value: &str) -> CommandError {
    CommandError::InvalidValue {
        control,
        value: value.to_string(),
    }
}

fn number(control: &'static str, value: &str) -> Result<f32, CommandError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| invalid(control, value))
}

/// Accepts `H:MM` or decimal hours such as `6.5`.
fn hours(control: &'static str, value: &str) -> Result<f32, CommandError> {
    let Some((hour, minute)) = value.split_once(':') else {
        return number(control, value);
    };
    let hour = hour.trim().parse::<u8>().map_err(|_| invalid(control, value))?;
    let minute = minute.trim().parse::<u8>().map_err(|_| invalid(control, value))?;
    if minute >= 60 {
        return Err(invalid(control, value));
    }
    Ok(f32::from(hour) + f32::from(minute) / 60.0)
}

fn weekday(value: &str) -> Result<u8, CommandError> {
    value
        .parse::<u8>()
        .map_err(|_| invalid("legionellaDay", value))
}

fn switch(control: &'static str, value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(invalid(control, value)),
    }
}

fn within(control: &'static str, value: f32, min: f32, max: f32) -> Result<(), CommandError> {
    if !value.is_finite() {
        return Err(invalid(control, &value.to_string()));
    }
    if !(min..=max).contains(&value) {
        return Err(CommandError::OutOfRange {
            control,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Schedule boundaries move in half-hour steps.
fn half_hour(control: &'static str, value: f32, min: f32, max: f32) -> Result<(), CommandError> {
    within(control, value, min, max)?;
    if (value * 2.0).fract() != 0.0 {
        return Err(invalid(control, &value.to_string()));
    }
    Ok(())
}
