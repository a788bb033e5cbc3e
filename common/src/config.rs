use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    types::{HeatingMode, HotWaterMode},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub dhw_morning_sp: f32,
    pub dhw_day_sp: f32,
    pub dhw_evening_sp: f32,
    pub dhw_night_sp: f32,
    pub dhw_legionella_sp: f32,
    pub dhw_boost_sp: f32,
    pub boiler_boost_sp: f32,

    pub heating_threshold: f32,
    pub temp_shift: f32,
    pub night_offset_factor: f32,

    pub morning_start: f32,
    pub day_start: f32,
    pub evening_start: f32,
    pub night_start: f32,
    /// 0 = Sunday.
    pub legionella_day: u8,

    pub heating_program: bool,
    pub hot_water_program: bool,
    pub legionella_program: bool,

    pub heating_mode: HeatingMode,
    pub hot_water_mode: HotWaterMode,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            dhw_morning_sp: 40.0,
            dhw_day_sp: 35.0,
            dhw_evening_sp: 46.0,
            dhw_night_sp: 20.0,
            dhw_legionella_sp: 72.0,
            dhw_boost_sp: 50.0,
            boiler_boost_sp: 55.0,
            heating_threshold: 17.0,
            temp_shift: -1.5,
            night_offset_factor: 1.0,
            morning_start: 6.0,
            day_start: 10.0,
            evening_start: 16.0,
            night_start: 21.0,
            legionella_day: 0,
            heating_program: true,
            hot_water_program: true,
            legionella_program: true,
            heating_mode: HeatingMode::Auto,
            hot_water_mode: HotWaterMode::Automatic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
    pub client_id: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "192.168.1.11".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            client_id: "boiler-controller".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub control: ControlConfig,
    pub timezone: String,
    pub network: NetworkConfig,
    pub loop_interval_ms: u64,
    pub publish_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            timezone: "Europe/Berlin".to_string(),
            network: NetworkConfig::default(),
            loop_interval_ms: 150,
            publish_interval_ms: 60_000,
        }
    }
}

impl RuntimeConfig {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn sanitize(&mut self) {
        self.loop_interval_ms = self.loop_interval_ms.clamp(10, 10_000);
        self.publish_interval_ms = self.publish_interval_ms.max(1_000);
        self.control.legionella_day %= 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_factory_settings() {
        let config = ControlConfig::default();
        assert_eq!(config.dhw_legionella_sp, 72.0);
        assert_eq!(config.heating_threshold, 17.0);
        assert_eq!(config.temp_shift, -1.5);
        assert!(config.heating_program && config.hot_water_program && config.legionella_program);
        assert_eq!(config.heating_mode, HeatingMode::Auto);
    }

    #[test]
    fn default_timezone_parses() {
        let runtime = RuntimeConfig::default();
        assert_eq!(runtime.timezone().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let runtime = RuntimeConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            runtime.timezone(),
            Err(ConfigError::InvalidTimezone(name)) if name == "Mars/Olympus_Mons"
        ));
    }

    #[test]
    fn partial_json_falls_back_to_control_defaults() {
        let raw = r#"{"timezone":"Europe/Vienna","loop_interval_ms":5,"publish_interval_ms":10}"#;
        let mut runtime: RuntimeConfig = serde_json::from_str(raw).unwrap();
        runtime.sanitize();

        assert_eq!(runtime.control, ControlConfig::default());
        assert_eq!(runtime.loop_interval_ms, 10);
        assert_eq!(runtime.publish_interval_ms, 1_000);
        assert_eq!(runtime.network.mqtt_port, 1883);
    }
}
