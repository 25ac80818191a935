// MIT License - Copyright (c) 2026 Peter Wright
// Bridge configuration

use std::path::Path;

use serde::Deserialize;
use tokio::time::Duration;

use crate::error::{BridgeError, Result};
use crate::reconciler::{AreaGroup, AreaMapping};

/// Areas armed for one target state, as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AreaGroupConfig {
    #[serde(default)]
    pub areas: Vec<String>,
    /// Panel arming profile, e.g. `"p1"` or `"tot"`.
    #[serde(default)]
    pub shortcut: Option<String>,
}

impl AreaGroupConfig {
    pub fn to_group(&self) -> AreaGroup {
        AreaGroup::new(&self.areas, self.shortcut.clone())
    }
}

/// Connection to the panel and polling behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlarmConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u64,
    /// Age after which the session token is renewed
    #[serde(default = "default_login_timeout")]
    pub login_timeout_ms: u64,
    /// Delay between the area poll and the zone poll
    #[serde(default = "default_zone_poll_stagger")]
    pub zone_poll_stagger_ms: u64,
    #[serde(default = "default_watchdog_interval")]
    pub watchdog_interval_ms: u64,
    /// Mirror every zone as an occupancy sensor
    #[serde(default)]
    pub map_sensors: bool,
}

fn default_port() -> u16 {
    80
}
fn default_update_interval() -> u64 {
    5000
}
fn default_login_timeout() -> u64 {
    15000
}
fn default_zone_poll_stagger() -> u64 {
    2000
}
fn default_watchdog_interval() -> u64 {
    1000
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: default_port(),
            code: String::new(),
            update_interval_ms: default_update_interval(),
            login_timeout_ms: default_login_timeout(),
            zone_poll_stagger_ms: default_zone_poll_stagger(),
            watchdog_interval_ms: default_watchdog_interval(),
            map_sensors: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AreasConfig {
    #[serde(default)]
    pub away_areas: AreaGroupConfig,
    #[serde(default)]
    pub home_areas: AreaGroupConfig,
    #[serde(default)]
    pub night_areas: AreaGroupConfig,
    #[serde(default)]
    pub always_on_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MqttConfig {
    pub url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_subscribe_topic")]
    pub subscribe_topic: String,
    #[serde(default = "default_publish_topic")]
    pub publish_topic: String,
}

fn default_client_id() -> String {
    "vedo-bridge".to_string()
}
fn default_subscribe_topic() -> String {
    "vedo/cmd".to_string()
}
fn default_publish_topic() -> String {
    "vedo".to_string()
}

/// Complete bridge configuration.
///
/// ```toml
/// [alarm]
/// address = "192.168.1.50"
/// code = "123456"
/// map_sensors = true
///
/// [areas]
/// always_on_areas = ["Garage"]
/// away_areas = { areas = ["Front", "Back"], shortcut = "tot" }
/// home_areas = { areas = ["Front"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub areas: AreasConfig,
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,
}

impl BridgeConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations the bridge cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.alarm.address.trim().is_empty() {
            return Err(BridgeError::Configuration("missing alarm address".into()));
        }
        if self.alarm.code.trim().is_empty() {
            return Err(BridgeError::Configuration("missing alarm code".into()));
        }
        if self.alarm.update_interval_ms == 0 {
            return Err(BridgeError::Configuration(
                "update_interval_ms must be greater than zero".into(),
            ));
        }
        if self.alarm.watchdog_interval_ms == 0 {
            return Err(BridgeError::Configuration(
                "watchdog_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn mapping(&self) -> AreaMapping {
        AreaMapping::new(
            self.areas.away_areas.to_group(),
            self.areas.home_areas.to_group(),
            self.areas.night_areas.to_group(),
        )
        .with_always_on(&self.areas.always_on_areas)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.alarm.update_interval_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.alarm.login_timeout_ms)
    }

    pub fn zone_poll_stagger(&self) -> Duration {
        Duration::from_millis(self.alarm.zone_poll_stagger_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.alarm.watchdog_interval_ms)
    }
}

/// Builder for BridgeConfig.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.alarm.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.alarm.port = port;
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.config.alarm.code = code.into();
        self
    }

    pub fn update_interval_ms(mut self, ms: u64) -> Self {
        self.config.alarm.update_interval_ms = ms;
        self
    }

    pub fn login_timeout_ms(mut self, ms: u64) -> Self {
        self.config.alarm.login_timeout_ms = ms;
        self
    }

    pub fn zone_poll_stagger_ms(mut self, ms: u64) -> Self {
        self.config.alarm.zone_poll_stagger_ms = ms;
        self
    }

    pub fn watchdog_interval_ms(mut self, ms: u64) -> Self {
        self.config.alarm.watchdog_interval_ms = ms;
        self
    }

    pub fn map_sensors(mut self, map_sensors: bool) -> Self {
        self.config.alarm.map_sensors = map_sensors;
        self
    }

    pub fn away_areas(mut self, areas: &[&str], shortcut: Option<&str>) -> Self {
        self.config.areas.away_areas = group_config(areas, shortcut);
        self
    }

    pub fn home_areas(mut self, areas: &[&str], shortcut: Option<&str>) -> Self {
        self.config.areas.home_areas = group_config(areas, shortcut);
        self
    }

    pub fn night_areas(mut self, areas: &[&str], shortcut: Option<&str>) -> Self {
        self.config.areas.night_areas = group_config(areas, shortcut);
        self
    }

    pub fn always_on_areas(mut self, areas: &[&str]) -> Self {
        self.config.areas.always_on_areas = areas.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.config.mqtt = Some(mqtt);
        self
    }

    pub fn build(self) -> BridgeConfig {
        self.config
    }
}

fn group_config(areas: &[&str], shortcut: Option<&str>) -> AreaGroupConfig {
    AreaGroupConfig {
        areas: areas.iter().map(|a| a.to_string()).collect(),
        shortcut: shortcut.map(str::to_string),
    }
}
