use serde::{Deserialize, Serialize};

pub const DEFAULT_DAY_BRIGHTNESS: i64 = 8;
pub const DEFAULT_NIGHT_BRIGHTNESS: i64 = 1;
pub const DEFAULT_DAY_START_HOUR: i64 = 7;
pub const DEFAULT_NIGHT_START_HOUR: i64 = 22;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub panels_horizontal: u8,
    pub panels_vertical: u8,
    pub scroll_speed_ms: u16,
    pub flash_seconds: bool,
    pub startup_text: String,
    pub idle_poll_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            panels_horizontal: 4,
            panels_vertical: 1,
            scroll_speed_ms: 35,
            flash_seconds: true,
            startup_text: "Witaj".to_string(),
            idle_poll_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub timezone: String,
    pub refresh_minutes: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Oslo".to_string(),
            refresh_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
    pub client_id: String,
    pub device_name: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "192.168.1.100".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            client_id: "mqtt-clock".to_string(),
            device_name: "MQTT Clock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.display.panels_horizontal = self.display.panels_horizontal.clamp(1, 16);
        self.display.panels_vertical = self.display.panels_vertical.clamp(1, 4);
        self.display.scroll_speed_ms = self.display.scroll_speed_ms.clamp(5, 100);
        self.display.idle_poll_ms = self.display.idle_poll_ms.clamp(10, 1_000);
        self.time.refresh_minutes = self.time.refresh_minutes.max(1);
    }
}

/// On-disk record of the brightness schedule.
///
/// Every field defaults on its own, so a record missing a key keeps the
/// others. Values are stored wide and clamped when the schedule is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(default = "default_day_brightness")]
    pub day_brightness: i64,
    #[serde(default = "default_night_brightness")]
    pub night_brightness: i64,
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: i64,
    #[serde(default = "default_night_start_hour")]
    pub night_start_hour: i64,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            day_brightness: DEFAULT_DAY_BRIGHTNESS,
            night_brightness: DEFAULT_NIGHT_BRIGHTNESS,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            night_start_hour: DEFAULT_NIGHT_START_HOUR,
        }
    }
}

fn default_day_brightness() -> i64 {
    DEFAULT_DAY_BRIGHTNESS
}

fn default_night_brightness() -> i64 {
    DEFAULT_NIGHT_BRIGHTNESS
}

fn default_day_start_hour() -> i64 {
    DEFAULT_DAY_START_HOUR
}

fn default_night_start_hour() -> i64 {
    DEFAULT_NIGHT_START_HOUR
}
