use serde::Serialize;
use serde_json::json;

use crate::brightness::BrightnessSchedule;

pub const STATUS_ONLINE: &str = "online";
pub const STATUS_OFFLINE: &str = "offline";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub status: &'static str,
    pub day_brightness: u8,
    pub night_brightness: u8,
    pub day_start_hour: u8,
    pub night_start_hour: u8,
    pub is_day_time: bool,
}

impl StatusPayload {
    pub fn online(schedule: &BrightnessSchedule, hour: u8) -> Self {
        Self {
            status: STATUS_ONLINE,
            day_brightness: schedule.day_level(),
            night_brightness: schedule.night_level(),
            day_start_hour: schedule.day_start_hour(),
            night_start_hour: schedule.night_start_hour(),
            is_day_time: schedule.is_day_time(hour),
        }
    }
}

pub fn offline_payload() -> Vec<u8> {
    json!({ "status": STATUS_OFFLINE }).to_string().into_bytes()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClockSnapshot {
    #[serde(rename = "dayBrightness")]
    pub day_brightness: u8,
    #[serde(rename = "nightBrightness")]
    pub night_brightness: u8,
    #[serde(rename = "dayStartHour")]
    pub day_start_hour: u8,
    #[serde(rename = "nightStartHour")]
    pub night_start_hour: u8,
    #[serde(rename = "isDayTime")]
    pub is_day_time: bool,
    #[serde(rename = "displayBusy")]
    pub display_busy: bool,
    pub queued: usize,
    pub intensity: u8,
    #[serde(rename = "timeSynced")]
    pub time_synced: bool,
    pub time: String,
}
