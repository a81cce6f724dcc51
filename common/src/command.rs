use tracing::warn;

use crate::{
    animation::Animation,
    notification::Notification,
    topics::{
        TOPIC_ANIMATION, TOPIC_BRIGHTNESS_DAY, TOPIC_BRIGHTNESS_NIGHT, TOPIC_DISCOVERY,
        TOPIC_NOTIFICATION, TOPIC_SCHEDULE_DAY_START, TOPIC_SCHEDULE_NIGHT_START,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Notify(Notification),
    PlayAnimation(Animation),
    SetDayBrightness(i64),
    SetNightBrightness(i64),
    SetDayStart(i64),
    SetNightStart(i64),
    SendDiscovery,
}

impl Command {
    /// `None` for unknown topics and for numeric commands whose payload is
    /// not an integer. Integers are passed through unclamped.
    pub fn parse(topic: &str, payload: &str) -> Option<Self> {
        match topic {
            TOPIC_NOTIFICATION => Some(Self::Notify(Notification::parse(payload))),
            TOPIC_ANIMATION => Some(Self::PlayAnimation(Animation::from_name(payload.trim()))),
            TOPIC_BRIGHTNESS_DAY => parse_number(topic, payload).map(Self::SetDayBrightness),
            TOPIC_BRIGHTNESS_NIGHT => parse_number(topic, payload).map(Self::SetNightBrightness),
            TOPIC_SCHEDULE_DAY_START => parse_number(topic, payload).map(Self::SetDayStart),
            TOPIC_SCHEDULE_NIGHT_START => parse_number(topic, payload).map(Self::SetNightStart),
            TOPIC_DISCOVERY => Some(Self::SendDiscovery),
            _ => None,
        }
    }
}

fn parse_number(topic: &str, payload: &str) -> Option<i64> {
    match payload.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring non-numeric payload {payload:?} on {topic}: {err}");
            None
        }
    }
}
