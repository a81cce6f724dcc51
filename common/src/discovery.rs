use serde::Serialize;

use crate::topics::{
    DISCOVERY_PREFIX, TOPIC_BRIGHTNESS_DAY, TOPIC_BRIGHTNESS_NIGHT, TOPIC_NOTIFICATION,
    TOPIC_STATUS,
};

const NODE_ID: &str = "mqtt_clock";
const DEVICE_MODEL: &str = "LED Matrix Clock";
const DEVICE_MANUFACTURER: &str = "Custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub name: String,
    pub model: &'static str,
    pub manufacturer: &'static str,
    pub sw_version: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryEntity {
    pub name: &'static str,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u8>,
    pub icon: &'static str,
    pub device: DeviceInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub config: DiscoveryEntity,
}

pub fn device_id(client_id: &str) -> String {
    let suffix: String = client_id
        .chars()
        .filter(|ch| *ch != ':' && *ch != '-')
        .collect();
    format!("{NODE_ID}_{suffix}")
}

pub fn discovery_messages(device_id: &str, device_name: &str) -> Vec<DiscoveryMessage> {
    let device = DeviceInfo {
        identifiers: vec![device_id.to_string()],
        name: device_name.to_string(),
        model: DEVICE_MODEL,
        manufacturer: DEVICE_MANUFACTURER,
        sw_version: env!("CARGO_PKG_VERSION"),
    };
    let entity = |name, suffix: &str| DiscoveryEntity {
        name,
        unique_id: format!("{device_id}_{suffix}"),
        state_topic: None,
        command_topic: None,
        value_template: None,
        min: None,
        max: None,
        step: None,
        icon: "",
        device: device.clone(),
    };
    let brightness = |name, suffix, command_topic, template, icon| DiscoveryEntity {
        state_topic: Some(TOPIC_STATUS),
        command_topic: Some(command_topic),
        value_template: Some(template),
        min: Some(0),
        max: Some(15),
        step: Some(1),
        icon,
        ..entity(name, suffix)
    };

    vec![
        message(
            "sensor",
            "status",
            DiscoveryEntity {
                state_topic: Some(TOPIC_STATUS),
                value_template: Some("{{ value_json.status }}"),
                icon: "mdi:clock-digital",
                ..entity("Clock Status", "status")
            },
        ),
        message(
            "sensor",
            "daynight",
            DiscoveryEntity {
                state_topic: Some(TOPIC_STATUS),
                value_template: Some(
                    "{% if value_json.is_day_time %}Day{% else %}Night{% endif %}",
                ),
                icon: "mdi:weather-sunny",
                ..entity("Day/Night Mode", "daynight")
            },
        ),
        message(
            "number",
            "day_brightness",
            brightness(
                "Day Brightness",
                "day_brightness",
                TOPIC_BRIGHTNESS_DAY,
                "{{ value_json.day_brightness }}",
                "mdi:brightness-6",
            ),
        ),
        message(
            "number",
            "night_brightness",
            brightness(
                "Night Brightness",
                "night_brightness",
                TOPIC_BRIGHTNESS_NIGHT,
                "{{ value_json.night_brightness }}",
                "mdi:brightness-3",
            ),
        ),
        message(
            "text",
            "notification",
            DiscoveryEntity {
                command_topic: Some(TOPIC_NOTIFICATION),
                icon: "mdi:message-text",
                ..entity("Send Notification", "notification")
            },
        ),
    ]
}

fn message(component: &str, object_id: &str, config: DiscoveryEntity) -> DiscoveryMessage {
    DiscoveryMessage {
        topic: format!("{DISCOVERY_PREFIX}/{component}/{NODE_ID}/{object_id}/config"),
        config,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn device_id_strips_separators() {
        assert_eq!(device_id("AA:BB-cc:01"), "mqtt_clock_AABBcc01");
    }

    #[test]
    fn announces_five_entities_on_expected_topics() {
        let topics: Vec<String> = discovery_messages("mqtt_clock_x", "MQTT Clock")
            .into_iter()
            .map(|message| message.topic)
            .collect();

        assert_eq!(
            topics,
            vec![
                "homeassistant/sensor/mqtt_clock/status/config",
                "homeassistant/sensor/mqtt_clock/daynight/config",
                "homeassistant/number/mqtt_clock/day_brightness/config",
                "homeassistant/number/mqtt_clock/night_brightness/config",
                "homeassistant/text/mqtt_clock/notification/config",
            ]
        );
    }

    #[test]
    fn number_entity_carries_range_and_command_topic() {
        let messages = discovery_messages("mqtt_clock_x", "Kitchen");
        let value = serde_json::to_value(&messages[2].config).unwrap();

        assert_eq!(value["unique_id"], json!("mqtt_clock_x_day_brightness"));
        assert_eq!(value["command_topic"], json!("ledclock/brightness/day"));
        assert_eq!(value["state_topic"], json!("ledclock/status"));
        assert_eq!((value["min"].clone(), value["max"].clone()), (json!(0), json!(15)));
        assert_eq!(value["device"]["name"], json!("Kitchen"));
        assert_eq!(value["device"]["identifiers"], json!(["mqtt_clock_x"]));
    }

    #[test]
    fn text_entity_has_no_state_fields() {
        let messages = discovery_messages("mqtt_clock_x", "Kitchen");
        let value = serde_json::to_value(&messages[4].config).unwrap();

        assert!(value.get("state_topic").is_none());
        assert!(value.get("value_template").is_none());
        assert!(value.get("min").is_none());
        assert_eq!(value["command_topic"], json!("ledclock/notification"));
    }
}
