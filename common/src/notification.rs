use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_REPEAT: i64 = 1;
pub const DEFAULT_SPEED_MS: i64 = 35;
pub const DEFAULT_FLASH_COUNT: i64 = 3;
pub const NO_OVERRIDE: i64 = -1;
pub const MISSING_MESSAGE: &str = "No message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Scroll,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRequest {
    pub text: String,
    pub mode: RenderMode,
    pub repeat_count: u8,
    pub scroll_speed_ms: u16,
    pub override_brightness: Option<u8>,
    pub flash: bool,
    pub flash_count: u8,
}

impl DisplayRequest {
    pub fn scroll(text: impl Into<String>, speed_ms: u16) -> Self {
        Self {
            text: text.into(),
            mode: RenderMode::Scroll,
            repeat_count: DEFAULT_REPEAT as u8,
            scroll_speed_ms: speed_ms,
            override_brightness: None,
            flash: false,
            flash_count: DEFAULT_FLASH_COUNT as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SimpleText(String),
    Structured(DisplayRequest),
}

impl Notification {
    /// Payloads starting with `{` are read as structured requests; anything
    /// that fails to parse is kept whole as plain text.
    pub fn parse(payload: &str) -> Self {
        if !payload.starts_with('{') {
            return Self::SimpleText(payload.to_string());
        }

        match serde_json::from_str::<StructuredPayload>(payload) {
            Ok(fields) => Self::Structured(fields.into_request()),
            Err(err) => {
                warn!("malformed notification payload, showing it as text: {err}");
                Self::SimpleText(payload.to_string())
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::SimpleText(text) => text,
            Self::Structured(request) => &request.text,
        }
    }

    pub fn into_request(self, default_speed_ms: u16) -> DisplayRequest {
        match self {
            Self::SimpleText(text) => DisplayRequest::scroll(text, default_speed_ms),
            Self::Structured(request) => request,
        }
    }
}

/// Field values of the wrong JSON type fall back to the default, the same as
/// a missing field.
#[derive(Debug, Default, Deserialize)]
struct StructuredPayload {
    message: Option<Value>,
    scrolling: Option<Value>,
    repeat: Option<Value>,
    speed: Option<Value>,
    brightness: Option<Value>,
    flash: Option<Value>,
    flash_count: Option<Value>,
}

impl StructuredPayload {
    fn into_request(self) -> DisplayRequest {
        let text = self
            .message
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or(MISSING_MESSAGE)
            .to_string();
        let scrolling = bool_or(self.scrolling.as_ref(), true);
        let brightness = int_or(self.brightness.as_ref(), NO_OVERRIDE).clamp(NO_OVERRIDE, 15);

        DisplayRequest {
            text,
            mode: if scrolling {
                RenderMode::Scroll
            } else {
                RenderMode::Static
            },
            repeat_count: int_or(self.repeat.as_ref(), DEFAULT_REPEAT).clamp(1, 10) as u8,
            scroll_speed_ms: int_or(self.speed.as_ref(), DEFAULT_SPEED_MS).clamp(5, 100) as u16,
            override_brightness: u8::try_from(brightness).ok(),
            flash: bool_or(self.flash.as_ref(), false),
            flash_count: int_or(self.flash_count.as_ref(), DEFAULT_FLASH_COUNT).clamp(1, 10) as u8,
        }
    }
}

fn int_or(value: Option<&Value>, default: i64) -> i64 {
    value.and_then(Value::as_i64).unwrap_or(default)
}

fn bool_or(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn plain_text_is_a_single_default_scroll() {
        let notification = Notification::parse("Dinner is ready");

        assert_eq!(
            notification,
            Notification::SimpleText("Dinner is ready".to_string())
        );
        assert_eq!(
            notification.into_request(35),
            DisplayRequest {
                text: "Dinner is ready".to_string(),
                mode: RenderMode::Scroll,
                repeat_count: 1,
                scroll_speed_ms: 35,
                override_brightness: None,
                flash: false,
                flash_count: 3,
            }
        );
    }

    #[test]
    fn structured_fields_override_defaults() {
        let notification = Notification::parse(r#"{"message":"Hi","repeat":2,"speed":20}"#);

        assert_eq!(
            notification,
            Notification::Structured(DisplayRequest {
                text: "Hi".to_string(),
                mode: RenderMode::Scroll,
                repeat_count: 2,
                scroll_speed_ms: 20,
                override_brightness: None,
                flash: false,
                flash_count: 3,
            })
        );
    }

    #[test]
    fn structured_values_are_clamped() {
        let notification = Notification::parse(
            r#"{"message":"x","repeat":50,"speed":1,"brightness":99,"flash_count":0}"#,
        );
        let Notification::Structured(request) = notification else {
            panic!("expected structured request");
        };

        assert_eq!(request.repeat_count, 10);
        assert_eq!(request.scroll_speed_ms, 5);
        assert_eq!(request.override_brightness, Some(15));
        assert_eq!(request.flash_count, 1);
    }

    #[test]
    fn negative_brightness_means_no_override() {
        let Notification::Structured(request) =
            Notification::parse(r#"{"message":"x","brightness":-7}"#)
        else {
            panic!("expected structured request");
        };
        assert_eq!(request.override_brightness, None);
    }

    #[test]
    fn static_flash_request() {
        let Notification::Structured(request) = Notification::parse(
            r#"{"message":"Door","scrolling":false,"flash":true,"flash_count":2,"brightness":0}"#,
        ) else {
            panic!("expected structured request");
        };

        assert_eq!(request.mode, RenderMode::Static);
        assert!(request.flash);
        assert_eq!(request.flash_count, 2);
        assert_eq!(request.override_brightness, Some(0));
    }

    #[test]
    fn missing_message_and_wrong_types_use_defaults() {
        let Notification::Structured(request) =
            Notification::parse(r#"{"repeat":"three","scrolling":"no","extra":1}"#)
        else {
            panic!("expected structured request");
        };

        assert_eq!(request.text, MISSING_MESSAGE);
        assert_eq!(request.repeat_count, 1);
        assert_eq!(request.mode, RenderMode::Scroll);
    }

    #[test]
    fn malformed_structured_payload_degrades_to_text() {
        let raw = r#"{"message":"Hi","repeat":"#;
        assert_eq!(
            Notification::parse(raw),
            Notification::SimpleText(raw.to_string())
        );
    }

    #[test]
    fn leading_whitespace_keeps_json_as_text() {
        let payload = r#" {"message":"x"}"#;
        assert_eq!(
            Notification::parse(payload),
            Notification::SimpleText(payload.to_string())
        );
    }
}
