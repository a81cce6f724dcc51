pub const TOPIC_NOTIFICATION: &str = "ledclock/notification";
pub const TOPIC_ANIMATION: &str = "ledclock/animation";
pub const TOPIC_BRIGHTNESS_DAY: &str = "ledclock/brightness/day";
pub const TOPIC_BRIGHTNESS_NIGHT: &str = "ledclock/brightness/night";
pub const TOPIC_SCHEDULE_DAY_START: &str = "ledclock/schedule/day_start";
pub const TOPIC_SCHEDULE_NIGHT_START: &str = "ledclock/schedule/night_start";
pub const TOPIC_DISCOVERY: &str = "ledclock/discovery";

pub const TOPIC_STATUS: &str = "ledclock/status";

pub const DISCOVERY_PREFIX: &str = "homeassistant";

pub const COMMAND_TOPICS: [&str; 7] = [
    TOPIC_NOTIFICATION,
    TOPIC_ANIMATION,
    TOPIC_BRIGHTNESS_DAY,
    TOPIC_BRIGHTNESS_NIGHT,
    TOPIC_SCHEDULE_DAY_START,
    TOPIC_SCHEDULE_NIGHT_START,
    TOPIC_DISCOVERY,
];
