pub mod animation;
pub mod arbiter;
pub mod brightness;
pub mod clock;
pub mod command;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod engine;
pub mod matrix;
pub mod notification;
pub mod render;
pub mod store;
pub mod time;
pub mod topics;
pub mod types;

#[cfg(test)]
mod testing;

pub use animation::{Animation, AnimationPlayer};
pub use arbiter::{DisplayArbiter, DisplayGuard};
pub use brightness::{BrightnessSchedule, BrightnessScheduler};
pub use clock::{ClockFace, ClockRenderer};
pub use command::Command;
pub use config::{DisplayConfig, NetworkConfig, PersistedSettings, RuntimeConfig, TimeConfig};
pub use engine::ClockEngine;
pub use matrix::{FrameBuffer, LedMatrix, Panel};
pub use notification::{DisplayRequest, Notification, RenderMode};
pub use render::{ScrollRenderer, ScrollRestart};
pub use store::{SettingsStore, StoreError};
pub use time::{TimeKeeper, TimeSource};
pub use topics::*;
pub use types::{ClockSnapshot, StatusPayload};
