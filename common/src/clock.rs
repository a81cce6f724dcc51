use chrono::{DateTime, FixedOffset, Timelike};
use embedded_hal::delay::DelayNs;

use crate::{
    arbiter::DisplayArbiter,
    matrix::{LedMatrix, Panel},
    render::ScrollRenderer,
};

pub const UNSYNCED_TEXT: &str = "--:--";

#[derive(Debug, Clone, Copy)]
pub struct ClockFace {
    flash_seconds: bool,
}

impl ClockFace {
    pub fn new(flash_seconds: bool) -> Self {
        Self { flash_seconds }
    }

    pub fn text(&self, now: Option<DateTime<FixedOffset>>) -> String {
        let Some(now) = now else {
            return UNSYNCED_TEXT.to_string();
        };
        let separator = if self.flash_seconds && now.second() % 2 == 0 {
            ' '
        } else {
            ':'
        };
        format!("{}{}{:02}", now.hour(), separator, now.minute())
    }
}

pub fn hour_of(now: Option<DateTime<FixedOffset>>) -> u8 {
    now.map(|now| now.hour() as u8).unwrap_or(0)
}

pub struct ClockRenderer {
    arbiter: DisplayArbiter,
    face: ClockFace,
}

impl ClockRenderer {
    pub fn new(arbiter: DisplayArbiter, face: ClockFace) -> Self {
        Self { arbiter, face }
    }

    pub fn render<P: Panel, D: DelayNs>(
        &self,
        matrix: &mut LedMatrix<P, D>,
        renderer: &ScrollRenderer,
        now: Option<DateTime<FixedOffset>>,
    ) -> bool {
        if self.arbiter.is_owned() {
            return false;
        }
        matrix.fill_screen(false);
        renderer.render_static(matrix, &self.face.text(now));
        true
    }
}
