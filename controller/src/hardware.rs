use std::time::Duration;

use chrono::Utc;
use embedded_hal::delay::DelayNs;
use tracing::{debug, trace};

use ledclock_common::{FrameBuffer, Panel, TimeSource};

#[derive(Debug, Default)]
pub struct ConsolePanel {
    frames_written: u64,
    intensity: Option<u8>,
}

impl ConsolePanel {
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl Panel for ConsolePanel {
    fn write(&mut self, frame: &FrameBuffer) {
        self.frames_written += 1;
        trace!(count = self.frames_written, "frame\n{frame}");
    }

    fn set_intensity(&mut self, level: u8) {
        if self.intensity != Some(level) {
            debug!(level, "matrix intensity");
            self.intensity = Some(level);
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn fetch_epoch(&mut self) -> Option<i64> {
        Some(Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_panel_counts_frames() {
        let mut panel = ConsolePanel::default();
        let frame = FrameBuffer::for_panels(4, 1);

        panel.write(&frame);
        panel.write(&frame);
        panel.set_intensity(3);

        assert_eq!(panel.frames_written(), 2);
    }

    #[test]
    fn system_time_is_a_valid_epoch() {
        let epoch = SystemTimeSource.fetch_epoch().unwrap();
        assert!(epoch > ledclock_common::time::MIN_VALID_EPOCH);
    }
}
