use embedded_hal::delay::DelayNs;

use crate::{
    arbiter::DisplayArbiter,
    config::PersistedSettings,
    matrix::{FrameBuffer, LedMatrix, Panel},
    render::ScrollRestart,
    store::{SettingsStore, StoreError},
};

#[derive(Debug, Default)]
pub struct RecordingPanel {
    pub frames: Vec<FrameBuffer>,
    pub intensities: Vec<u8>,
    pub owned_on_write: Vec<bool>,
    pub watch: Option<DisplayArbiter>,
    pub restart_after: Option<(usize, ScrollRestart)>,
}

impl Panel for RecordingPanel {
    fn write(&mut self, frame: &FrameBuffer) {
        self.frames.push(frame.clone());
        if let Some(arbiter) = &self.watch {
            self.owned_on_write.push(arbiter.is_owned());
        }
        if let Some((after, restart)) = &self.restart_after {
            if self.frames.len() == *after {
                restart.request();
            }
        }
    }

    fn set_intensity(&mut self, level: u8) {
        self.intensities.push(level);
    }
}

#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub holds: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.holds.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.holds.push(ms);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub stored: Option<PersistedSettings>,
    pub saved: Vec<PersistedSettings>,
    pub fail_load: bool,
    pub fail_save: bool,
}

impl MemoryStore {
    pub fn with(settings: PersistedSettings) -> Self {
        Self {
            stored: Some(settings),
            ..Self::default()
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedSettings>, StoreError> {
        if self.fail_load {
            return Err(serde_json::from_str::<PersistedSettings>("{").unwrap_err().into());
        }
        Ok(self.stored)
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), StoreError> {
        if self.fail_save {
            return Err(std::io::Error::other("flash is read-only").into());
        }
        self.stored = Some(*settings);
        self.saved.push(*settings);
        Ok(())
    }
}

pub type TestMatrix = LedMatrix<RecordingPanel, RecordingDelay>;

pub fn matrix_with(panel: RecordingPanel) -> TestMatrix {
    LedMatrix::new(FrameBuffer::for_panels(4, 1), panel, RecordingDelay::default())
}

pub fn test_matrix() -> TestMatrix {
    matrix_with(RecordingPanel::default())
}
