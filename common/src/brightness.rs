use embedded_hal::delay::DelayNs;
use tracing::{info, warn};

use crate::{
    arbiter::DisplayArbiter,
    config::PersistedSettings,
    matrix::{LedMatrix, Panel, MAX_INTENSITY},
    store::SettingsStore,
};

pub const MAX_HOUR: u8 = 23;
pub const FADE_STEP_MS: u32 = 50;
pub const FADE_HOLD_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessSchedule {
    day_level: u8,
    night_level: u8,
    day_start_hour: u8,
    night_start_hour: u8,
}

impl Default for BrightnessSchedule {
    fn default() -> Self {
        Self::from(PersistedSettings::default())
    }
}

impl From<PersistedSettings> for BrightnessSchedule {
    fn from(settings: PersistedSettings) -> Self {
        Self {
            day_level: clamp_level(settings.day_brightness),
            night_level: clamp_level(settings.night_brightness),
            day_start_hour: clamp_hour(settings.day_start_hour),
            night_start_hour: clamp_hour(settings.night_start_hour),
        }
    }
}

impl BrightnessSchedule {
    pub fn day_level(&self) -> u8 {
        self.day_level
    }

    pub fn night_level(&self) -> u8 {
        self.night_level
    }

    pub fn day_start_hour(&self) -> u8 {
        self.day_start_hour
    }

    pub fn night_start_hour(&self) -> u8 {
        self.night_start_hour
    }

    pub fn set_day_level(&mut self, level: i64) {
        self.day_level = clamp_level(level);
    }

    pub fn set_night_level(&mut self, level: i64) {
        self.night_level = clamp_level(level);
    }

    pub fn set_day_start_hour(&mut self, hour: i64) {
        self.day_start_hour = clamp_hour(hour);
    }

    pub fn set_night_start_hour(&mut self, hour: i64) {
        self.night_start_hour = clamp_hour(hour);
    }

    pub fn is_day_time(&self, hour: u8) -> bool {
        if self.day_start_hour < self.night_start_hour {
            (self.day_start_hour..self.night_start_hour).contains(&hour)
        } else {
            hour >= self.day_start_hour || hour < self.night_start_hour
        }
    }

    pub fn target_intensity(&self, hour: u8) -> u8 {
        if self.is_day_time(hour) {
            self.day_level
        } else {
            self.night_level
        }
    }

    pub fn to_persisted(&self) -> PersistedSettings {
        PersistedSettings {
            day_brightness: i64::from(self.day_level),
            night_brightness: i64::from(self.night_level),
            day_start_hour: i64::from(self.day_start_hour),
            night_start_hour: i64::from(self.night_start_hour),
        }
    }
}

fn clamp_level(level: i64) -> u8 {
    level.clamp(0, i64::from(MAX_INTENSITY)) as u8
}

fn clamp_hour(hour: i64) -> u8 {
    hour.clamp(0, i64::from(MAX_HOUR)) as u8
}

pub struct BrightnessScheduler<S> {
    arbiter: DisplayArbiter,
    schedule: BrightnessSchedule,
    store: S,
}

impl<S: SettingsStore> BrightnessScheduler<S> {
    pub fn new(arbiter: DisplayArbiter, schedule: BrightnessSchedule, store: S) -> Self {
        Self {
            arbiter,
            schedule,
            store,
        }
    }

    pub fn load(arbiter: DisplayArbiter, store: S) -> Self {
        let schedule = match store.load() {
            Ok(Some(settings)) => BrightnessSchedule::from(settings),
            Ok(None) => {
                info!("no saved brightness schedule, using defaults");
                BrightnessSchedule::default()
            }
            Err(err) => {
                warn!("failed to load brightness schedule, using defaults: {err}");
                BrightnessSchedule::default()
            }
        };
        Self::new(arbiter, schedule, store)
    }

    pub fn schedule(&self) -> &BrightnessSchedule {
        &self.schedule
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_target_intensity(&self, hour: u8) -> u8 {
        self.schedule.target_intensity(hour)
    }

    pub fn apply_if_idle<P: Panel, D: DelayNs>(
        &self,
        matrix: &mut LedMatrix<P, D>,
        hour: u8,
    ) -> bool {
        if self.arbiter.is_owned() {
            return false;
        }
        let target = self.current_target_intensity(hour);
        if matrix.intensity() != target {
            matrix.set_intensity(target);
        }
        true
    }

    pub fn set_day_level<P: Panel, D: DelayNs>(
        &mut self,
        level: i64,
        matrix: &mut LedMatrix<P, D>,
        hour: u8,
    ) {
        self.schedule.set_day_level(level);
        self.commit(matrix, hour);
    }

    pub fn set_night_level<P: Panel, D: DelayNs>(
        &mut self,
        level: i64,
        matrix: &mut LedMatrix<P, D>,
        hour: u8,
    ) {
        self.schedule.set_night_level(level);
        self.commit(matrix, hour);
    }

    pub fn set_day_start_hour<P: Panel, D: DelayNs>(
        &mut self,
        start: i64,
        matrix: &mut LedMatrix<P, D>,
        hour: u8,
    ) {
        self.schedule.set_day_start_hour(start);
        self.commit(matrix, hour);
    }

    pub fn set_night_start_hour<P: Panel, D: DelayNs>(
        &mut self,
        start: i64,
        matrix: &mut LedMatrix<P, D>,
        hour: u8,
    ) {
        self.schedule.set_night_start_hour(start);
        self.commit(matrix, hour);
    }

    fn commit<P: Panel, D: DelayNs>(&mut self, matrix: &mut LedMatrix<P, D>, hour: u8) {
        info!(schedule = ?self.schedule, "brightness schedule updated");
        self.apply_if_idle(matrix, hour);
        if let Err(err) = self.store.save(&self.schedule.to_persisted()) {
            warn!("failed to persist brightness schedule: {err}");
        }
    }
}

pub fn fade<P: Panel, D: DelayNs>(matrix: &mut LedMatrix<P, D>) {
    for level in 0..=MAX_INTENSITY {
        matrix.set_intensity(level);
        matrix.hold(FADE_STEP_MS);
    }
    for level in (0..=MAX_INTENSITY).rev() {
        matrix.set_intensity(level);
        matrix.hold(FADE_STEP_MS);
    }
    matrix.hold(FADE_HOLD_MS);
}
