use chrono::{DateTime, FixedOffset};
use embedded_hal::delay::DelayNs;
use tracing::{debug, info};

use crate::{
    animation::AnimationPlayer,
    arbiter::DisplayArbiter,
    brightness::{fade, BrightnessSchedule, BrightnessScheduler},
    clock::{hour_of, ClockFace, ClockRenderer},
    command::Command,
    config::DisplayConfig,
    dispatcher::Dispatcher,
    matrix::{LedMatrix, Panel},
    render::{ScrollRenderer, ScrollRestart},
    store::SettingsStore,
    time::{TimeKeeper, TimeSource},
    types::{ClockSnapshot, StatusPayload},
};

pub const TIME_FAILED_TEXT: &str = "Time update failed!";
const UPDATE_INDICATOR: [(i32, i32); 3] = [(0, 4), (0, 3), (0, 2)];

pub struct ClockEngine<P, D, S> {
    matrix: LedMatrix<P, D>,
    arbiter: DisplayArbiter,
    renderer: ScrollRenderer,
    scheduler: BrightnessScheduler<S>,
    dispatcher: Dispatcher,
    animations: AnimationPlayer,
    clock: ClockRenderer,
    face: ClockFace,
    startup_text: String,
    scroll_speed_ms: u16,
}

impl<P: Panel, D: DelayNs, S: SettingsStore> ClockEngine<P, D, S> {
    pub fn new(matrix: LedMatrix<P, D>, store: S, config: &DisplayConfig) -> Self {
        let arbiter = DisplayArbiter::new();
        let face = ClockFace::new(config.flash_seconds);
        Self {
            matrix,
            renderer: ScrollRenderer::default(),
            scheduler: BrightnessScheduler::load(arbiter.clone(), store),
            dispatcher: Dispatcher::new(arbiter.clone(), config.scroll_speed_ms),
            animations: AnimationPlayer::new(arbiter.clone()),
            clock: ClockRenderer::new(arbiter.clone(), face),
            face,
            startup_text: config.startup_text.clone(),
            scroll_speed_ms: config.scroll_speed_ms,
            arbiter,
        }
    }

    pub fn arbiter(&self) -> DisplayArbiter {
        self.arbiter.clone()
    }

    pub fn scroll_restart(&self) -> ScrollRestart {
        self.renderer.restart_handle()
    }

    pub fn matrix(&self) -> &LedMatrix<P, D> {
        &self.matrix
    }

    pub fn schedule(&self) -> &BrightnessSchedule {
        self.scheduler.schedule()
    }

    pub fn store(&self) -> &S {
        self.scheduler.store()
    }

    pub fn queued(&self) -> usize {
        self.dispatcher.queued()
    }

    pub fn boot(&mut self, now: Option<DateTime<FixedOffset>>) {
        if let Some(_guard) = self.arbiter.try_acquire() {
            info!(text = %self.startup_text, "boot animation");
            self.matrix.set_intensity(0);
            self.matrix.fill_screen(false);
            self.renderer.render_static(&mut self.matrix, &self.startup_text);
            fade(&mut self.matrix);
        }
        self.scheduler.apply_if_idle(&mut self.matrix, hour_of(now));
    }

    pub fn handle(&mut self, command: Command, now: Option<DateTime<FixedOffset>>) {
        let hour = hour_of(now);
        match command {
            Command::Notify(notification) => self.dispatcher.enqueue(notification),
            Command::PlayAnimation(animation) => {
                self.animations
                    .play(animation, &mut self.matrix, &self.scheduler, hour);
            }
            Command::SetDayBrightness(level) => {
                self.scheduler.set_day_level(level, &mut self.matrix, hour)
            }
            Command::SetNightBrightness(level) => {
                self.scheduler.set_night_level(level, &mut self.matrix, hour)
            }
            Command::SetDayStart(start) => {
                self.scheduler
                    .set_day_start_hour(start, &mut self.matrix, hour)
            }
            Command::SetNightStart(start) => {
                self.scheduler
                    .set_night_start_hour(start, &mut self.matrix, hour)
            }
            Command::SendDiscovery => debug!("discovery requested"),
        }
    }

    pub fn tick(&mut self, now: Option<DateTime<FixedOffset>>) {
        if self.arbiter.is_owned() {
            return;
        }
        let hour = hour_of(now);
        let ran = self
            .dispatcher
            .pump_once(&mut self.matrix, &self.renderer, &self.scheduler, hour);
        if !ran {
            self.clock.render(&mut self.matrix, &self.renderer, now);
        }
        self.scheduler.apply_if_idle(&mut self.matrix, hour);
    }

    pub fn refresh_time<T: TimeSource>(
        &mut self,
        keeper: &mut TimeKeeper,
        source: &mut T,
        now_ms: u64,
    ) -> bool {
        if !self.arbiter.is_owned() {
            for (x, y) in UPDATE_INDICATOR {
                self.matrix.set_pixel(x, y, true);
            }
            self.matrix.write();
        }

        if keeper.record(source.fetch_epoch(), now_ms) {
            return true;
        }

        if let Some(_guard) = self.arbiter.try_acquire() {
            self.renderer.render_scroll(
                &mut self.matrix,
                TIME_FAILED_TEXT,
                u32::from(self.scroll_speed_ms),
            );
        }
        let hour = hour_of(keeper.local_now(now_ms));
        self.scheduler.apply_if_idle(&mut self.matrix, hour);
        false
    }

    pub fn status(&self, now: Option<DateTime<FixedOffset>>) -> StatusPayload {
        StatusPayload::online(self.scheduler.schedule(), hour_of(now))
    }

    pub fn snapshot(&self, now: Option<DateTime<FixedOffset>>) -> ClockSnapshot {
        let schedule = self.scheduler.schedule();
        ClockSnapshot {
            day_brightness: schedule.day_level(),
            night_brightness: schedule.night_level(),
            day_start_hour: schedule.day_start_hour(),
            night_start_hour: schedule.night_start_hour(),
            is_day_time: schedule.is_day_time(hour_of(now)),
            display_busy: self.arbiter.is_owned(),
            queued: self.dispatcher.queued(),
            intensity: self.matrix.intensity(),
            time_synced: now.is_some(),
            time: self.face.text(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        animation::Animation,
        brightness::{FADE_HOLD_MS, FADE_STEP_MS},
        matrix::FrameBuffer,
        notification::Notification,
        render::scroll_steps,
        testing::{MemoryStore, RecordingDelay, RecordingPanel},
    };

    type TestEngine = ClockEngine<RecordingPanel, RecordingDelay, MemoryStore>;

    struct FixedSource(Option<i64>);

    impl TimeSource for FixedSource {
        fn fetch_epoch(&mut self) -> Option<i64> {
            self.0
        }
    }

    fn engine() -> TestEngine {
        let matrix = LedMatrix::new(
            FrameBuffer::for_panels(4, 1),
            RecordingPanel::default(),
            RecordingDelay::default(),
        );
        ClockEngine::new(matrix, MemoryStore::default(), &DisplayConfig::default())
    }

    fn at(hour: u32, second: u32) -> Option<DateTime<FixedOffset>> {
        FixedOffset::east_opt(0)?
            .with_ymd_and_hms(2024, 1, 15, hour, 30, second)
            .single()
    }

    #[test]
    fn boot_greets_fades_and_settles_on_the_schedule() {
        let mut engine = engine();

        engine.boot(at(12, 0));

        let panel = engine.matrix().panel();
        assert_eq!(panel.frames.len(), 1);
        assert!(panel.frames[0].lit_count() > 0);
        assert_eq!(panel.intensities.first(), Some(&0));
        assert_eq!(panel.intensities.last(), Some(&8));

        let mut holds = vec![FADE_STEP_MS; 32];
        holds.push(FADE_HOLD_MS);
        assert_eq!(engine.matrix().delay().holds, holds);
        assert!(!engine.arbiter().is_owned());
    }

    #[test]
    fn idle_tick_draws_the_clock() {
        let mut engine = engine();

        engine.tick(at(9, 1));

        assert_eq!(engine.matrix().panel().frames.len(), 1);
        assert_eq!(engine.matrix().intensity(), 8);
    }

    #[test]
    fn tick_runs_queued_notifications_before_the_clock() {
        let mut engine = engine();
        engine.handle(Command::Notify(Notification::parse("A")), at(9, 1));
        engine.handle(Command::Notify(Notification::parse("B")), at(9, 1));
        assert_eq!(engine.queued(), 2);

        engine.tick(at(9, 1));
        assert_eq!(engine.queued(), 1);
        assert_eq!(engine.matrix().panel().frames.len(), scroll_steps(2, 32));

        engine.tick(at(9, 1));
        engine.tick(at(9, 1));
        assert_eq!(engine.queued(), 0);
        assert_eq!(
            engine.matrix().panel().frames.len(),
            2 * scroll_steps(2, 32) + 1
        );
    }

    #[test]
    fn tick_does_nothing_while_the_display_is_owned() {
        let mut engine = engine();
        engine.handle(Command::Notify(Notification::parse("A")), at(9, 1));
        let arbiter = engine.arbiter();
        let _guard = arbiter.try_acquire().unwrap();

        engine.tick(at(9, 1));

        assert_eq!(engine.queued(), 1);
        assert!(engine.matrix().panel().frames.is_empty());
        assert!(engine.matrix().panel().intensities.is_empty());
    }

    #[test]
    fn schedule_commands_clamp_apply_and_persist() {
        let mut engine = engine();

        engine.handle(Command::SetDayBrightness(20), at(12, 0));
        engine.handle(Command::SetNightStart(-1), at(12, 0));

        assert_eq!(engine.schedule().day_level(), 15);
        assert_eq!(engine.schedule().night_start_hour(), 0);
        assert_eq!(engine.matrix().intensity(), 15);
        let saved = &engine.store().saved;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].day_brightness, 15);
        assert_eq!(saved[1].night_start_hour, 0);
    }

    #[test]
    fn animation_command_plays_immediately() {
        let mut engine = engine();

        engine.handle(Command::PlayAnimation(Animation::Error), at(12, 0));

        assert_eq!(engine.matrix().panel().frames.len(), 6);
        assert_eq!(engine.queued(), 0);
    }

    #[test]
    fn discovery_leaves_the_display_alone() {
        let mut engine = engine();
        engine.handle(Command::SendDiscovery, at(12, 0));
        assert!(engine.matrix().panel().frames.is_empty());
    }

    #[test]
    fn successful_refresh_shows_only_the_indicator() {
        let mut engine = engine();
        let mut keeper = TimeKeeper::new(chrono_tz::Tz::UTC, 60);

        let synced = engine.refresh_time(&mut keeper, &mut FixedSource(Some(1_700_000_000)), 0);

        assert!(synced);
        assert!(keeper.is_synced());
        let frames = &engine.matrix().panel().frames;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].lit_count(), 3);
        assert!((2..=4).all(|y| frames[0].is_lit(0, y)));
    }

    #[test]
    fn failed_refresh_scrolls_a_warning() {
        let mut engine = engine();
        let mut keeper = TimeKeeper::new(chrono_tz::Tz::UTC, 60);

        let synced = engine.refresh_time(&mut keeper, &mut FixedSource(Some(42)), 0);

        assert!(!synced);
        assert!(!keeper.is_synced());
        let expected = 1 + scroll_steps(TIME_FAILED_TEXT.len() + 1, 32);
        assert_eq!(engine.matrix().panel().frames.len(), expected);
        assert!(!engine.arbiter().is_owned());
        // Unsynced time falls back to hour 0, which is night.
        assert_eq!(engine.matrix().intensity(), 1);
    }

    #[test]
    fn snapshot_reflects_schedule_and_queue() {
        let mut engine = engine();
        engine.handle(Command::Notify(Notification::parse("later")), at(23, 0));

        let snapshot = engine.snapshot(at(23, 0));

        assert_eq!(snapshot.queued, 1);
        assert!(!snapshot.is_day_time);
        assert!(snapshot.time_synced);
        assert_eq!(snapshot.time, "23 30");
        assert_eq!(engine.snapshot(None).time, "--:--");
        assert!(engine.status(at(10, 0)).is_day_time);
    }
}
