use embedded_hal::delay::DelayNs;
use tracing::info;

use crate::{
    arbiter::DisplayArbiter,
    brightness::BrightnessScheduler,
    matrix::{LedMatrix, Panel},
    store::SettingsStore,
};

const HEART_BEATS: usize = 4;
const HEART_HOLD_MS: u32 = 500;
const WAVE_FRAMES: i32 = 48;
const WAVE_HOLD_MS: u32 = 80;
const PULSE_RADIUS: i32 = 8;
const PULSE_HOLD_MS: u32 = 200;
const ERROR_BLINKS: usize = 3;
const ERROR_HOLD_MS: u32 = 200;

const SMALL_HEART: [(i32, i32); 12] = [
    (14, 2),
    (15, 2),
    (17, 2),
    (18, 2),
    (13, 3),
    (16, 3),
    (19, 3),
    (14, 4),
    (18, 4),
    (15, 5),
    (17, 5),
    (16, 6),
];

const LARGE_HEART: [(i32, i32); 18] = [
    (13, 1),
    (14, 1),
    (15, 1),
    (17, 1),
    (18, 1),
    (19, 1),
    (12, 2),
    (16, 2),
    (20, 2),
    (12, 3),
    (20, 3),
    (13, 4),
    (19, 4),
    (14, 5),
    (18, 5),
    (15, 6),
    (17, 6),
    (16, 7),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Heart,
    Wave,
    Pulse,
    Error,
}

impl Animation {
    pub fn from_name(name: &str) -> Self {
        match name {
            "heart" => Self::Heart,
            "wave" => Self::Wave,
            "pulse" => Self::Pulse,
            _ => Self::Error,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Wave => "wave",
            Self::Pulse => "pulse",
            Self::Error => "error",
        }
    }

    pub fn frames(&self) -> Vec<Frame> {
        match self {
            Self::Heart => heart_frames(),
            Self::Wave => wave_frames(),
            Self::Pulse => pulse_frames(),
            Self::Error => error_frames(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Fill(bool),
    Pixels(Vec<(i32, i32)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub pattern: Pattern,
    pub hold_ms: u32,
}

impl Frame {
    fn pixels(pixels: Vec<(i32, i32)>, hold_ms: u32) -> Self {
        Self {
            pattern: Pattern::Pixels(pixels),
            hold_ms,
        }
    }

    fn fill(on: bool, hold_ms: u32) -> Self {
        Self {
            pattern: Pattern::Fill(on),
            hold_ms,
        }
    }

    fn draw<P: Panel, D: DelayNs>(&self, matrix: &mut LedMatrix<P, D>) {
        match &self.pattern {
            Pattern::Fill(on) => matrix.fill_screen(*on),
            Pattern::Pixels(pixels) => {
                matrix.fill_screen(false);
                for (x, y) in pixels {
                    matrix.set_pixel(*x, *y, true);
                }
            }
        }
    }
}

fn heart_frames() -> Vec<Frame> {
    (0..HEART_BEATS)
        .flat_map(|_| {
            [
                Frame::pixels(SMALL_HEART.to_vec(), HEART_HOLD_MS),
                Frame::pixels(LARGE_HEART.to_vec(), HEART_HOLD_MS),
            ]
        })
        .collect()
}

fn wave_frames() -> Vec<Frame> {
    (0..WAVE_FRAMES)
        .map(|x| {
            let pixels = (0..32)
                .step_by(2)
                .filter_map(|i| {
                    let y = (4.0 + (f64::from(x + i) * 0.3).sin() * 2.5) as i32;
                    (0..8).contains(&y).then_some((i, y))
                })
                .collect();
            Frame::pixels(pixels, WAVE_HOLD_MS)
        })
        .collect()
}

fn ring(radius: i32) -> Vec<(i32, i32)> {
    let mut pixels = Vec::new();
    for x in (16 - radius)..=(16 + radius) {
        if !(0..32).contains(&x) {
            continue;
        }
        for y in (4 - radius / 2)..=(4 + radius / 2) {
            if !(0..8).contains(&y) {
                continue;
            }
            let distance = (x - 16).abs() + (y - 4).abs();
            if distance == radius || distance == radius - 1 {
                pixels.push((x, y));
            }
        }
    }
    pixels
}

fn core_dot(radius: i32) -> Vec<(i32, i32)> {
    match radius {
        1 => vec![(16, 4)],
        2 | 3 => vec![(16, 4), (15, 4), (17, 4), (16, 3), (16, 5)],
        _ => Vec::new(),
    }
}

fn pulse_frames() -> Vec<Frame> {
    let expand = (1..=PULSE_RADIUS).map(|radius| Frame::pixels(ring(radius), PULSE_HOLD_MS));
    let contract = (1..=PULSE_RADIUS)
        .rev()
        .map(|radius| Frame::pixels(core_dot(radius), PULSE_HOLD_MS));
    expand.chain(contract).collect()
}

fn error_frames() -> Vec<Frame> {
    (0..ERROR_BLINKS)
        .flat_map(|_| {
            [
                Frame::fill(true, ERROR_HOLD_MS),
                Frame::fill(false, ERROR_HOLD_MS),
            ]
        })
        .collect()
}

pub struct AnimationPlayer {
    arbiter: DisplayArbiter,
}

impl AnimationPlayer {
    pub fn new(arbiter: DisplayArbiter) -> Self {
        Self { arbiter }
    }

    pub fn play<P: Panel, D: DelayNs, S: SettingsStore>(
        &self,
        animation: Animation,
        matrix: &mut LedMatrix<P, D>,
        scheduler: &BrightnessScheduler<S>,
        hour: u8,
    ) -> bool {
        let Some(guard) = self.arbiter.try_acquire() else {
            info!(animation = animation.name(), "display busy, skipping animation");
            return false;
        };

        info!(animation = animation.name(), "playing animation");
        for frame in animation.frames() {
            frame.draw(matrix);
            matrix.write();
            matrix.hold(frame.hold_ms);
        }
        drop(guard);

        scheduler.apply_if_idle(matrix, hour);
        true
    }
}
