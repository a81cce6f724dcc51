use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use tracing::info;

use crate::{
    arbiter::DisplayArbiter,
    brightness::{fade, BrightnessScheduler},
    matrix::{LedMatrix, Panel},
    notification::{DisplayRequest, Notification, RenderMode},
    render::ScrollRenderer,
    store::SettingsStore,
};

pub const REPEAT_PAUSE_MS: u32 = 500;
pub const STATIC_HOLD_MS: u32 = 3_000;

pub struct Dispatcher {
    arbiter: DisplayArbiter,
    queue: VecDeque<Notification>,
    default_speed_ms: u16,
}

impl Dispatcher {
    pub fn new(arbiter: DisplayArbiter, default_speed_ms: u16) -> Self {
        Self {
            arbiter,
            queue: VecDeque::new(),
            default_speed_ms,
        }
    }

    pub fn enqueue(&mut self, notification: Notification) {
        info!(
            text = notification.text(),
            queued = self.queue.len() + 1,
            "notification queued"
        );
        self.queue.push_back(notification);
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Runs the oldest queued request to completion if the display is free.
    ///
    /// Blocks for the whole request. Returns whether a request was run.
    pub fn pump_once<P: Panel, D: DelayNs, S: SettingsStore>(
        &mut self,
        matrix: &mut LedMatrix<P, D>,
        renderer: &ScrollRenderer,
        scheduler: &BrightnessScheduler<S>,
        hour: u8,
    ) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let Some(guard) = self.arbiter.try_acquire() else {
            return false;
        };
        let Some(notification) = self.queue.pop_front() else {
            return false;
        };

        info!(
            text = notification.text(),
            remaining = self.queue.len(),
            "showing notification"
        );
        let request = notification.into_request(self.default_speed_ms);
        let restored = execute(matrix, renderer, &request);
        drop(guard);

        // An override already put back the exact intensity it replaced.
        if !restored {
            scheduler.apply_if_idle(matrix, hour);
        }
        true
    }
}

/// Returns whether an override intensity was restored.
fn execute<P: Panel, D: DelayNs>(
    matrix: &mut LedMatrix<P, D>,
    renderer: &ScrollRenderer,
    request: &DisplayRequest,
) -> bool {
    let saved = request.override_brightness.map(|level| {
        let prior = matrix.intensity();
        matrix.set_intensity(level);
        prior
    });

    match request.mode {
        RenderMode::Scroll => {
            let speed_ms = u32::from(request.scroll_speed_ms);
            for pass in 0..request.repeat_count {
                renderer.render_scroll(matrix, &request.text, speed_ms);
                if pass + 1 < request.repeat_count {
                    matrix.hold(REPEAT_PAUSE_MS);
                }
            }
        }
        RenderMode::Static => {
            matrix.fill_screen(false);
            renderer.render_static(matrix, &request.text);
            if request.flash {
                for _ in 0..request.flash_count {
                    fade(matrix);
                }
            } else {
                matrix.hold(STATIC_HOLD_MS);
            }
        }
    }

    if let Some(prior) = saved {
        matrix.set_intensity(prior);
    }
    saved.is_some()
}
