use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use embedded_hal::delay::DelayNs;

use crate::matrix::{LedMatrix, Panel, CHAR_WIDTH, GLYPH_HEIGHT, SPACER};

/// Request to restart the scroll currently in progress from its first step.
///
/// May be raised from any thread; the scroll loop consumes it at the top of
/// its next step. A request raised while no scroll runs restarts the next one
/// at step 0, which is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ScrollRestart {
    requested: Arc<AtomicBool>,
}

impl ScrollRestart {
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }
}

pub fn scroll_steps(len: usize, width: i32) -> usize {
    let steps = CHAR_WIDTH * len as i32 + width - 1 - SPACER;
    usize::try_from(steps).unwrap_or(0)
}

pub fn center_offset(len: usize, width: i32) -> i32 {
    (width - len as i32 * CHAR_WIDTH) / 2
}

pub fn visible_glyphs(step: usize, len: usize, width: i32) -> Vec<(usize, i32)> {
    let step = step as i32;
    let mut letter = step / CHAR_WIDTH;
    let mut x = (width - 1) - step % CHAR_WIDTH;
    let mut glyphs = Vec::new();

    while x + CHAR_WIDTH - SPACER >= 0 && letter >= 0 {
        if (letter as usize) < len {
            glyphs.push((letter as usize, x));
        }
        letter -= 1;
        x -= CHAR_WIDTH;
    }

    glyphs
}

#[derive(Debug, Clone)]
pub struct ScrollPass {
    step: usize,
    total: usize,
    restart: Option<ScrollRestart>,
}

impl ScrollPass {
    pub fn new(len: usize, width: i32) -> Self {
        Self {
            step: 0,
            total: scroll_steps(len, width),
            restart: None,
        }
    }

    pub fn with_restart(mut self, restart: ScrollRestart) -> Self {
        self.restart = Some(restart);
        self
    }

    pub fn restart(&mut self) {
        self.step = 0;
    }
}

impl Iterator for ScrollPass {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.step >= self.total {
            return None;
        }
        if self.restart.as_ref().is_some_and(ScrollRestart::take) {
            self.restart();
        }

        let step = self.step;
        self.step += 1;
        Some(step)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScrollRenderer {
    restart: ScrollRestart,
}

impl ScrollRenderer {
    pub fn new(restart: ScrollRestart) -> Self {
        Self { restart }
    }

    pub fn restart_handle(&self) -> ScrollRestart {
        self.restart.clone()
    }

    pub fn render_scroll<P: Panel, D: DelayNs>(
        &self,
        matrix: &mut LedMatrix<P, D>,
        text: &str,
        speed_ms: u32,
    ) -> usize {
        let glyphs: Vec<char> = text.chars().chain(std::iter::once(' ')).collect();
        let width = matrix.width();
        let y = (matrix.height() - GLYPH_HEIGHT) / 2;

        let mut frames = 0;
        for step in ScrollPass::new(glyphs.len(), width).with_restart(self.restart.clone()) {
            matrix.fill_screen(false);
            for (index, x) in visible_glyphs(step, glyphs.len(), width) {
                matrix.draw_char(x, y, glyphs[index]);
            }
            matrix.write();
            matrix.hold(speed_ms);
            frames += 1;
        }

        frames
    }

    pub fn render_static<P: Panel, D: DelayNs>(&self, matrix: &mut LedMatrix<P, D>, text: &str) {
        let x = center_offset(text.chars().count(), matrix.width());
        matrix.print(x, 0, text);
        matrix.write();
    }
}
