use core::convert::Infallible;
use std::fmt;

use embedded_graphics::{
    mono_font::{ascii::FONT_5X7, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use embedded_hal::delay::DelayNs;

pub const MODULE_SIZE: usize = 8;
pub const FONT_WIDTH: i32 = 5;
pub const SPACER: i32 = 1;
pub const CHAR_WIDTH: i32 = FONT_WIDTH + SPACER;
pub const GLYPH_HEIGHT: i32 = 8;
pub const MAX_INTENSITY: u8 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn for_panels(horizontal: usize, vertical: usize) -> Self {
        Self::new(horizontal * MODULE_SIZE, vertical * MODULE_SIZE)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if let Some(index) = self.index(x, y) {
            self.pixels[index] = on;
        }
    }

    pub fn is_lit(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map(|index| self.pixels[index])
            .unwrap_or(false)
    }

    pub fn fill(&mut self, on: bool) {
        self.pixels.fill(on);
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|lit| **lit).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_index, row) in self.pixels.chunks(self.width.max(1)).enumerate() {
            if row_index > 0 {
                writeln!(f)?;
            }
            for lit in row {
                f.write_str(if *lit { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}

pub trait Panel {
    fn write(&mut self, frame: &FrameBuffer);

    fn set_intensity(&mut self, level: u8);
}

/// Frame buffer bound to a panel and to the delay used for frame holds.
///
/// All drawing happens in the buffer; nothing reaches the panel until
/// [`LedMatrix::write`] is called. Intensity changes are forwarded
/// immediately.
pub struct LedMatrix<P, D> {
    frame: FrameBuffer,
    panel: P,
    delay: D,
    intensity: u8,
}

impl<P: Panel, D: DelayNs> LedMatrix<P, D> {
    pub fn new(frame: FrameBuffer, panel: P, delay: D) -> Self {
        Self {
            frame,
            panel,
            delay,
            intensity: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.frame.width() as i32
    }

    pub fn height(&self) -> i32 {
        self.frame.height() as i32
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn fill_screen(&mut self, on: bool) {
        self.frame.fill(on);
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        self.frame.set(x, y, on);
    }

    pub fn draw_char(&mut self, x: i32, y: i32, ch: char) {
        let mut encoded = [0u8; 4];
        let glyph = ch.encode_utf8(&mut encoded);
        let style = MonoTextStyle::new(&FONT_5X7, BinaryColor::On);
        let _ = Text::with_baseline(glyph, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.frame);
    }

    pub fn print(&mut self, x: i32, y: i32, text: &str) {
        let mut cursor = x;
        for ch in text.chars() {
            self.draw_char(cursor, y, ch);
            cursor += CHAR_WIDTH;
        }
    }

    pub fn set_intensity(&mut self, level: u8) {
        let level = level.min(MAX_INTENSITY);
        self.intensity = level;
        self.panel.set_intensity(level);
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn write(&mut self) {
        self.panel.write(&self.frame);
    }

    pub fn hold(&mut self, ms: u32) {
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }
}
