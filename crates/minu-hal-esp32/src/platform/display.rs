use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyleBuilder,
        ascii::{FONT_6X10, FONT_9X15, FONT_10X20},
    },
    pixelcolor::{Rgb565, raw::RawU16},
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
};
use log::warn;

use minu_core::canvas::{
    BACKGROUND_DEFAULT, Canvas, Color, FOREGROUND_DEFAULT, Point as CanvasPoint,
};

/// Glyph set used for a text size.
pub fn font_for_size(size: u8) -> &'static MonoFont<'static> {
    match size {
        0 | 1 => &FONT_6X10,
        2 => &FONT_9X15,
        _ => &FONT_10X20,
    }
}

#[inline]
fn rgb(color: Color) -> Rgb565 {
    Rgb565::from(RawU16::new(color.raw()))
}

/// Cursor-based text canvas over any RGB565 draw target.
///
/// Text wraps at the right edge like a terminal; `'\n'` returns to column 0.
#[derive(Debug)]
pub struct LcdCanvas<D> {
    target: D,
    cursor: CanvasPoint,
    text_size: u8,
    foreground: Color,
    background: Color,
    draw_failed: bool,
}

impl<D> LcdCanvas<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            cursor: CanvasPoint::new(0, 0),
            text_size: 1,
            foreground: FOREGROUND_DEFAULT,
            background: BACKGROUND_DEFAULT,
            draw_failed: false,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn release(self) -> D {
        self.target
    }

    fn font(&self) -> &'static MonoFont<'static> {
        font_for_size(self.text_size)
    }

    fn report<E>(&mut self, outcome: Result<(), E>) {
        match outcome {
            Ok(()) => self.draw_failed = false,
            Err(_) if !self.draw_failed => {
                self.draw_failed = true;
                warn!("lcd: draw failed");
            }
            Err(_) => {}
        }
    }

    fn newline(&mut self) {
        self.cursor.x = 0;
        self.cursor.y += self.line_height();
    }

    fn draw_run(&mut self, run: &str) {
        let style = MonoTextStyleBuilder::new()
            .font(self.font())
            .text_color(rgb(self.foreground))
            .background_color(rgb(self.background))
            .build();
        let origin = Point::new(self.cursor.x, self.cursor.y);

        let outcome = Text::with_baseline(run, origin, style, Baseline::Top)
            .draw(&mut self.target)
            .map(|_| ());
        self.report(outcome);
        self.cursor.x += self.char_width() * run.chars().count() as i32;
    }
}

impl<D> Canvas for LcdCanvas<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    fn width(&self) -> i32 {
        self.target.size().width as i32
    }

    fn height(&self) -> i32 {
        self.target.size().height as i32
    }

    fn cursor(&self) -> CanvasPoint {
        self.cursor
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = CanvasPoint::new(x, y);
    }

    fn text_size(&self) -> u8 {
        self.text_size
    }

    fn set_text_size(&mut self, size: u8) {
        self.text_size = size.max(1);
    }

    fn set_text_color(&mut self, foreground: Color, background: Color) {
        self.foreground = foreground;
        self.background = background;
    }

    fn char_width(&self) -> i32 {
        let font = self.font();
        (font.character_size.width + font.character_spacing) as i32
    }

    fn line_height(&self) -> i32 {
        self.font().character_size.height as i32
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        if width <= 0 || height <= 0 {
            return;
        }
        let area = Rectangle::new(Point::new(x, y), Size::new(width as u32, height as u32));
        let outcome = self.target.fill_solid(&area, rgb(color));
        self.report(outcome);
    }

    fn clear(&mut self, color: Color) {
        let outcome = self.target.clear(rgb(color));
        self.report(outcome);
    }

    fn print(&mut self, text: &str) {
        let char_width = self.char_width().max(1);
        let width = self.width();

        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.newline();
            }

            let mut rest = line;
            while !rest.is_empty() {
                let room = ((width - self.cursor.x) / char_width).max(0) as usize;
                if room == 0 {
                    self.newline();
                    continue;
                }

                let split = rest
                    .char_indices()
                    .nth(room)
                    .map_or(rest.len(), |(at, _)| at);
                let (run, tail) = rest.split_at(split);
                self.draw_run(run);
                rest = tail;
            }
        }
    }
}
