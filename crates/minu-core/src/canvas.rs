//! Display primitives consumed by the render scheduler and the worker.

use core::fmt;

/// RGB565 color.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);
    pub const RED: Self = Self(0xF800);
    pub const GREEN: Self = Self(0x07E0);
    pub const GREY: Self = Self(0x5AEB);

    pub const fn raw(self) -> u16 {
        self.0
    }
}

pub const FOREGROUND_DEFAULT: Color = Color::WHITE;
pub const BACKGROUND_DEFAULT: Color = Color::BLACK;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Cursor-based text canvas.
///
/// Implementations keep a text cursor that `print` advances; a `'\n'` moves
/// it to the start of the next text line.
pub trait Canvas {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn cursor(&self) -> Point;
    fn set_cursor(&mut self, x: i32, y: i32);

    fn text_size(&self) -> u8;
    fn set_text_size(&mut self, size: u8);
    fn set_text_color(&mut self, foreground: Color, background: Color);

    /// Pixel width of one glyph at the current text size.
    fn char_width(&self) -> i32;
    /// Pixel height of one text line at the current text size.
    fn line_height(&self) -> i32;

    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color);
    fn clear(&mut self, color: Color);
    fn print(&mut self, text: &str);
}

/// `fmt::Write` adapter so `write!` can target a canvas.
pub struct CanvasWriter<'a, C: ?Sized>(pub &'a mut C);

impl<C: Canvas + ?Sized> fmt::Write for CanvasWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.print(s);
        Ok(())
    }
}

pub fn print_fmt<C: Canvas + ?Sized>(canvas: &mut C, args: fmt::Arguments<'_>) {
    let _ = fmt::Write::write_fmt(&mut CanvasWriter(canvas), args);
}
