mod display;

pub use display::{LcdCanvas, font_for_size};
