mod buttons;

pub use buttons::{ButtonConfig, ButtonError, GpioButtons};
