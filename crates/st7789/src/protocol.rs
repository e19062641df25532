//! Command set and framing helpers for the ST7789V2 controller.

/// Native panel width (portrait).
pub const PANEL_WIDTH: u16 = 135;
/// Native panel height (portrait).
pub const PANEL_HEIGHT: u16 = 240;

pub const SWRESET: u8 = 0x01;
pub const SLPOUT: u8 = 0x11;
pub const NORON: u8 = 0x13;
pub const INVON: u8 = 0x21;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;

/// `COLMOD` argument for 16-bit RGB565 pixels.
pub const COLMOD_RGB565: u8 = 0x55;

const MADCTL_MY: u8 = 0x80;
const MADCTL_MX: u8 = 0x40;
const MADCTL_MV: u8 = 0x20;

/// One step of the power-up sequence: command, arguments, delay after.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InitStep {
    pub command: u8,
    pub args: &'static [u8],
    pub delay_ms: u32,
}

const fn step(command: u8, args: &'static [u8], delay_ms: u32) -> InitStep {
    InitStep {
        command,
        args,
        delay_ms,
    }
}

/// Power-up sequence run after the hardware reset; `MADCTL` is sent separately.
pub const INIT_SEQUENCE: [InitStep; 5] = [
    step(SWRESET, &[], 150),
    step(SLPOUT, &[], 10),
    step(COLMOD, &[COLMOD_RGB565], 10),
    step(INVON, &[], 10),
    step(NORON, &[], 10),
];

/// Final step that turns the panel on.
pub const DISPLAY_ON: InitStep = step(DISPON, &[], 10);

/// Scan direction of the panel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Orientation {
    pub const fn is_landscape(self) -> bool {
        matches!(self, Self::Landscape | Self::LandscapeFlipped)
    }

    /// `MADCTL` argument for this orientation.
    pub const fn madctl(self) -> u8 {
        match self {
            Self::Portrait => 0x00,
            Self::Landscape => MADCTL_MX | MADCTL_MV,
            Self::PortraitFlipped => MADCTL_MX | MADCTL_MY,
            Self::LandscapeFlipped => MADCTL_MY | MADCTL_MV,
        }
    }

    /// Visible size `(width, height)` in this orientation.
    pub const fn size(self) -> (u16, u16) {
        if self.is_landscape() {
            (PANEL_HEIGHT, PANEL_WIDTH)
        } else {
            (PANEL_WIDTH, PANEL_HEIGHT)
        }
    }

    /// Controller RAM offset `(x, y)` of the visible area.
    ///
    /// The 135x240 glass sits inside the controller's 240x320 RAM.
    pub const fn offset(self) -> (u16, u16) {
        match self {
            Self::Portrait => (52, 40),
            Self::Landscape => (40, 53),
            Self::PortraitFlipped => (53, 40),
            Self::LandscapeFlipped => (40, 52),
        }
    }
}

/// Encodes an inclusive `CASET`/`RASET` range.
#[inline]
pub const fn encode_range(start: u16, end: u16) -> [u8; 4] {
    let start = start.to_be_bytes();
    let end = end.to_be_bytes();
    [start[0], start[1], end[0], end[1]]
}

/// Inclusive controller window for a visible rectangle.
///
/// Returns `None` for an empty rectangle or one reaching past the visible area.
pub fn window(
    orientation: Orientation,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
) -> Option<([u8; 4], [u8; 4])> {
    let (visible_w, visible_h) = orientation.size();
    if width == 0 || height == 0 {
        return None;
    }
    if x.checked_add(width)? > visible_w || y.checked_add(height)? > visible_h {
        return None;
    }

    let (off_x, off_y) = orientation.offset();
    let x0 = x + off_x;
    let y0 = y + off_y;
    Some((
        encode_range(x0, x0 + width - 1),
        encode_range(y0, y0 + height - 1),
    ))
}
