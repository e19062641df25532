//! Button classification and edge-triggered press flags.

mod monitor;

pub use monitor::InputMonitor;

use core::sync::atomic::{AtomicBool, Ordering};

/// Held duration at or above which a release counts as a long press.
pub const LONG_PRESS_THRESHOLD_MS: u64 = 300;
pub const BUTTON_POLL_MS: u64 = 10;
pub const BUTTON_COUNT: usize = 3;

/// Physical buttons. `C` is the side power button.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ButtonId {
    A,
    B,
    C,
}

impl ButtonId {
    pub const ALL: [Self; BUTTON_COUNT] = [Self::A, Self::B, Self::C];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PressKind {
    Short,
    Long,
}

impl PressKind {
    const fn index(self) -> usize {
        match self {
            Self::Short => 0,
            Self::Long => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub kind: PressKind,
    pub timestamp_ms: u64,
}

/// Hardware button sampler.
///
/// `update` takes one sample; the transition queries describe the edges seen
/// between the previous sample and this one. Read failures report no change.
pub trait ButtonInput {
    fn update(&mut self);
    fn was_pressed(&self, button: ButtonId) -> bool;
    fn was_released(&self, button: ButtonId) -> bool;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct InputConfig {
    long_press_threshold_ms: u64,
    poll_interval_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            long_press_threshold_ms: LONG_PRESS_THRESHOLD_MS,
            poll_interval_ms: BUTTON_POLL_MS,
        }
    }
}

impl InputConfig {
    pub const fn with_long_press_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.long_press_threshold_ms = threshold_ms;
        self
    }

    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub const fn long_press_threshold_ms(&self) -> u64 {
        self.long_press_threshold_ms
    }

    pub const fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }
}

/// `held_ms == threshold_ms` classifies as long.
#[inline]
pub const fn classify(held_ms: u64, threshold_ms: u64) -> PressKind {
    if held_ms >= threshold_ms {
        PressKind::Long
    } else {
        PressKind::Short
    }
}

/// Per-button press bookkeeping.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PressState {
    down_ms: Option<u64>,
}

impl PressState {
    pub const fn new() -> Self {
        Self { down_ms: None }
    }

    pub fn on_pressed(&mut self, now_ms: u64) {
        self.down_ms = Some(now_ms);
    }

    /// Classifies the release. A release without a recorded press is ignored.
    pub fn on_released(&mut self, now_ms: u64, threshold_ms: u64) -> Option<PressKind> {
        let down_ms = self.down_ms.take()?;
        Some(classify(now_ms.saturating_sub(down_ms), threshold_ms))
    }

    pub const fn is_down(&self) -> bool {
        self.down_ms.is_some()
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const UNSET: AtomicBool = AtomicBool::new(false);
#[allow(clippy::declare_interior_mutable_const)]
const UNSET_ROW: [AtomicBool; 2] = [UNSET; 2];

/// One pending flag per button and press kind.
///
/// A flag holds at most one unread event; publishing over an unread flag of
/// the same kind drops the new event.
#[derive(Debug)]
pub struct PressFlags {
    flags: [[AtomicBool; 2]; BUTTON_COUNT],
}

impl PressFlags {
    pub const fn new() -> Self {
        Self {
            flags: [UNSET_ROW; BUTTON_COUNT],
        }
    }

    /// Returns `false` when an unread event of the same kind was pending.
    pub fn publish(&self, button: ButtonId, kind: PressKind) -> bool {
        !self.cell(button, kind).swap(true, Ordering::AcqRel)
    }

    /// Consumes the flag, returning whether it was set.
    pub fn take(&self, button: ButtonId, kind: PressKind) -> bool {
        self.cell(button, kind).swap(false, Ordering::AcqRel)
    }

    pub fn pending(&self, button: ButtonId, kind: PressKind) -> bool {
        self.cell(button, kind).load(Ordering::Acquire)
    }

    pub fn any_pending(&self) -> bool {
        self.flags
            .iter()
            .flatten()
            .any(|flag| flag.load(Ordering::Acquire))
    }

    fn cell(&self, button: ButtonId, kind: PressKind) -> &AtomicBool {
        &self.flags[button.index()][kind.index()]
    }
}

impl Default for PressFlags {
    fn default() -> Self {
        Self::new()
    }
}
