use embedded_hal::digital::InputPin;
use log::warn;

use minu_core::input::{BUTTON_COUNT, ButtonId, ButtonInput};

#[derive(Debug, Clone, Copy)]
pub struct ButtonConfig {
    active_low: bool,
    debounce_polls: u8,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            debounce_polls: 2,
        }
    }
}

impl ButtonConfig {
    pub const fn with_active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub const fn with_debounce_polls(mut self, debounce_polls: u8) -> Self {
        self.debounce_polls = debounce_polls;
        self
    }
}

#[derive(Debug)]
pub enum ButtonError<AErr, BErr, CErr> {
    A(AErr),
    B(BErr),
    C(CErr),
}

type ButtonResult<AErr, BErr, CErr, T> = Result<T, ButtonError<AErr, BErr, CErr>>;

#[derive(Debug, Clone, Copy, Default)]
struct Debounced {
    raw: bool,
    stable: bool,
    stable_count: u8,
    pressed_edge: bool,
    released_edge: bool,
}

impl Debounced {
    fn new(pressed: bool) -> Self {
        Self {
            raw: pressed,
            stable: pressed,
            ..Self::default()
        }
    }

    fn sample(&mut self, pressed: bool, debounce_polls: u8) {
        self.pressed_edge = false;
        self.released_edge = false;

        if pressed == self.raw {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            self.raw = pressed;
            self.stable_count = 0;
        }

        if self.stable_count >= debounce_polls.max(1) && self.stable != self.raw {
            self.stable = self.raw;
            self.pressed_edge = self.stable;
            self.released_edge = !self.stable;
        }
    }

    fn hold(&mut self) {
        self.pressed_edge = false;
        self.released_edge = false;
    }
}

/// The three front/side buttons sampled as debounced GPIO inputs.
#[derive(Debug)]
pub struct GpioButtons<A, B, C> {
    a: A,
    b: B,
    c: C,
    config: ButtonConfig,
    states: [Debounced; BUTTON_COUNT],
}

impl<A, B, C> GpioButtons<A, B, C>
where
    A: InputPin,
    B: InputPin,
    C: InputPin,
{
    /// Samples the initial levels so a button held at boot does not count
    /// as a press.
    pub fn new(
        mut a: A,
        mut b: B,
        mut c: C,
        config: ButtonConfig,
    ) -> ButtonResult<A::Error, B::Error, C::Error, Self> {
        let a_high = a.is_high().map_err(ButtonError::A)?;
        let b_high = b.is_high().map_err(ButtonError::B)?;
        let c_high = c.is_high().map_err(ButtonError::C)?;

        let pressed = |high| pressed_from_level(high, config.active_low);

        Ok(Self {
            a,
            b,
            c,
            config,
            states: [
                Debounced::new(pressed(a_high)),
                Debounced::new(pressed(b_high)),
                Debounced::new(pressed(c_high)),
            ],
        })
    }

    /// Samples all three pins once.
    pub fn poll(&mut self) -> ButtonResult<A::Error, B::Error, C::Error, ()> {
        for state in &mut self.states {
            state.hold();
        }

        let a_high = self.a.is_high().map_err(ButtonError::A)?;
        let b_high = self.b.is_high().map_err(ButtonError::B)?;
        let c_high = self.c.is_high().map_err(ButtonError::C)?;

        let polls = self.config.debounce_polls;
        let active_low = self.config.active_low;
        for (state, high) in self.states.iter_mut().zip([a_high, b_high, c_high]) {
            state.sample(pressed_from_level(high, active_low), polls);
        }

        Ok(())
    }

    pub fn is_down(&self, button: ButtonId) -> bool {
        self.state(button).stable
    }

    fn state(&self, button: ButtonId) -> &Debounced {
        let index = match button {
            ButtonId::A => 0,
            ButtonId::B => 1,
            ButtonId::C => 2,
        };
        &self.states[index]
    }
}

impl<A, B, C> ButtonInput for GpioButtons<A, B, C>
where
    A: InputPin,
    B: InputPin,
    C: InputPin,
{
    fn update(&mut self) {
        if self.poll().is_err() {
            warn!("buttons: pin read failed, sample skipped");
        }
    }

    fn was_pressed(&self, button: ButtonId) -> bool {
        self.state(button).pressed_edge
    }

    fn was_released(&self, button: ButtonId) -> bool {
        self.state(button).released_edge
    }
}

#[inline]
fn pressed_from_level(high: bool, active_low: bool) -> bool {
    if active_low { !high } else { high }
}
