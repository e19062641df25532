use esp_hal::{
    Blocking,
    analog::adc::{Adc, AdcPin},
    gpio::Output,
    peripherals::{ADC1, GPIO38},
};
use log::warn;

use minu_core::worker::battery_percent;

// The battery sense pin sits behind a 1:2 divider.
const BATTERY_DIVIDER: u32 = 2;
const ADC_FULL_SCALE_MV: u32 = 3_300;
const ADC_MAX_RAW: u32 = 4_095;

/// Keeps the board powered after the power button is released.
pub(super) struct PowerHold {
    _pin: Output<'static>,
}

impl PowerHold {
    pub(super) fn engage(pin: Output<'static>) -> Self {
        Self { _pin: pin }
    }
}

pub(super) struct Battery {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO38<'static>, ADC1<'static>>,
    last_pct: u8,
}

impl Battery {
    pub(super) fn new(
        adc: Adc<'static, ADC1<'static>, Blocking>,
        pin: AdcPin<GPIO38<'static>, ADC1<'static>>,
    ) -> Self {
        Self {
            adc,
            pin,
            last_pct: 0,
        }
    }

    pub(super) fn millivolts(&mut self) -> Option<u32> {
        let raw = nb::block!(self.adc.read_oneshot(&mut self.pin)).ok()?;
        Some(raw as u32 * ADC_FULL_SCALE_MV / ADC_MAX_RAW * BATTERY_DIVIDER)
    }

    /// Charge estimate; repeats the previous value when the ADC read fails.
    pub(super) fn percent(&mut self) -> u8 {
        match self.millivolts() {
            Some(mv) => self.last_pct = battery_percent(mv),
            None => warn!("battery: adc read failed"),
        }
        self.last_pct
    }
}
