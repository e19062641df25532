#![cfg_attr(not(test), no_std)]

//! ST7789V2 (1.14" 135x240 IPS LCD) driver primitives.

pub mod protocol;

#[cfg(feature = "embedded-graphics")]
mod graphics;

#[cfg(test)]
mod tests;

use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    spi::{Operation, SpiDevice},
};

pub use protocol::Orientation;

/// Pixels buffered per SPI write when streaming.
const CHUNK_PIXELS: usize = 64;

/// Driver configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    orientation: Orientation,
    reset_pulse_us: u32,
    reset_settle_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            reset_pulse_us: 20,
            reset_settle_ms: 120,
        }
    }
}

impl Config {
    pub const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub const fn with_reset_pulse_us(mut self, reset_pulse_us: u32) -> Self {
        self.reset_pulse_us = reset_pulse_us;
        self
    }

    pub const fn with_reset_settle_ms(mut self, reset_settle_ms: u32) -> Self {
        self.reset_settle_ms = reset_settle_ms;
        self
    }

    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<SpiErr, DcErr, RstErr> {
    /// SPI transaction failed.
    Spi(SpiErr),
    /// Data/command pin operation failed.
    Dc(DcErr),
    /// Reset pin operation failed.
    Rst(RstErr),
    /// Rectangle outside the visible area.
    InvalidInput,
}

pub type DriverResult<SpiErr, DcErr, RstErr> = Result<(), Error<SpiErr, DcErr, RstErr>>;

/// ST7789 driver.
#[derive(Debug)]
pub struct St7789<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: RST,
    config: Config,
}

impl<SPI, DC, RST> St7789<SPI, DC, RST>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, config: Config) -> Self {
        Self {
            spi,
            dc,
            rst,
            config,
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Visible `(width, height)` in the configured orientation.
    pub fn size(&self) -> (u16, u16) {
        self.config.orientation.size()
    }

    /// Releases owned bus and pins.
    pub fn release(self) -> (SPI, DC, RST) {
        (self.spi, self.dc, self.rst)
    }

    /// Hardware reset, power-up sequence and display on.
    pub fn init<D>(&mut self, delay: &mut D) -> DriverResult<SPI::Error, DC::Error, RST::Error>
    where
        D: DelayNs,
    {
        self.rst.set_high().map_err(Error::Rst)?;
        delay.delay_us(self.config.reset_pulse_us);
        self.rst.set_low().map_err(Error::Rst)?;
        delay.delay_us(self.config.reset_pulse_us);
        self.rst.set_high().map_err(Error::Rst)?;
        delay.delay_ms(self.config.reset_settle_ms);

        for step in protocol::INIT_SEQUENCE {
            self.command(step.command, step.args)?;
            delay.delay_ms(step.delay_ms);
        }

        self.command(protocol::MADCTL, &[self.config.orientation.madctl()])?;

        let step = protocol::DISPLAY_ON;
        self.command(step.command, step.args)?;
        delay.delay_ms(step.delay_ms);
        Ok(())
    }

    /// Sends one command followed by its argument bytes.
    pub fn command(
        &mut self,
        command: u8,
        args: &[u8],
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.dc.set_low().map_err(Error::Dc)?;
        self.spi.write(&[command]).map_err(Error::Spi)?;

        if !args.is_empty() {
            self.dc.set_high().map_err(Error::Dc)?;
            self.spi.write(args).map_err(Error::Spi)?;
        }

        Ok(())
    }

    /// Selects the RAM window for the next pixel stream.
    pub fn set_window(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        let (cols, rows) = protocol::window(self.config.orientation, x, y, width, height)
            .ok_or(Error::InvalidInput)?;

        self.command(protocol::CASET, &cols)?;
        self.command(protocol::RASET, &rows)?;
        self.command(protocol::RAMWR, &[])
    }

    /// Writes `width * height` pixels into the given window, row-major.
    ///
    /// Missing pixels are left untouched; extra pixels are ignored.
    pub fn write_pixels<I>(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: I,
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error>
    where
        I: IntoIterator<Item = u16>,
    {
        self.set_window(x, y, width, height)?;
        self.dc.set_high().map_err(Error::Dc)?;

        let total = width as usize * height as usize;
        let mut chunk = [0u8; CHUNK_PIXELS * 2];
        let mut filled = 0;

        for pixel in pixels.into_iter().take(total) {
            chunk[filled..filled + 2].copy_from_slice(&pixel.to_be_bytes());
            filled += 2;
            if filled == chunk.len() {
                self.spi.write(&chunk).map_err(Error::Spi)?;
                filled = 0;
            }
        }

        if filled > 0 {
            self.spi.write(&chunk[..filled]).map_err(Error::Spi)?;
        }

        Ok(())
    }

    /// Fills a rectangle with one RGB565 color.
    pub fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: u16,
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.set_window(x, y, width, height)?;
        self.dc.set_high().map_err(Error::Dc)?;

        let mut chunk = [0u8; CHUNK_PIXELS * 2];
        for pair in chunk.chunks_exact_mut(2) {
            pair.copy_from_slice(&color.to_be_bytes());
        }

        let mut remaining = width as usize * height as usize;
        while remaining > 0 {
            let count = remaining.min(CHUNK_PIXELS);
            let mut ops = [Operation::Write(&chunk[..count * 2])];
            self.spi.transaction(&mut ops).map_err(Error::Spi)?;
            remaining -= count;
        }

        Ok(())
    }

    /// Fills the whole visible area.
    pub fn clear(&mut self, color: u16) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        let (width, height) = self.size();
        self.fill_rect(0, 0, width, height, color)
    }
}
