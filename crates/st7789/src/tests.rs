use std::{cell::RefCell, convert::Infallible, rc::Rc};

#[cfg(feature = "embedded-graphics")]
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{Point, Size},
    pixelcolor::{Rgb565, RgbColor},
    primitives::Rectangle,
};
use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType as PinErrorType, OutputPin},
    spi::{ErrorType as SpiErrorType, Operation, SpiDevice},
};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Wire {
    Command(u8),
    Data(Vec<u8>),
    Reset(bool),
}

type WireLog = Rc<RefCell<Vec<Wire>>>;

struct FakeSpi {
    log: WireLog,
    dc_high: Rc<RefCell<bool>>,
}

impl SpiErrorType for FakeSpi {
    type Error = Infallible;
}

impl SpiDevice<u8> for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        for op in operations {
            if let Operation::Write(bytes) = op {
                let mut log = self.log.borrow_mut();
                if *self.dc_high.borrow() {
                    match log.last_mut() {
                        Some(Wire::Data(data)) => data.extend_from_slice(bytes),
                        _ => log.push(Wire::Data(bytes.to_vec())),
                    }
                } else {
                    log.extend(bytes.iter().map(|byte| Wire::Command(*byte)));
                }
            }
        }
        Ok(())
    }
}

struct DcPin(Rc<RefCell<bool>>);

impl PinErrorType for DcPin {
    type Error = Infallible;
}

impl OutputPin for DcPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        *self.0.borrow_mut() = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        *self.0.borrow_mut() = true;
        Ok(())
    }
}

struct RstPin(WireLog);

impl PinErrorType for RstPin {
    type Error = Infallible;
}

impl OutputPin for RstPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(Wire::Reset(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(Wire::Reset(true));
        Ok(())
    }
}

#[derive(Default)]
struct CountingDelay {
    total_ns: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

fn driver(config: Config) -> (St7789<FakeSpi, DcPin, RstPin>, WireLog) {
    let log = WireLog::default();
    let dc = Rc::new(RefCell::new(false));
    let spi = FakeSpi {
        log: log.clone(),
        dc_high: dc.clone(),
    };
    (
        St7789::new(spi, DcPin(dc), RstPin(log.clone()), config),
        log,
    )
}

#[test]
fn init_pulses_reset_then_configures_panel() {
    let (mut lcd, log) = driver(Config::default());
    let mut delay = CountingDelay::default();

    lcd.init(&mut delay).unwrap();

    let log = log.borrow();
    assert_eq!(
        &log[..4],
        &[
            Wire::Reset(true),
            Wire::Reset(false),
            Wire::Reset(true),
            Wire::Command(protocol::SWRESET),
        ]
    );
    assert!(log.windows(2).any(|pair| pair
        == [
            Wire::Command(protocol::MADCTL),
            Wire::Data(vec![Orientation::Landscape.madctl()]),
        ]));
    assert_eq!(log.last(), Some(&Wire::Command(protocol::DISPON)));
    assert!(delay.total_ns >= 120_000_000);
}

#[test]
fn fill_rect_sets_window_and_streams_color() {
    let (mut lcd, log) = driver(Config::default());

    lcd.fill_rect(0, 0, 10, 10, 0xF800).unwrap();

    let log = log.borrow();
    assert_eq!(log[0], Wire::Command(protocol::CASET));
    assert_eq!(log[1], Wire::Data(protocol::encode_range(40, 49).to_vec()));
    assert_eq!(log[2], Wire::Command(protocol::RASET));
    assert_eq!(log[3], Wire::Data(protocol::encode_range(53, 62).to_vec()));
    assert_eq!(log[4], Wire::Command(protocol::RAMWR));

    let Wire::Data(pixels) = &log[5] else {
        panic!("expected pixel data, got {:?}", log[5]);
    };
    assert_eq!(pixels.len(), 200);
    assert!(pixels.chunks_exact(2).all(|pair| pair == [0xF8, 0x00]));
}

#[test]
fn write_pixels_stops_at_window_size() {
    let (mut lcd, log) = driver(Config::default());

    lcd.write_pixels(5, 5, 2, 1, [0x0102, 0x0304, 0x0506]).unwrap();

    let log = log.borrow();
    assert_eq!(log.last(), Some(&Wire::Data(vec![0x01, 0x02, 0x03, 0x04])));
}

#[test]
fn out_of_bounds_rect_is_rejected_before_any_traffic() {
    let (mut lcd, log) = driver(Config::default().with_orientation(Orientation::Portrait));

    assert_eq!(lcd.fill_rect(0, 0, 136, 1, 0), Err(Error::InvalidInput));
    assert!(log.borrow().is_empty());
}

#[cfg(feature = "embedded-graphics")]
#[test]
fn contiguous_fill_past_the_edge_draws_only_visible_pixels() {
    let (mut lcd, log) = driver(Config::default());
    let area = Rectangle::new(Point::new(238, 0), Size::new(4, 1));

    lcd.fill_contiguous(
        &area,
        [Rgb565::RED, Rgb565::BLUE, Rgb565::GREEN, Rgb565::WHITE],
    )
    .unwrap();

    let log = log.borrow();
    let writes = log
        .iter()
        .filter(|wire| **wire == Wire::Command(protocol::RAMWR))
        .count();
    assert_eq!(writes, 2);
    assert_eq!(log[1], Wire::Data(protocol::encode_range(278, 278).to_vec()));
    assert_eq!(log.last(), Some(&Wire::Data(vec![0x00, 0x1F])));
}

#[cfg(feature = "embedded-graphics")]
#[test]
fn contiguous_fill_on_screen_uses_one_window() {
    let (mut lcd, log) = driver(Config::default());
    let area = Rectangle::new(Point::new(0, 0), Size::new(2, 1));

    lcd.fill_contiguous(&area, [Rgb565::RED, Rgb565::BLUE]).unwrap();

    let log = log.borrow();
    assert_eq!(log[1], Wire::Data(protocol::encode_range(40, 41).to_vec()));
    assert_eq!(log.last(), Some(&Wire::Data(vec![0xF8, 0x00, 0x00, 0x1F])));
}
