//! Startup result and the fail-stop halt loop.

use embassy_time::Timer;
use log::error;

use crate::menu::MenuError;

pub const HALT_REPORT_INTERVAL_MS: u64 = 1_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InitError {
    PageRegistration(MenuError),
}

impl From<MenuError> for InitError {
    fn from(err: MenuError) -> Self {
        Self::PageRegistration(err)
    }
}

/// Never returns; reports `err` once per interval.
pub async fn halt(err: InitError) -> ! {
    loop {
        error!("failed to init menu: {:?}", err);
        Timer::after_millis(HALT_REPORT_INTERVAL_MS).await;
    }
}
