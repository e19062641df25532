//! Wi-Fi scan sequence driving the scan results page.

use core::fmt::Write;

use embassy_time::Timer;
use heapless::{String, Vec};
use log::{info, warn};

use crate::{
    menu::{MenuError, PageId},
    ui::UiContext,
};

pub const MAX_SCAN_RESULTS: usize = 12;
pub const SCAN_SETTLE_MS: u64 = 3_000;
pub const SSID_LEN: usize = 32;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScannedNetwork {
    pub ssid: String<SSID_LEN>,
    pub rssi: i8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanError {
    Radio,
    Menu(MenuError),
}

impl From<MenuError> for ScanError {
    fn from(err: MenuError) -> Self {
        Self::Menu(err)
    }
}

#[allow(async_fn_in_trait)]
pub trait WifiScanner {
    /// Fills `out` with visible networks. Results beyond capacity are dropped.
    async fn scan(
        &mut self,
        out: &mut Vec<ScannedNetwork, MAX_SCAN_RESULTS>,
    ) -> Result<(), ScanError>;
}

/// Opens `results_page`, scans, lists the networks found and finally
/// appends a back item bound to `back_action`.
///
/// A radio failure is shown on the page; only menu failures are returned.
pub async fn run_scan<A, C, W>(
    ui: &UiContext<'_, A, C>,
    scanner: &mut W,
    results_page: PageId,
    back_action: A,
    settle_ms: u64,
) -> Result<usize, ScanError>
where
    W: WifiScanner,
{
    ui.go_to_page(results_page).await?;
    ui.shared()
        .menu
        .lock()
        .await
        .page_mut(results_page)?
        .set_footer("Scanning...");
    ui.render_and_wait().await;

    let mut networks = Vec::new();
    let outcome = scanner.scan(&mut networks).await;

    let found = {
        let mut menu = ui.shared().menu.lock().await;
        let page = menu.page_mut(results_page)?;
        match outcome {
            Ok(()) if networks.is_empty() => {
                page.set_footer("Scan done. 0 found.");
                0
            }
            Ok(()) => {
                let mut footer: String<32> = String::new();
                let _ = write!(footer, "Scan done. {} found", networks.len());
                page.set_footer(&footer);
                for network in &networks {
                    let mut rssi: String<8> = String::new();
                    let _ = write!(rssi, "{}", network.rssi);
                    page.add_item(None, &network.ssid, &rssi, None)?;
                }
                networks.len()
            }
            Err(err) => {
                warn!("scan: failed: {:?}", err);
                page.set_footer("Scan error!");
                0
            }
        }
    };
    info!("scan: {} networks found", found);
    ui.request_render();

    Timer::after_millis(settle_ms).await;

    ui.shared()
        .menu
        .lock()
        .await
        .page_mut(results_page)?
        .add_item(Some(back_action), "<--", "", None)?;
    ui.render_and_wait().await;

    Ok(found)
}
