use embassy_time::Timer;
use log::{info, warn};

use super::{AP_SETTLE_MS, FobAction, FobPage, FobPages, WifiControl, WifiMode};
use crate::{
    menu::PageItem,
    scan::{SCAN_SETTLE_MS, WifiScanner, run_scan},
    ui::{ItemActions, UiContext},
};

/// Item actions of the fob menu.
pub struct FobActions<W> {
    wifi: W,
    pages: FobPages,
    scan_settle_ms: u64,
    ap_settle_ms: u64,
}

impl<W> FobActions<W> {
    pub const fn new(wifi: W, pages: FobPages) -> Self {
        Self {
            wifi,
            pages,
            scan_settle_ms: SCAN_SETTLE_MS,
            ap_settle_ms: AP_SETTLE_MS,
        }
    }

    pub const fn with_scan_settle_ms(mut self, settle_ms: u64) -> Self {
        self.scan_settle_ms = settle_ms;
        self
    }

    pub const fn with_ap_settle_ms(mut self, settle_ms: u64) -> Self {
        self.ap_settle_ms = settle_ms;
        self
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut W {
        &mut self.wifi
    }

    async fn go_to<A, C>(&self, page: FobPage, ui: &UiContext<'_, A, C>) {
        if let Err(err) = ui.go_to_page(self.pages.id(page)).await {
            warn!("ui: cannot open {:?}: {:?}", page, err);
        }
    }
}

impl<W, C> ItemActions<FobAction, C> for FobActions<W>
where
    W: WifiControl + WifiScanner,
{
    async fn invoke(
        &mut self,
        action: FobAction,
        _item: &PageItem<FobAction>,
        ui: &UiContext<'_, FobAction, C>,
    ) {
        match action {
            FobAction::GoTo(page) => self.go_to(page, ui).await,
            FobAction::ConnectStation => {
                let status = self.wifi.snapshot();
                if status.mode == WifiMode::Station && status.connected {
                    self.go_to(FobPage::Home, ui).await;
                } else if status.mode != WifiMode::Station {
                    info!("wifi: connecting station");
                    self.wifi.connect_station().await;
                }
            }
            FobAction::StartAccessPoint => {
                if self.wifi.snapshot().mode != WifiMode::AccessPoint {
                    info!("wifi: starting soft-AP");
                    self.wifi.start_access_point().await;
                }
                Timer::after_millis(self.ap_settle_ms).await;
                self.go_to(FobPage::Wifi, ui).await;
            }
            FobAction::Scan => {
                let back = FobAction::GoTo(FobPage::Wifi);
                if let Err(err) = run_scan(
                    ui,
                    &mut self.wifi,
                    self.pages.scan_results,
                    back,
                    self.scan_settle_ms,
                )
                .await
                {
                    warn!("scan: aborted: {:?}", err);
                }
            }
            FobAction::WifiIndicator => {}
        }
    }
}
