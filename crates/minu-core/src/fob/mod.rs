//! The fob's page graph: pages, item actions and Wi-Fi status decoration.

mod actions;
mod hooks;


pub use actions::FobActions;
pub use hooks::FobRenderHooks;

use core::net::Ipv4Addr;

use crate::{
    boot::InitError,
    menu::{LifecycleHook, Menu, Page, PageId},
    probe::PingTarget,
    worker::WorkKind,
};

pub const FOB_NAME_DEFAULT: &str = "MinuFob";
pub const STA_SSID_DEFAULT: &str = "ssid";
pub const AP_SSID_DEFAULT: &str = "MinuFob";
/// Delay after bringing the soft-AP up before returning to the Wi-Fi page.
pub const AP_SETTLE_MS: u64 = 1_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FobPage {
    Home,
    Wifi,
    ScanResults,
    PingTargets,
    Time,
    DeviceInfo,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FobAction {
    GoTo(FobPage),
    ConnectStation,
    StartAccessPoint,
    Scan,
    /// Render token: recolors the Wi-Fi indicator on the home page.
    WifiIndicator,
}

/// Page ids assigned at registration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FobPages {
    pub home: PageId,
    pub wifi: PageId,
    pub scan_results: PageId,
    pub ping_targets: PageId,
    pub time: PageId,
    pub device_info: PageId,
    /// Index of the back item on the Wi-Fi page; highlighting it shows status.
    pub wifi_status_item: usize,
}

impl FobPages {
    pub const fn id(&self, page: FobPage) -> PageId {
        match page {
            FobPage::Home => self.home,
            FobPage::Wifi => self.wifi,
            FobPage::ScanResults => self.scan_results,
            FobPage::PingTargets => self.ping_targets,
            FobPage::Time => self.time,
            FobPage::DeviceInfo => self.device_info,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WifiMode {
    Off,
    Station,
    AccessPoint,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiSnapshot {
    pub mode: WifiMode,
    /// Station associated with an address; always `false` in AP mode.
    pub connected: bool,
    pub ip: Option<Ipv4Addr>,
}

impl WifiSnapshot {
    pub const OFF: Self = Self {
        mode: WifiMode::Off,
        connected: false,
        ip: None,
    };

    /// Whether the indicator should show the link as up.
    pub const fn is_up(&self) -> bool {
        matches!(self.mode, WifiMode::AccessPoint)
            || (matches!(self.mode, WifiMode::Station) && self.connected)
    }
}

/// Read side of the radio state.
pub trait WifiStatusSource {
    fn snapshot(&self) -> WifiSnapshot;
}

impl<T: WifiStatusSource + ?Sized> WifiStatusSource for &T {
    fn snapshot(&self) -> WifiSnapshot {
        (**self).snapshot()
    }
}

/// Radio control used by item actions.
#[allow(async_fn_in_trait)]
pub trait WifiControl: WifiStatusSource {
    /// Begins joining the configured network. Returns once the request has
    /// been handed to the radio.
    async fn connect_station(&mut self);
    async fn start_access_point(&mut self);
}

/// Names shown on screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FobConfig {
    pub name: &'static str,
    pub sta_ssid: &'static str,
    pub ap_ssid: &'static str,
}

impl Default for FobConfig {
    fn default() -> Self {
        Self {
            name: FOB_NAME_DEFAULT,
            sta_ssid: STA_SSID_DEFAULT,
            ap_ssid: AP_SSID_DEFAULT,
        }
    }
}

impl FobConfig {
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub const fn with_sta_ssid(mut self, ssid: &'static str) -> Self {
        self.sta_ssid = ssid;
        self
    }

    pub const fn with_ap_ssid(mut self, ssid: &'static str) -> Self {
        self.ap_ssid = ssid;
        self
    }
}

/// Registers every page of the fob. Home is registered first and is the
/// current page afterwards.
pub fn build_menu(targets: &[PingTarget]) -> Result<(Menu<FobAction>, FobPages), InitError> {
    use FobAction::GoTo;

    let mut menu = Menu::new();

    let mut home = Page::new("HOMEPAGE");
    home.add_item(
        Some(GoTo(FobPage::Wifi)),
        "Wi-Fi",
        " ",
        Some(FobAction::WifiIndicator),
    )?;
    home.add_item(Some(GoTo(FobPage::PingTargets)), "Ping targets", "", None)?;
    home.add_item(Some(GoTo(FobPage::Time)), "Time", "", None)?;
    home.add_item(Some(GoTo(FobPage::DeviceInfo)), "Fob Info", "", None)?;
    let home = menu.add_page(home)?;

    let mut wifi = Page::new("WI-FI");
    wifi.add_item(Some(FobAction::ConnectStation), "Connect STA", "", None)?;
    wifi.add_item(Some(FobAction::StartAccessPoint), "Start AP", "", None)?;
    wifi.add_item(Some(FobAction::Scan), "Scan", "", None)?;
    let wifi_status_item = wifi.add_item(Some(GoTo(FobPage::Home)), "<--", "", None)?;
    let wifi = menu.add_page(wifi)?;

    let scan_results =
        menu.add_page(Page::new("SCAN RESULT").with_close_hook(LifecycleHook::ClearItems))?;

    let mut ping = Page::new("PING TARGETS")
        .with_open_hook(LifecycleHook::StartWorker(WorkKind::ReachabilityProbe))
        .with_close_hook(LifecycleHook::StopWorker);
    for target in targets {
        ping.add_item(None, &target.display_name, " ", None)?;
    }
    ping.add_item(Some(GoTo(FobPage::Home)), "<--", "", None)?;
    let ping_targets = menu.add_page(ping)?;

    let time = menu.add_page(worker_page("TIME", WorkKind::ClockRefresh)?)?;
    let device_info = menu.add_page(worker_page("FOB INFO", WorkKind::DeviceInfoRefresh)?)?;

    Ok((
        menu,
        FobPages {
            home,
            wifi,
            scan_results,
            ping_targets,
            time,
            device_info,
            wifi_status_item,
        },
    ))
}

// A page whose body belongs to the worker; its only item is an invisible
// back link.
fn worker_page(title: &str, kind: WorkKind) -> Result<Page<FobAction>, InitError> {
    let mut page = Page::new(title)
        .with_open_hook(LifecycleHook::StartWorker(kind))
        .with_close_hook(LifecycleHook::StopWorker);
    page.add_item(Some(FobAction::GoTo(FobPage::Home)), "", "", None)?;
    Ok(page)
}
