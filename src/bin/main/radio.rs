use core::{convert::Infallible, net::Ipv4Addr};

use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal,
};
use embassy_time::{Duration, Timer, WithTimeout};
use esp_radio::wifi::{
    AccessPointConfig, AuthMethod, ClientConfig, ModeConfig, ScanConfig, WifiController,
};
use heapless::{String, Vec};
use log::{info, warn};
use minu_core::{
    fob::{WifiControl, WifiMode, WifiSnapshot, WifiStatusSource},
    scan::{MAX_SCAN_RESULTS, ScanError, ScannedNetwork, WifiScanner},
};
use minu_hal_esp32::network::{ConnectivityHandle, WifiCredentials};

pub(super) const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

const NETWORK_POLL_INTERVAL_MS: u64 = 500;
const DHCP_TIMEOUT_SECS: u64 = 15;
const JOIN_RETRY_BACKOFF_MIN_SECS: u64 = 2;
const JOIN_RETRY_BACKOFF_MAX_SECS: u64 = 60;

type ScanReply = Result<Vec<ScannedNetwork, MAX_SCAN_RESULTS>, ScanError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RadioCommand {
    JoinStation,
    StartAccessPoint,
    Scan,
}

/// Mailboxes between the UI side and the task that owns the controller.
pub(super) struct RadioChannels {
    commands: Channel<CriticalSectionRawMutex, RadioCommand, 2>,
    scan_done: Signal<CriticalSectionRawMutex, ScanReply>,
}

impl RadioChannels {
    pub(super) const fn new() -> Self {
        Self {
            commands: Channel::new(),
            scan_done: Signal::new(),
        }
    }
}

/// Station and soft-AP credentials.
#[derive(Clone, Copy, Debug)]
pub(super) struct RadioConfig {
    pub station: WifiCredentials,
    pub access_point: WifiCredentials,
}

/// Handle given to the item actions.
pub(super) struct RadioLink {
    connectivity: &'static ConnectivityHandle,
    channels: &'static RadioChannels,
}

impl RadioLink {
    pub(super) const fn new(
        connectivity: &'static ConnectivityHandle,
        channels: &'static RadioChannels,
    ) -> Self {
        Self {
            connectivity,
            channels,
        }
    }
}

impl WifiStatusSource for RadioLink {
    fn snapshot(&self) -> WifiSnapshot {
        self.connectivity.snapshot()
    }
}

impl WifiControl for RadioLink {
    async fn connect_station(&mut self) {
        self.channels.commands.send(RadioCommand::JoinStation).await;
    }

    async fn start_access_point(&mut self) {
        self.channels
            .commands
            .send(RadioCommand::StartAccessPoint)
            .await;
    }
}

impl WifiScanner for RadioLink {
    async fn scan(
        &mut self,
        out: &mut Vec<ScannedNetwork, MAX_SCAN_RESULTS>,
    ) -> Result<(), ScanError> {
        self.channels.scan_done.reset();
        self.channels.commands.send(RadioCommand::Scan).await;
        *out = self.channels.scan_done.wait().await?;
        Ok(())
    }
}

fn join_backoff_secs(consecutive_failures: u32) -> u64 {
    let shift = consecutive_failures.min(5);
    JOIN_RETRY_BACKOFF_MIN_SECS
        .saturating_mul(1u64 << shift)
        .min(JOIN_RETRY_BACKOFF_MAX_SECS)
}

/// Owns the Wi-Fi controller: applies mode changes, runs scans and keeps the
/// station associated once a join was requested.
pub(super) async fn wifi_loop(
    controller: &mut WifiController<'_>,
    sta_stack: Stack<'_>,
    connectivity: &'static ConnectivityHandle,
    channels: &'static RadioChannels,
    config: RadioConfig,
) -> ! {
    let mut mode = WifiMode::Off;
    let mut joining = false;

    loop {
        let command = if mode == WifiMode::Station && joining {
            match select(
                channels.commands.receive(),
                keep_station_up(controller, sta_stack, connectivity),
            )
            .await
            {
                Either::First(command) => command,
                Either::Second(never) => match never {},
            }
        } else {
            channels.commands.receive().await
        };

        match command {
            RadioCommand::JoinStation => {
                info!("wifi: joining {}", config.station.ssid);
                if apply_mode(controller, station_mode(config)).await {
                    mode = WifiMode::Station;
                    joining = true;
                    connectivity.mark_station();
                } else {
                    mode = WifiMode::Off;
                    connectivity.mark_off();
                }
            }
            RadioCommand::StartAccessPoint => {
                info!("wifi: soft-AP {} at {}", config.access_point.ssid, AP_ADDRESS);
                joining = false;
                if apply_mode(controller, access_point_mode(config)).await {
                    mode = WifiMode::AccessPoint;
                    connectivity.mark_access_point(AP_ADDRESS);
                } else {
                    mode = WifiMode::Off;
                    connectivity.mark_off();
                }
            }
            RadioCommand::Scan => {
                let reply = scan(controller, &mut mode, connectivity, config).await;
                channels.scan_done.signal(reply);
            }
        }
    }
}

fn station_mode(config: RadioConfig) -> ModeConfig {
    ModeConfig::Client(client_config(config.station))
}

fn access_point_mode(config: RadioConfig) -> ModeConfig {
    ModeConfig::AccessPoint(ap_config(config.access_point))
}

fn client_config(credentials: WifiCredentials) -> ClientConfig {
    ClientConfig::default()
        .with_ssid(credentials.ssid.into())
        .with_password(credentials.password.into())
}

fn ap_config(credentials: WifiCredentials) -> AccessPointConfig {
    AccessPointConfig::default()
        .with_ssid(credentials.ssid.into())
        .with_password(credentials.password.into())
        .with_auth_method(AuthMethod::Wpa2Personal)
}

async fn apply_mode(controller: &mut WifiController<'_>, mode: ModeConfig) -> bool {
    if controller.is_started().unwrap_or(false) {
        let _ = controller.disconnect_async().await;
        if let Err(err) = controller.stop_async().await {
            warn!("wifi: stop failed: {:?}", err);
        }
    }
    if let Err(err) = controller.set_config(&mode) {
        warn!("wifi: mode config failed: {:?}", err);
        return false;
    }
    if let Err(err) = controller.start_async().await {
        warn!("wifi: start failed: {:?}", err);
        return false;
    }
    true
}

async fn scan(
    controller: &mut WifiController<'_>,
    mode: &mut WifiMode,
    connectivity: &ConnectivityHandle,
    config: RadioConfig,
) -> ScanReply {
    // Scanning needs the station interface.
    match *mode {
        WifiMode::Off => {
            if !apply_mode(controller, station_mode(config)).await {
                return Err(ScanError::Radio);
            }
            *mode = WifiMode::Station;
            connectivity.mark_station();
        }
        WifiMode::AccessPoint => {
            let both = ModeConfig::ApSta(
                client_config(config.station),
                ap_config(config.access_point),
            );
            if !apply_mode(controller, both).await {
                return Err(ScanError::Radio);
            }
        }
        WifiMode::Station => {}
    }

    let found = controller
        .scan_with_config_async(ScanConfig::default().with_max(MAX_SCAN_RESULTS))
        .await
        .map_err(|err| {
            warn!("wifi: scan failed: {:?}", err);
            ScanError::Radio
        })?;

    let mut networks = Vec::new();
    for ap in found.iter().take(MAX_SCAN_RESULTS) {
        let mut ssid = String::new();
        for ch in ap.ssid.chars() {
            if ssid.push(ch).is_err() {
                break;
            }
        }
        let _ = networks.push(ScannedNetwork {
            ssid,
            rssi: ap.signal_strength,
        });
    }
    info!("wifi: scan found {} networks", networks.len());
    Ok(networks)
}

/// Associates, waits for DHCP and then watches the link, retrying with
/// backoff. Runs until the caller drops it.
async fn keep_station_up(
    controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    connectivity: &ConnectivityHandle,
) -> Infallible {
    let mut consecutive_failures = 0u32;

    loop {
        if !matches!(controller.is_connected(), Ok(true)) {
            if let Err(err) = controller.connect_async().await {
                info!("wifi: connect failed: {:?}", err);
                connectivity.update_link_ip(false, None);
                retry_after_backoff(&mut consecutive_failures).await;
                continue;
            }

            let dhcp = stack
                .wait_config_up()
                .with_timeout(Duration::from_secs(DHCP_TIMEOUT_SECS))
                .await;
            if dhcp.is_err() {
                info!("wifi: dhcp timeout; reconnecting");
                connectivity.update_link_ip(stack.is_link_up(), None);
                let _ = controller.disconnect_async().await;
                retry_after_backoff(&mut consecutive_failures).await;
                continue;
            }
        }

        consecutive_failures = 0;

        loop {
            let link_up = stack.is_link_up();
            let ip = stack.config_v4().map(|config| config.address.address());
            let associated = matches!(controller.is_connected(), Ok(true));
            connectivity.update_link_ip(link_up && associated, ip);

            if !(link_up && associated && ip.is_some()) {
                info!(
                    "wifi: station lost (link_up={} associated={} ip={:?})",
                    link_up, associated, ip
                );
                break;
            }
            Timer::after_millis(NETWORK_POLL_INTERVAL_MS).await;
        }

        let _ = controller.disconnect_async().await;
        retry_after_backoff(&mut consecutive_failures).await;
    }
}

async fn retry_after_backoff(consecutive_failures: &mut u32) {
    let delay_secs = join_backoff_secs(*consecutive_failures);
    *consecutive_failures = consecutive_failures.saturating_add(1);
    info!(
        "wifi: retrying in {}s (consecutive_failures={})",
        delay_secs, *consecutive_failures
    );
    Timer::after_secs(delay_secs).await;
}
