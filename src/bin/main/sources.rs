use core::net::Ipv4Addr;

use embassy_net::{
    IpAddress, Stack,
    dns::DnsQueryType,
    icmp::{
        PacketMetadata,
        ping::{PingManager, PingParams},
    },
};
use embassy_time::{Duration, Instant, WithTimeout};
use heapless::String;
use log::{info, warn};
use minu_core::{
    clock::{LocalTime, WallClock},
    fob::WifiStatusSource,
    probe::{PingTarget, ProbeAddress},
    worker::{DeviceInfo, HWID_LEN, WorkSources},
};
use minu_hal_esp32::network::ConnectivityHandle;

use crate::{power::Battery, sntp};

const NTP_SERVER: &str = "pool.ntp.org";
const GMT_OFFSET_SECS: i32 = 3 * 3_600;
const SNTP_TIMEOUT_MS: u64 = 2_000;
const SNTP_RESYNC_SECS: u64 = 3_600;
const SNTP_RETRY_SECS: u64 = 30;
const DNS_TIMEOUT_MS: u64 = 2_000;
const PING_TIMEOUT_MS: u64 = 1_200;

/// Worker data sources backed by the station stack, the battery ADC and
/// the efuse MAC.
pub(super) struct FirmwareSources<'a> {
    stack: Stack<'a>,
    connectivity: &'static ConnectivityHandle,
    battery: Battery,
    name: &'static str,
    hwid: [u8; HWID_LEN],
    wall_clock: Option<WallClock>,
    last_sync_attempt: Option<Instant>,
}

impl<'a> FirmwareSources<'a> {
    pub(super) fn new(
        stack: Stack<'a>,
        connectivity: &'static ConnectivityHandle,
        battery: Battery,
        name: &'static str,
        hwid: [u8; HWID_LEN],
    ) -> Self {
        Self {
            stack,
            connectivity,
            battery,
            name,
            hwid,
            wall_clock: None,
            last_sync_attempt: None,
        }
    }

    fn sync_due(&self) -> bool {
        let retry_due = self
            .last_sync_attempt
            .is_none_or(|at| at.elapsed() >= Duration::from_secs(SNTP_RETRY_SECS));
        let stale = self.wall_clock.is_none_or(|clock| {
            Instant::now().as_millis().saturating_sub(clock.synced_at_ms())
                >= SNTP_RESYNC_SECS * 1_000
        });
        retry_due && stale
    }

    async fn sync_time(&mut self) {
        self.last_sync_attempt = Some(Instant::now());

        match sntp::query(self.stack, NTP_SERVER)
            .with_timeout(Duration::from_millis(SNTP_TIMEOUT_MS))
            .await
        {
            Ok(Ok(unix_secs)) => {
                info!("time: synced, unix={}", unix_secs);
                self.wall_clock =
                    WallClock::from_unix(unix_secs as i64, Instant::now().as_millis());
            }
            Ok(Err(err)) => warn!("time: sync failed: {:?}", err),
            Err(_) => warn!("time: sync timed out"),
        }
    }
}

impl WorkSources for FirmwareSources<'_> {
    async fn local_time(&mut self) -> Option<LocalTime> {
        if self.connectivity.snapshot().connected && self.sync_due() {
            self.sync_time().await;
        }

        self.wall_clock?.local(Instant::now().as_millis(), GMT_OFFSET_SECS)
    }

    async fn device_info(&mut self) -> DeviceInfo {
        let mut name = String::new();
        for ch in self.name.chars() {
            if name.push(ch).is_err() {
                break;
            }
        }

        DeviceInfo {
            name,
            uptime_ms: Instant::now().as_millis(),
            hwid: self.hwid,
            battery_pct: self.battery.percent(),
        }
    }

    async fn probe(&mut self, target: &PingTarget) -> bool {
        if !self.connectivity.snapshot().connected {
            return false;
        }

        let address = match &target.address {
            ProbeAddress::Ip(ip) => *ip,
            ProbeAddress::Host(host) => {
                match resolve_v4(self.stack, host)
                    .with_timeout(Duration::from_millis(DNS_TIMEOUT_MS))
                    .await
                {
                    Ok(Some(ip)) => ip,
                    _ => {
                        info!("ping: cannot resolve {}", host.as_str());
                        return false;
                    }
                }
            }
        };

        let mut rx_buffer = [0u8; 256];
        let mut tx_buffer = [0u8; 256];
        let mut rx_meta = [PacketMetadata::EMPTY; 1];
        let mut tx_meta = [PacketMetadata::EMPTY; 1];
        let mut ping_manager = PingManager::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        let mut params = PingParams::new(address);
        params
            .set_payload(b"minu")
            .set_count(1)
            .set_timeout(Duration::from_millis(PING_TIMEOUT_MS))
            .set_rate_limit(Duration::from_millis(100));

        match ping_manager.ping(&params).await {
            Ok(_) => true,
            Err(err) => {
                info!(
                    "ping: {} ({}) failed: {:?}",
                    target.display_name.as_str(),
                    address,
                    err
                );
                false
            }
        }
    }
}

/// First IPv4 address for `host`.
async fn resolve_v4(stack: Stack<'_>, host: &str) -> Option<Ipv4Addr> {
    let addresses = stack.dns_query(host, DnsQueryType::A).await.ok()?;
    addresses.iter().find_map(|address| match address {
        IpAddress::Ipv4(ip) => Some(*ip),
        #[allow(unreachable_patterns)]
        _ => None,
    })
}
