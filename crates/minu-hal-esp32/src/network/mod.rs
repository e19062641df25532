//! Wi-Fi state shared between the radio task and the UI.

use core::{
    net::Ipv4Addr,
    sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering},
};

use minu_core::fob::{WifiMode, WifiSnapshot, WifiStatusSource};

const NO_ADDRESS: u32 = 0;

fn mode_from_raw(raw: u8) -> WifiMode {
    match raw {
        1 => WifiMode::Station,
        2 => WifiMode::AccessPoint,
        _ => WifiMode::Off,
    }
}

const fn mode_to_raw(mode: WifiMode) -> u8 {
    match mode {
        WifiMode::Off => 0,
        WifiMode::Station => 1,
        WifiMode::AccessPoint => 2,
    }
}

/// Network name and passphrase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiCredentials {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiCredentials {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }
}

/// Snapshot plus the revision it was read at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectivitySnapshot {
    pub wifi: WifiSnapshot,
    pub revision: u32,
}

/// Lock-free shared Wi-Fi status.
#[derive(Debug)]
pub struct ConnectivityHandle {
    mode: AtomicU8,
    link_up: AtomicBool,
    ipv4: AtomicU32,
    revision: AtomicU32,
}

impl ConnectivityHandle {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(mode_to_raw(WifiMode::Off)),
            link_up: AtomicBool::new(false),
            ipv4: AtomicU32::new(NO_ADDRESS),
            revision: AtomicU32::new(0),
        }
    }

    pub fn read(&self) -> ConnectivitySnapshot {
        let mode = mode_from_raw(self.mode.load(Ordering::Acquire));
        let link_up = self.link_up.load(Ordering::Acquire);
        let ip = match self.ipv4.load(Ordering::Acquire) {
            NO_ADDRESS => None,
            raw => Some(Ipv4Addr::from(raw)),
        };

        ConnectivitySnapshot {
            wifi: WifiSnapshot {
                mode,
                connected: mode == WifiMode::Station && link_up && ip.is_some(),
                ip,
            },
            revision: self.revision.load(Ordering::Acquire),
        }
    }

    pub fn revision(&self) -> u32 {
        self.revision.load(Ordering::Acquire)
    }

    /// Radio switched to station mode; not yet associated.
    pub fn mark_station(&self) {
        self.switch_mode(WifiMode::Station, None);
    }

    /// Soft-AP is up at `ip`.
    pub fn mark_access_point(&self, ip: Ipv4Addr) {
        self.switch_mode(WifiMode::AccessPoint, Some(ip));
    }

    pub fn mark_off(&self) {
        self.switch_mode(WifiMode::Off, None);
    }

    /// Station link and DHCP state. Ignored outside station mode.
    pub fn update_link_ip(&self, link_up: bool, ip: Option<Ipv4Addr>) {
        if mode_from_raw(self.mode.load(Ordering::Acquire)) != WifiMode::Station {
            return;
        }

        let ip = if link_up { ip } else { None };
        let mut changed = false;
        changed |= self.store_bool(&self.link_up, link_up);
        changed |= self.store_ip(ip);
        if changed {
            self.bump_revision();
        }
    }

    fn switch_mode(&self, mode: WifiMode, ip: Option<Ipv4Addr>) {
        let mut changed = false;
        changed |= self.store_mode(mode);
        changed |= self.store_bool(&self.link_up, mode == WifiMode::AccessPoint);
        changed |= self.store_ip(ip);
        if changed {
            self.bump_revision();
        }
    }

    fn store_mode(&self, next: WifiMode) -> bool {
        let raw = mode_to_raw(next);
        self.mode.swap(raw, Ordering::AcqRel) != raw
    }

    fn store_ip(&self, next: Option<Ipv4Addr>) -> bool {
        let raw = next.map_or(NO_ADDRESS, u32::from);
        self.ipv4.swap(raw, Ordering::AcqRel) != raw
    }

    fn store_bool(&self, cell: &AtomicBool, next: bool) -> bool {
        cell.swap(next, Ordering::AcqRel) != next
    }

    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ConnectivityHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiStatusSource for ConnectivityHandle {
    fn snapshot(&self) -> WifiSnapshot {
        self.read().wifi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off() {
        let handle = ConnectivityHandle::new();
        assert_eq!(handle.snapshot(), WifiSnapshot::OFF);
        assert_eq!(handle.revision(), 0);
    }

    #[test]
    fn station_is_connected_only_with_link_and_address() {
        let handle = ConnectivityHandle::new();
        handle.mark_station();
        assert_eq!(handle.snapshot().mode, WifiMode::Station);
        assert!(!handle.snapshot().connected);

        handle.update_link_ip(true, None);
        assert!(!handle.snapshot().connected);

        let ip = Ipv4Addr::new(192, 168, 1, 50);
        handle.update_link_ip(true, Some(ip));
        let status = handle.snapshot();
        assert!(status.connected);
        assert!(status.is_up());
        assert_eq!(status.ip, Some(ip));

        handle.update_link_ip(false, Some(ip));
        assert_eq!(handle.snapshot().ip, None);
        assert!(!handle.snapshot().connected);
    }

    #[test]
    fn access_point_is_up_without_station_link() {
        let handle = ConnectivityHandle::new();
        handle.mark_access_point(Ipv4Addr::new(192, 168, 4, 1));

        let status = handle.snapshot();
        assert_eq!(status.mode, WifiMode::AccessPoint);
        assert!(!status.connected);
        assert!(status.is_up());

        // Station updates do not leak into AP mode.
        handle.update_link_ip(true, Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(handle.snapshot().ip, Some(Ipv4Addr::new(192, 168, 4, 1)));
    }

    #[test]
    fn revision_moves_only_on_change() {
        let handle = ConnectivityHandle::new();
        handle.mark_off();
        assert_eq!(handle.revision(), 0);

        handle.mark_station();
        let after_mode = handle.revision();
        assert_eq!(after_mode, 1);

        handle.update_link_ip(true, Some(Ipv4Addr::new(10, 0, 0, 2)));
        handle.update_link_ip(true, Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(handle.revision(), after_mode + 1);
    }
}
