//! Reachability targets probed by the background worker.

use core::{cell::RefCell, net::Ipv4Addr};

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use heapless::{String, Vec};

use crate::menu::{MAIN_TEXT_LEN, truncated};

pub const MAX_PING_TARGETS: usize = 8;
pub const HOSTNAME_LEN: usize = 48;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProbeAddress {
    Ip(Ipv4Addr),
    Host(String<HOSTNAME_LEN>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PingTarget {
    pub display_name: String<MAIN_TEXT_LEN>,
    pub address: ProbeAddress,
    pub probed: bool,
    pub reachable: bool,
}

impl PingTarget {
    pub fn by_ip(display_name: &str, ip: Ipv4Addr) -> Self {
        Self::new(display_name, ProbeAddress::Ip(ip))
    }

    pub fn by_host(display_name: &str, host: &str) -> Self {
        Self::new(display_name, ProbeAddress::Host(truncated(host)))
    }

    fn new(display_name: &str, address: ProbeAddress) -> Self {
        Self {
            display_name: truncated(display_name),
            address,
            probed: false,
            reachable: false,
        }
    }
}

/// Configured targets plus their last results.
///
/// Written only by the worker; the render path and actions read snapshots.
pub struct ProbeTargets {
    targets: Mutex<CriticalSectionRawMutex, RefCell<Vec<PingTarget, MAX_PING_TARGETS>>>,
}

impl ProbeTargets {
    pub const fn new() -> Self {
        Self {
            targets: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns `false` when the target table is full.
    pub fn push(&self, target: PingTarget) -> bool {
        self.targets
            .lock(|targets| targets.borrow_mut().push(target).is_ok())
    }

    pub fn len(&self) -> usize {
        self.targets.lock(|targets| targets.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<PingTarget> {
        self.targets
            .lock(|targets| targets.borrow().get(index).cloned())
    }

    pub fn record(&self, index: usize, reachable: bool) {
        self.targets.lock(|targets| {
            if let Some(target) = targets.borrow_mut().get_mut(index) {
                target.probed = true;
                target.reachable = reachable;
            }
        });
    }

    pub fn reset_results(&self) {
        self.targets.lock(|targets| {
            for target in targets.borrow_mut().iter_mut() {
                target.probed = false;
                target.reachable = false;
            }
        });
    }
}

impl Default for ProbeTargets {
    fn default() -> Self {
        Self::new()
    }
}
