//! Background data worker: a single restartable unit of periodic work whose
//! lifetime follows the page that started it.

mod runner;


pub use runner::WorkerRunner;

use core::{
    cell::Cell,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use embassy_sync::{
    blocking_mutex::{self, raw::CriticalSectionRawMutex},
    mutex::Mutex,
    signal::Signal,
};
use heapless::String;
use log::info;

use crate::{clock::LocalTime, menu::PageId, probe::PingTarget};

pub const WORKER_INTERVAL_MS: u64 = 1_000;
pub const DEVICE_NAME_LEN: usize = 16;
pub const HWID_LEN: usize = 6;

pub const BATTERY_EMPTY_MV: u32 = 3_300;
pub const BATTERY_FULL_MV: u32 = 4_150;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkKind {
    ClockRefresh,
    DeviceInfoRefresh,
    ReachabilityProbe,
}

/// Identity of one started worker instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkerHandle {
    pub generation: u32,
    pub kind: WorkKind,
    /// Page whose items the worker recolors.
    pub page: Option<PageId>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct WorkerConfig {
    interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval_ms: WORKER_INTERVAL_MS,
        }
    }
}

impl WorkerConfig {
    pub const fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceInfo {
    pub name: String<DEVICE_NAME_LEN>,
    pub uptime_ms: u64,
    pub hwid: [u8; HWID_LEN],
    pub battery_pct: u8,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name:{}", self.name)?;
        writeln!(f, "Time:{}", self.uptime_ms)?;
        f.write_str("HWID:0x")?;
        for byte in self.hwid {
            write!(f, "{byte:02X}")?;
        }
        writeln!(f)?;
        writeln!(f, "BATT:{}%", self.battery_pct)
    }
}

/// Linear charge estimate from the cell voltage, clamped to 0..=100.
pub fn battery_percent(millivolts: u32) -> u8 {
    if millivolts <= BATTERY_EMPTY_MV {
        return 0;
    }
    if millivolts >= BATTERY_FULL_MV {
        return 100;
    }
    ((millivolts - BATTERY_EMPTY_MV) * 100 / (BATTERY_FULL_MV - BATTERY_EMPTY_MV)) as u8
}

/// Data the worker reads each cycle.
///
/// Failures are reported in-band: no time, or an unreachable target.
#[allow(async_fn_in_trait)]
pub trait WorkSources {
    async fn local_time(&mut self) -> Option<LocalTime>;
    async fn device_info(&mut self) -> DeviceInfo;
    async fn probe(&mut self, target: &PingTarget) -> bool;
}

/// Ownership slot for the single live worker.
///
/// `start` and `stop` are serialized; `start` tears the current worker down
/// and waits for the runner to acknowledge before handing out the next one.
pub struct WorkerSlot {
    control: Mutex<CriticalSectionRawMutex, ()>,
    start: Signal<CriticalSectionRawMutex, WorkerHandle>,
    stop: Signal<CriticalSectionRawMutex, ()>,
    stopped: Signal<CriticalSectionRawMutex, WorkerHandle>,
    next_generation: AtomicU32,
    live: blocking_mutex::Mutex<CriticalSectionRawMutex, Cell<Option<WorkerHandle>>>,
}

impl WorkerSlot {
    pub const fn new() -> Self {
        Self {
            control: Mutex::new(()),
            start: Signal::new(),
            stop: Signal::new(),
            stopped: Signal::new(),
            next_generation: AtomicU32::new(1),
            live: blocking_mutex::Mutex::new(Cell::new(None)),
        }
    }

    /// Handle of the live worker, if any.
    pub fn current(&self) -> Option<WorkerHandle> {
        self.live.lock(Cell::get)
    }

    pub async fn start(&self, kind: WorkKind, page: Option<PageId>) -> WorkerHandle {
        let _control = self.control.lock().await;
        self.stop_live().await;

        let handle = WorkerHandle {
            generation: self.next_generation.fetch_add(1, Ordering::AcqRel),
            kind,
            page,
        };
        self.stopped.reset();
        self.live.lock(|live| live.set(Some(handle)));
        self.start.signal(handle);
        info!("worker: started {:?} (generation {})", kind, handle.generation);
        handle
    }

    /// Stops the live worker and returns once it has been torn down.
    pub async fn stop(&self) {
        let _control = self.control.lock().await;
        self.stop_live().await;
    }

    async fn stop_live(&self) {
        let Some(handle) = self.current() else {
            return;
        };

        self.stop.signal(());
        let acked = self.stopped.wait().await;
        debug_assert_eq!(acked.generation, handle.generation);
        self.live.lock(|live| live.set(None));
        info!(
            "worker: stopped {:?} (generation {})",
            handle.kind, handle.generation
        );
    }
}

impl Default for WorkerSlot {
    fn default() -> Self {
        Self::new()
    }
}
