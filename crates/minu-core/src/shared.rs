//! Coordination context shared by the four activities.
//!
//! Lock order is menu before canvas. Only the render scheduler holds a guard
//! across an await, and only to complete one draw.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex, signal::Signal};

use crate::{
    input::PressFlags, menu::Menu, probe::ProbeTargets, render::RenderState, worker::WorkerSlot,
};

/// Lock-free flags and signals connecting the activities.
pub struct Coordinator {
    pub presses: PressFlags,
    pub render: RenderState,
    ui_wake: Signal<CriticalSectionRawMutex, ()>,
}

impl Coordinator {
    pub const fn new() -> Self {
        Self {
            presses: PressFlags::new(),
            render: RenderState::new(),
            ui_wake: Signal::new(),
        }
    }

    /// Tells the UI controller that new press flags are pending.
    pub fn wake_ui(&self) {
        self.ui_wake.signal(());
    }

    pub async fn wait_ui_wake(&self) {
        self.ui_wake.wait().await;
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Shared<A, C> {
    pub coord: Coordinator,
    pub menu: Mutex<CriticalSectionRawMutex, Menu<A>>,
    pub canvas: Mutex<CriticalSectionRawMutex, C>,
    pub worker: WorkerSlot,
    pub targets: ProbeTargets,
}

impl<A, C> Shared<A, C> {
    pub const fn new(menu: Menu<A>, canvas: C) -> Self {
        Self {
            coord: Coordinator::new(),
            menu: Mutex::new(menu),
            canvas: Mutex::new(canvas),
            worker: WorkerSlot::new(),
            targets: ProbeTargets::new(),
        }
    }
}
