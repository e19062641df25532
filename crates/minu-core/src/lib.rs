#![cfg_attr(not(test), no_std)]

//! Task coordination core for the Minu fob: button classification, menu
//! navigation, coalesced rendering and the page-scoped background worker.

pub mod boot;
pub mod canvas;
pub mod clock;
pub mod fob;
pub mod input;
pub mod menu;
pub mod probe;
pub mod render;
pub mod scan;
pub mod shared;
pub mod ui;
pub mod worker;

#[cfg(test)]
mod testing;

pub use shared::{Coordinator, Shared};
