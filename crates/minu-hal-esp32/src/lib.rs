#![cfg_attr(not(test), no_std)]

//! M5StickC Plus2 board glue for the Minu fob core.

pub mod input;
pub mod network;
pub mod platform;
