//! netif-watch: network interface and address watcher
//!
//! A library that keeps an in-memory model of the host's network
//! interfaces and emits ordered, minimal change events when it drifts.

pub mod config;
pub mod encoding;
pub mod monitor;
pub mod network;
pub mod state;
pub mod time;
