//! Monitor layer: the state-reconciliation engine.
//!
//! This module provides types and functions for:
//! - Normalizing raw addresses into keyed, hashed records ([`Address`], [`InterfaceInfo`])
//! - Representing change events ([`Change`], [`ChangeKind`])
//! - Computing and applying diffs against the store ([`plan`], [`reconcile`])
//! - Deciding when to reconcile ([`Scheduler`])
//! - Fanning out changes and warnings ([`ChangeFeed`], [`WarningFeed`])
//! - Error handling ([`WatchError`], [`Warning`])
//! - The engine tying it together ([`NetworkInterfaces`])

mod address;
mod change;
mod dispatch;
mod engine;
mod error;
mod reconcile;
mod scheduler;

pub use address::{Address, Digest, InterfaceInfo, address_key};
pub use change::{Change, ChangeKind};
pub use dispatch::{ChangeFeed, Dispatcher, FramedChanges, FramedWarnings, WarningFeed};
pub use engine::{NetworkInterfaces, Snapshot, WatchOptions};
pub use error::{Warning, WarningCode, WatchError};
pub use reconcile::{Plan, plan, reconcile};
pub use scheduler::{Scheduler, SchedulerState, Subscription};
