//! Network layer: what the OS reports and how it is obtained.
//!
//! This module provides types and traits for:
//! - Raw interface and address descriptors ([`RawInterface`], [`RawAddress`])
//! - Address family and hardware classification ([`Family`], [`NicType`])
//! - The enumeration collaborator ([`InterfaceEnumerator`])
//! - The auxiliary lookups ([`ActiveInterfaceLookup`], [`NicTypeLookup`])
//! - Interface-name filtering ([`filter`])
//! - Platform-specific implementations ([`platform`])

mod enumerator;
pub mod filter;
mod interface;
mod lookup;
pub mod platform;


pub use enumerator::{EnumerateError, InterfaceEnumerator};
pub use interface::{Family, NicType, NicTypes, ParseFamilyError, RawAddress, RawInterface};
pub use lookup::{ActiveInterfaceLookup, LookupError, NicTypeLookup};
