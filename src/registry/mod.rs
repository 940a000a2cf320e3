//! Item registry orchestrator.
//!
//! Placers own a registry and write back positions; hosts read items and the
//! dirty set from here.

mod core;

pub use self::core::{Item, ItemId, ItemRegistry};
