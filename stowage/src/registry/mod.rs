//! In-memory registries for containers and items.
//!
//! Both keep insertion order: an overwrite keeps the original slot and a
//! delete leaves the relative order of the rest untouched.

pub mod containers;
pub mod items;

pub use containers::ContainerRegistry;
pub use items::ItemRegistry;
