//! Data sources

pub mod bus;

pub use bus::{BusBackend, BusError, create_bus};
