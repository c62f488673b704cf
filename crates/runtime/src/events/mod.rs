//! Topic-keyed event routing for messages published by the core.
mod bus;

pub use bus::{BusEvent, EventBus};
