//! Transport implementations shipped with the driver.

pub mod memory;

pub use memory::MemoryTransport;
