//! Document I/O Port
//!
//! The graph never touches storage directly. Every fetch and every write goes
//! through a [`DocumentIo`] implementation supplied by the caller, so the
//! same graph code runs against a filesystem, an in-memory fixture or any
//! other backend.

pub mod contract;
pub mod filesystem;
pub mod memory;

pub use contract::DocumentIo;
pub use filesystem::FileSystemIo;
pub use memory::MemoryIo;
