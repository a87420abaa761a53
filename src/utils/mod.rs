pub mod persist;

pub use persist::{atomic_write, content_checksum};
