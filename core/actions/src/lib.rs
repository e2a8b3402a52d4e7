pub mod decode;
pub mod traits;

pub use crate::decode::DecodePolicy;
pub use crate::traits::{ActionBackend, ActionDenied, LocalActionBackend, ReadPolicy, DEFAULT_MAX_READ_BYTES};
