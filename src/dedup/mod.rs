//! Fingerprinting and deduplication of canonical records.

mod fingerprint;
mod store;

pub use fingerprint::Fingerprint;
pub use store::{DescriptorStore, SequenceKey};
