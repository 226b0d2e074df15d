//! File persistence: the record document, plain descriptor lists and atomic writes.

mod atomic;
mod records;

pub use atomic::write_atomically;
pub use records::{load_records, write_records, LoadedRecords};
