//! Source lists: reading the list, downloading each source and extracting
//! candidate descriptor lines from what comes back.

mod extract;
mod fetch;
mod list;

pub use extract::CandidateExtractor;
pub use fetch::{fetch_all, fetch_source};
pub use list::read_source_urls;
