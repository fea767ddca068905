//! Offering catalog abstraction.
//!
//! The catalog is the upstream list of public issues. It is fetched fresh on
//! every engine cycle and never persisted.

mod http;
mod types;

pub use http::HttpCatalog;
pub use types::*;
