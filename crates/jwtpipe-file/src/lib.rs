//! jwtpipe-file - credentials that survive the process.
//!
//! [`FileStore`] keeps the token pair in memory and writes every change
//! through to a small JSON file, so a later process can pick the session up.

mod store;

pub use store::{FileStore, OpenError};
