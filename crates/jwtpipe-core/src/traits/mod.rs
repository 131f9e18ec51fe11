//! Core traits for transports and credential storage.

mod store;
mod transport;

pub use store::CredentialStore;
pub use transport::Transport;
