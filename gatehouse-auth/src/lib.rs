//! Cluster certificate authority and identity broker
//!
//! [`AuthServer`] issues host and user certificates, admits nodes and peer
//! authority servers with one-shot join tokens, and manages web sessions. All
//! state lives in the directory services handed to it at construction.

pub mod ca;
pub mod config;
pub mod init;
pub mod peer;
pub mod provision;
pub mod server;
pub mod web;

pub use config::AuthServerConfig;
pub use init::INIT_LOCK;
pub use server::AuthServer;
