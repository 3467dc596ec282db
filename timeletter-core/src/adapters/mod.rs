//! Adapters - implementations of the ports
//!
//! `http` talks to the letter service, `file_store` persists the few
//! client-side values that survive a restart.

pub mod file_store;
pub mod http;

#[cfg(test)]
pub mod mock_server;
