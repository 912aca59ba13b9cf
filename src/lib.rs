// Library crate for the PostWhale backend
// Exports modules for use by the binary and the integration tests

pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
