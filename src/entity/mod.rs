pub mod endpoint;
pub mod repository;
pub mod request;
pub mod saved_request;
pub mod service;

pub mod prelude;

pub use prelude::*;
