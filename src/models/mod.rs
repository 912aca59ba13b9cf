pub mod endpoint;
pub mod repository;
pub mod request;
pub mod saved_request;
pub mod service;

pub use endpoint::*;
pub use repository::*;
pub use request::*;
pub use saved_request::*;
pub use service::*;
