#![allow(dead_code)]

pub mod app;
pub mod factory;

pub use app::TestApp;
pub use factory::{openapi_doc, Factory, RepoFixture};
