pub use super::endpoint::Entity as EndpointEntity;
pub use super::repository::Entity as RepositoryEntity;
pub use super::request::Entity as RequestEntity;
pub use super::saved_request::Entity as SavedRequestEntity;
pub use super::service::Entity as ServiceEntity;
