//! Services layer - Business logic
//!
//! Services implement the business rules for posts and coordinate between
//! repositories and the cache. `PostGateway` is the data-access contract the
//! list view and the wizard are written against.

pub mod gateway;
pub mod post;

pub use gateway::{GatewayError, PostGateway};
pub use post::{generate_slug, PostService, PostServiceError};
