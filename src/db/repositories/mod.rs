//! Database repositories
//!
//! Repository pattern implementations for post storage.

pub mod mock;
pub mod post;

pub use mock::{seed_posts, Latency, MockPostRepository};
pub use post::{PostRepository, SlugTaken, SqlxPostRepository};
