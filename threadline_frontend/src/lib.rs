pub mod api;
pub mod app;
pub mod comments;
pub mod config;
pub mod error;
pub mod likes;
pub mod listing;
pub mod models;
pub mod moderation;
pub mod pagination;
pub mod telemetry;

pub use api::{ApiClient, ForumGateway};
pub use app::{DiscussionSession, ViewEvent, Viewer};
pub use config::ClientConfig;
pub use error::{GatewayError, GatewayResult};
