//! HTTP API handlers for concierge-api

pub mod ai;
pub mod analytics;
pub mod destinations;
pub mod health;
pub mod identity;
pub mod profile;

pub use ai::ai_routes;
pub use analytics::analytics_routes;
pub use destinations::destination_routes;
pub use health::health_routes;
pub use identity::UserId;
pub use profile::profile_routes;
