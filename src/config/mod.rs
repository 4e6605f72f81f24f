pub mod schema;

pub use schema::{CacheConfig, Config, GatewayConfig, WebhookConfig};
