pub mod api;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod search;
pub mod selftest;
pub mod server;

pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use errors::{ServiceError, ServiceResult};
pub use search::{GraphRagCli, SearchBackend, SearchMethod, SearchParams};
