mod feed_routes;
mod requests_logging;
mod server;
mod state;

pub use feed_routes::valid_feed_name;
pub use requests_logging::{log_requests, RequestsLoggingLevel};
pub use server::{make_app, run_server};
pub use state::{ServerConfig, ServerState};
