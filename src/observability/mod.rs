pub mod endpoints;
pub mod metrics;
pub mod middleware;

pub use endpoints::{metrics_handler, observability_router};
pub use metrics::*;
pub use middleware::metrics_middleware;
