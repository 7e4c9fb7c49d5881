//! Tower middleware for the HTTP router.
//!
//! # Middleware Order
//! With `ServiceBuilder`, the first layer listed is the outermost:
//! - Request flows: outermost → innermost → handler
//! - Response flows: handler → innermost → outermost
//!
//! Order used by `startup::build_app`:
//! 1. RequestIdLayer - Extract/generate request ID first
//! 2. MetricsLayer - Count and time every request, timeouts included
//! 3. TraceLayer - Request tracing with spans
//! 4. TimeoutLayer - Request timeout
//! 5. CorsLayer - CORS handling

pub mod metrics;
pub mod request_id;

pub use metrics::MetricsLayer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
