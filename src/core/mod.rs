//! Service-wide infrastructure shared by handlers.

mod service_context;

pub use service_context::ServiceContext;
