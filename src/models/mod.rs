mod api;

pub use api::{EchoResponse, HealthResponse};
