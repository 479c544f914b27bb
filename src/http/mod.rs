//! HTTP response helpers and the RouteModule trait for organizing routes.

pub mod response;
pub mod routes;

pub use response::{CreatedResponse, JsonResponse};
pub use routes::RouteModule;
