//! Testing utilities: drive the router in-process and sign webhook bodies.

mod scenario;

pub use scenario::{Scenario, ScenarioAssert, get, post};
