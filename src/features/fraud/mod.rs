pub mod dtos;
pub mod engine;
pub mod handlers;
pub mod routes;
pub mod services;

pub use engine::{classify, FraudFlag, FraudPolicy};
pub use routes::routes;
pub use services::FraudService;
