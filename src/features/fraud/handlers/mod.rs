pub mod fraud_handler;

pub use fraud_handler::*;
