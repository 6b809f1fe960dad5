mod fraud_service;

pub use fraud_service::FraudService;
