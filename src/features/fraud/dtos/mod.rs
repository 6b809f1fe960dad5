mod fraud_dto;

pub use fraud_dto::{FraudQuery, FraudSummaryDto};
