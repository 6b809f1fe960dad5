//! Storage module for watermarked photo artifacts
//!
//! Provides MinIO/S3-compatible storage client for photo uploads and
//! public URL construction.

mod minio_client;

pub use minio_client::MinIOClient;
