//! Secure Gov Gateway - classification-aware gateway for government data providers
//!
//! Every outbound call is checked by a zero-trust validator, rate limited,
//! signed with the active PKI credential, encrypted when its classification
//! requires it, and audited.

// Foundational layer
pub mod error;
pub mod types;
pub mod config;
pub mod telemetry;

// Core layer
pub mod crypto;
pub mod identity;
pub mod policy;
pub mod transport;

// Application layer
pub mod service;
pub mod cache;
pub mod audit;
pub mod gateway;
pub mod domains;
pub mod controller;

// Interface layer
pub mod api;

// Public key types
pub use crate::error::{Error, ErrorCategory};
pub use crate::types::{Classification, Environment, Operation, Result, ServiceIdentifier};
pub use crate::identity::{Credential, CredentialManager};
pub use crate::policy::{EndpointDescriptor, ZeroTrustValidator};
pub use crate::gateway::{GatewayCore, GatewayOptions, GatewayRequest};
pub use crate::telemetry::GatewayMetrics;
