//! Typed operations per government domain

pub mod benefits;
pub mod identity_registry;
pub mod law_enforcement;
pub mod municipal;
pub mod utility;
