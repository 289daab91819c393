pub mod classification;
pub mod model;
pub mod validator;

pub use classification::{resolve, ClassificationPolicy, GOVERNMENT_RETENTION_DAYS};
pub use model::{AccessDecision, DataDescriptor, EffectiveProtection, EndpointDescriptor};
pub use validator::ZeroTrustValidator;
