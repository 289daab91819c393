pub mod audit;
pub mod credential;
pub mod health;
pub mod metrics;
