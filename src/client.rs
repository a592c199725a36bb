//! Client facade.
//!
//! [`RestClient`] composes the descriptor registry, binder, filter chain,
//! dispatcher and response resolver. [`RestClientBuilder`] assembles one and
//! checks every descriptor's component ids up front.

pub mod builder;
pub mod config;
pub mod core;

pub use builder::RestClientBuilder;
pub use config::ClientConfig;
pub use core::{PendingCall, RestClient};
