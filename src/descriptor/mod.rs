//! Request descriptor layer: static, declarative metadata for every operation.
//!
//! # Request Descriptor Model
//!
//! A [`RequestDescriptor`] describes how one logical operation maps onto an
//! HTTP request template: verb, path template, fixed and argument-filled query
//! parameters and headers, payload serialization, response parser and
//! exception mapper ids, request filters, and response unwrapping.
//!
//! Descriptors are created once, registered in a [`DescriptorRegistry`], and
//! shared read-only by every invocation of the operation.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Descriptor structure and builder |
//! | [`template`] | Path template parsing |
//! | [`registry`] | Operation id lookup |
//! | [`manifest`] | YAML/JSON declarative source |
//! | [`error`] | Descriptor error types |
//!
//! ## Example
//!
//! ```rust
//! use cloud_lib_rust::descriptor::{DescriptorRegistry, RequestDescriptor};
//! use reqwest::Method;
//!
//! let registry = DescriptorRegistry::new()
//!     .with(
//!         RequestDescriptor::builder("drives.info", Method::GET)
//!             .path("/drives/{uuid}/info")
//!             .consumes("text/plain")
//!             .parser("key_values")
//!             .exception_mapper("null_on_not_found")
//!             .filter("basic_auth")
//!             .build()?,
//!     )?;
//! assert!(registry.describe("drives.info").is_ok());
//! # Ok::<(), cloud_lib_rust::descriptor::DescriptorError>(())
//! ```

pub mod error;
pub mod manifest;
pub mod model;
pub mod registry;
pub mod template;

pub use error::DescriptorError;
pub use manifest::ApiManifest;
pub use model::{
    Conversion, DescriptorBuilder, Param, ParamSource, PayloadSource, PayloadSpec,
    RequestDescriptor, Unwrap,
};
pub use registry::DescriptorRegistry;
pub use template::{PathTemplate, PathToken};
