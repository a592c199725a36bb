//! # cloud-lib-rust
//!
//! Declarative request binding and asynchronous dispatch for multi-provider
//! cloud APIs.
//!
//! ## Overview
//!
//! Every provider operation is described once by a [`RequestDescriptor`]: verb,
//! path template, query parameters, headers, payload, filters, response parser
//! and exception mapper. Invoking an operation binds the descriptor to the
//! caller's arguments, runs the request filters, dispatches the request on
//! the tokio runtime and resolves the raw response into a [`Resolution`].
//!
//! ## Core Philosophy
//!
//! - **Descriptor-Driven**: operations are data, registered in code or loaded from YAML manifests
//! - **Pure Binding**: the same descriptor, arguments and options always yield the same request
//! - **Explicit State**: filters read credentials and time from a per-call snapshot
//! - **Typed Failures**: binding, filter, timeout, transport and response faults are distinct
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloud_lib_rust::descriptor::RequestDescriptor;
//! use cloud_lib_rust::filter::Credentials;
//! use cloud_lib_rust::{ArgValue, RestClient};
//! use reqwest::Method;
//!
//! #[tokio::main]
//! async fn main() -> cloud_lib_rust::Result<()> {
//!     let client = RestClient::builder()
//!         .endpoint("https://api.cloudsigma.com")
//!         .credentials(Credentials::new("user", "secret"))
//!         .descriptor(
//!             RequestDescriptor::builder("drives.info", Method::GET)
//!                 .path("/drives/{uuid}/info")
//!                 .consumes("text/plain")
//!                 .parser("key_values")
//!                 .exception_mapper("null_on_not_found")
//!                 .filter("basic_auth")
//!                 .build()?,
//!         )
//!         .build()?;
//!
//!     let drive = client
//!         .invoke_with_retry("drives.info", &[ArgValue::from("uuid")], &[])
//!         .await?;
//!     println!("{:?}", drive.into_value());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`descriptor`] | Descriptors, path templates, registry, YAML manifests |
//! | [`binding`] | Arguments, options, percent-encoding, payload serializers |
//! | [`request`] | The bound request value |
//! | [`filter`] | Request filters, credentials, clocks |
//! | [`transport`] | Transport trait and the reqwest transport |
//! | [`dispatch`] | Non-blocking dispatch with cancellable handles |
//! | [`response`] | Parsers, exception mappers, resolution |
//! | [`resilience`] | Retry on timeout |
//! | [`client`] | `RestClient` and its builder |

pub mod binding;
pub mod client;
pub mod descriptor;
pub mod dispatch;
pub mod filter;
pub mod registry;
pub mod request;
pub mod resilience;
pub mod response;
pub mod transport;
pub mod utils;

// Re-export main types for convenience
pub use binding::{ArgValue, RequestOptions, WireName};
pub use client::{ClientConfig, PendingCall, RestClient, RestClientBuilder};
pub use descriptor::{DescriptorError, RequestDescriptor};
pub use dispatch::{CancelHandle, DispatchHandle, HandleState};
pub use request::BoundRequest;
pub use response::Resolution;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
