//! Argument binding.
//!
//! A [`Binder`] turns a [`RequestDescriptor`](crate::descriptor::RequestDescriptor)
//! and positional [`ArgValue`]s into a [`BoundRequest`](crate::request::BoundRequest).
//! Option contributions ([`RequestOptions`]) are applied after the
//! descriptor's own parameters with last-write-wins per key.

pub mod binder;
pub mod encoding;
pub mod options;
pub mod payload;
pub mod value;

pub use binder::Binder;
pub use encoding::encode_component;
pub use options::RequestOptions;
pub use payload::{
    default_serializers, FormPayload, JsonPayload, KeyValuesPayload, PayloadInput,
    PayloadSerializer, RawPayload, SerializerRegistry,
};
pub use value::{ArgValue, WireName};
