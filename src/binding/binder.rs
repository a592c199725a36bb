//! Turns a descriptor plus concrete arguments into a [`BoundRequest`].
//!
//! Binding reads nothing but its inputs: the same descriptor, arguments and
//! options always produce the same request line, headers and payload.

use bytes::Bytes;
use tracing::trace;
use url::Url;

use super::encoding::encode_component;
use super::options::RequestOptions;
use super::payload::{PayloadInput, SerializerRegistry};
use super::value::ArgValue;
use crate::descriptor::{Conversion, Param, ParamSource, PathToken, PayloadSource, RequestDescriptor};
use crate::request::{BoundRequest, Headers, Payload, QueryParams};
use crate::{Error, ErrorContext, Result};

/// Binds descriptors against one base endpoint.
#[derive(Clone)]
pub struct Binder {
    endpoint: String,
    serializers: SerializerRegistry,
}

impl Binder {
    pub fn new(endpoint: impl Into<String>, serializers: SerializerRegistry) -> Self {
        Self {
            endpoint: endpoint.into(),
            serializers,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    pub fn bind(
        &self,
        descriptor: &RequestDescriptor,
        args: &[ArgValue],
        options: &[RequestOptions],
    ) -> Result<BoundRequest> {
        let cx = BindContext { descriptor, args };

        if !options.is_empty() && !descriptor.accepts_options {
            return Err(cx.error("operation does not accept options", None));
        }

        let endpoint = format!("{}{}", cx.base(&self.endpoint)?, cx.path()?);

        let mut query = QueryParams::new();
        for param in &descriptor.query {
            if let Some(value) = cx.param_value(param, "query")? {
                query.append(param.key.clone(), value);
            }
        }

        let mut headers = Headers::new();
        if let Some(consumes) = &descriptor.consumes {
            headers.append("Accept", consumes.clone());
        }
        for param in &descriptor.headers {
            if let Some(value) = cx.param_value(param, "header")? {
                headers.append(param.key.clone(), value);
            }
        }

        for opt in options {
            for (k, v) in opt.query_params() {
                query.set(k.clone(), v.clone());
            }
            for (k, v) in opt.headers() {
                headers.set(k.clone(), v.clone());
            }
        }

        let payload = self.payload(&cx, options)?;
        if let Some(p) = &payload {
            headers.set("Content-Type", p.content_type.clone());
            if let Some(len) = p.content_length {
                headers.set("Content-Length", len.to_string());
            }
        }

        trace!(
            operation = %descriptor.operation,
            method = %descriptor.method,
            endpoint = %endpoint,
            query_params = query.len(),
            "bound request"
        );

        Ok(BoundRequest {
            operation: descriptor.operation.clone(),
            method: descriptor.method.clone(),
            endpoint,
            query,
            headers,
            payload,
            filters: descriptor.filters.clone(),
            skip_encoding: descriptor.skip_encoding.clone(),
        })
    }

    fn payload(&self, cx: &BindContext<'_>, options: &[RequestOptions]) -> Result<Option<Payload>> {
        let option_fields = options.iter().flat_map(|o| o.payload_fields().iter());

        let spec = match &cx.descriptor.payload {
            Some(spec) => spec,
            None => {
                if option_fields.count() > 0 {
                    return Err(cx.error("operation declares no payload for option fields", None));
                }
                return Ok(None);
            }
        };

        let serializer = self
            .serializers
            .resolve(&spec.serializer, &cx.descriptor.operation)?;

        let body = match &spec.source {
            PayloadSource::Arg(index) => {
                if option_fields.count() > 0 {
                    return Err(cx.error(
                        "option payload fields need a field payload",
                        Some(format!("args[{}]", index)),
                    ));
                }
                let value = cx.arg(*index).filter(|v| !v.is_null()).ok_or_else(|| {
                    cx.error("payload argument is null", Some(format!("args[{}]", index)))
                })?;
                serializer.serialize(PayloadInput::Value(value))
            }
            PayloadSource::Fields(params) => {
                let mut fields: Vec<(String, String)> = Vec::with_capacity(params.len());
                for param in params {
                    if let Some(value) = cx.param_value(param, "payload")? {
                        fields.push((param.key.clone(), value));
                    }
                }
                for (k, v) in option_fields {
                    match fields.iter_mut().find(|(fk, _)| fk == k) {
                        Some(slot) => slot.1 = v.clone(),
                        None => fields.push((k.clone(), v.clone())),
                    }
                }
                serializer.serialize(PayloadInput::Fields(&fields))
            }
        }
        .map_err(|e| cx.annotate(e))?;

        Ok(Some(Payload::new(Bytes::from(body), spec.content_type.clone())))
    }
}

struct BindContext<'a> {
    descriptor: &'a RequestDescriptor,
    args: &'a [ArgValue],
}

impl<'a> BindContext<'a> {
    fn arg(&self, index: usize) -> Option<&'a ArgValue> {
        self.args.get(index)
    }

    fn error(&self, msg: impl Into<String>, field: Option<String>) -> Error {
        let mut ctx = ErrorContext::new()
            .with_operation(self.descriptor.operation.clone())
            .with_source("binder");
        if let Some(field) = field {
            ctx = ctx.with_field_path(field);
        }
        Error::binding(msg, ctx)
    }

    /// Fill in the operation id of errors raised by serializers.
    fn annotate(&self, err: Error) -> Error {
        match err {
            Error::Binding { message, context } if context.operation.is_none() => Error::Binding {
                message,
                context: context.with_operation(self.descriptor.operation.clone()),
            },
            other => other,
        }
    }

    fn base(&self, default: &str) -> Result<String> {
        let Some(index) = self.descriptor.endpoint_arg else {
            return Ok(default.trim_end_matches('/').to_string());
        };
        let field = Some(format!("args[{}]", index));
        let uri = match self.arg(index) {
            Some(ArgValue::Uri(u)) => u.clone(),
            Some(other) => {
                let text = other
                    .to_wire_string()
                    .ok_or_else(|| self.error("endpoint argument is null", field.clone()))?;
                Url::parse(&text).map_err(|e| {
                    self.error(format!("endpoint argument is not an absolute URI: {}", e), field.clone())
                })?
            }
            None => return Err(self.error("missing endpoint argument", field)),
        };
        if uri.query().is_some() || uri.fragment().is_some() {
            return Err(self.error(
                format!("endpoint argument '{}' must not carry a query or fragment", uri),
                field,
            ));
        }
        Ok(uri.as_str().trim_end_matches('/').to_string())
    }

    fn path(&self) -> Result<String> {
        let skip = &self.descriptor.skip_encoding;
        let mut out = String::new();
        for token in self.descriptor.path.tokens() {
            match token {
                PathToken::Literal(lit) => out.push_str(lit),
                PathToken::Placeholder { name, arg } => {
                    let value = self
                        .arg(*arg)
                        .and_then(ArgValue::to_wire_string)
                        .ok_or_else(|| {
                            self.error(
                                format!("no value for path placeholder '{{{}}}'", name),
                                Some(format!("args[{}]", arg)),
                            )
                        })?;
                    out.push_str(&encode_component(&value, skip));
                }
            }
        }
        if !out.is_empty() && !out.starts_with('/') {
            out.insert(0, '/');
        }
        Ok(out)
    }

    /// Resolve one parameter to its wire string. `None` omits it.
    fn param_value(&self, param: &Param, section: &str) -> Result<Option<String>> {
        let (index, required, conversion) = match &param.source {
            ParamSource::Fixed(v) => return Ok(Some(v.clone())),
            ParamSource::Arg {
                index,
                required,
                conversion,
            } => (*index, *required, conversion),
        };
        let field = || format!("{}.{}", section, param.key);

        let value = match self.arg(index) {
            Some(v) if !v.is_null() => v,
            _ if required => {
                return Err(self.error(
                    format!("required argument {} for '{}' is null", index, param.key),
                    Some(field()),
                ))
            }
            _ => return Ok(None),
        };

        let text = value
            .to_wire_string()
            .ok_or_else(|| self.error("argument has no wire form", Some(field())))?;

        if let Conversion::Enum(allowed) = conversion {
            let is_enum_like = matches!(value, ArgValue::Enum(_) | ArgValue::Str(_));
            if !is_enum_like || !allowed.iter().any(|a| a == &text) {
                return Err(self.error(
                    format!(
                        "malformed enum argument '{}', expected one of: {}",
                        text,
                        allowed.join(", ")
                    ),
                    Some(field()),
                ));
            }
        }
        Ok(Some(text))
    }
}
