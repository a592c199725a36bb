//! The request descriptor: static metadata describing how one logical
//! operation maps onto an HTTP request template.

use reqwest::Method;

use super::error::DescriptorError;
use super::template::PathTemplate;

/// How an argument value is turned into its wire string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Conversion {
    /// Numbers, booleans and strings in their natural text form.
    #[default]
    Plain,
    /// Only the listed wire names are accepted.
    Enum(Vec<String>),
}

/// Where the value of a query parameter, header or payload field comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    Fixed(String),
    Arg {
        index: usize,
        /// A null or missing required argument is a binding error; an
        /// optional one omits the parameter entirely.
        required: bool,
        conversion: Conversion,
    },
}

/// A named parameter with its value source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub source: ParamSource,
}

impl Param {
    pub fn fixed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: ParamSource::Fixed(value.into()),
        }
    }

    pub fn arg(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            source: ParamSource::Arg {
                index,
                required: true,
                conversion: Conversion::Plain,
            },
        }
    }

    pub fn optional_arg(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            source: ParamSource::Arg {
                index,
                required: false,
                conversion: Conversion::Plain,
            },
        }
    }

    pub fn enum_arg<I, S>(key: impl Into<String>, index: usize, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            source: ParamSource::Arg {
                index,
                required: true,
                conversion: Conversion::Enum(values.into_iter().map(Into::into).collect()),
            },
        }
    }
}

/// What the payload serializer is fed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// One designated positional argument, e.g. a domain object.
    Arg(usize),
    /// Named fields collected from arguments; options may add or override
    /// fields by key.
    Fields(Vec<Param>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSpec {
    pub source: PayloadSource,
    /// Serializer id, resolved through the serializer registry.
    pub serializer: String,
    pub content_type: String,
}

/// Extraction of a sub-element from a response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unwrap {
    /// Dot path such as `listisosresponse.iso[0]`.
    Path(String),
    /// Descend through this many single-key objects.
    Depth(usize),
}

/// Immutable description of one operation. Built once at registration and
/// shared read-only by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub operation: String,
    pub method: Method,
    pub path: PathTemplate,
    pub query: Vec<Param>,
    pub headers: Vec<Param>,
    /// Accepted response media type, sent as `Accept`.
    pub consumes: Option<String>,
    pub payload: Option<PayloadSpec>,
    /// Positional argument holding an absolute endpoint URI that replaces the
    /// client's base endpoint.
    pub endpoint_arg: Option<usize>,
    pub parser: String,
    pub exception_mapper: Option<String>,
    pub filters: Vec<String>,
    pub unwrap: Option<Unwrap>,
    /// Characters left literal when percent-encoding path and query values.
    pub skip_encoding: Vec<char>,
    pub accepts_options: bool,
}

impl RequestDescriptor {
    pub fn builder(operation: impl Into<String>, method: Method) -> DescriptorBuilder {
        DescriptorBuilder::new(operation, method)
    }
}

/// Builder for [`RequestDescriptor`]. Template parsing and consistency checks
/// are deferred to [`DescriptorBuilder::build`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    operation: String,
    method: Method,
    path: String,
    path_params: Vec<(String, usize)>,
    query: Vec<Param>,
    headers: Vec<Param>,
    consumes: Option<String>,
    payload: Option<PayloadSpec>,
    endpoint_arg: Option<usize>,
    parser: Option<String>,
    exception_mapper: Option<String>,
    filters: Vec<String>,
    unwrap: Option<Unwrap>,
    skip_encoding: Vec<char>,
    accepts_options: bool,
}

impl DescriptorBuilder {
    pub fn new(operation: impl Into<String>, method: Method) -> Self {
        Self {
            operation: operation.into(),
            method,
            path: String::new(),
            path_params: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            consumes: None,
            payload: None,
            endpoint_arg: None,
            parser: None,
            exception_mapper: None,
            filters: Vec::new(),
            unwrap: None,
            skip_encoding: Vec::new(),
            accepts_options: false,
        }
    }

    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.path = template.into();
        self
    }

    /// Bind placeholder `name` to positional argument `index` instead of its
    /// declaration-order default.
    pub fn path_param(mut self, name: impl Into<String>, index: usize) -> Self {
        self.path_params.push((name.into(), index));
        self
    }

    pub fn query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_param(Param::fixed(key, value))
    }

    pub fn query_param(mut self, param: Param) -> Self {
        self.query.push(param);
        self
    }

    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_param(Param::fixed(name, value))
    }

    pub fn header_param(mut self, param: Param) -> Self {
        self.headers.push(param);
        self
    }

    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes = Some(media_type.into());
        self
    }

    pub fn payload(mut self, spec: PayloadSpec) -> Self {
        self.payload = Some(spec);
        self
    }

    pub fn payload_arg(
        self,
        index: usize,
        serializer: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.payload(PayloadSpec {
            source: PayloadSource::Arg(index),
            serializer: serializer.into(),
            content_type: content_type.into(),
        })
    }

    pub fn payload_fields(
        self,
        fields: Vec<Param>,
        serializer: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.payload(PayloadSpec {
            source: PayloadSource::Fields(fields),
            serializer: serializer.into(),
            content_type: content_type.into(),
        })
    }

    pub fn endpoint_arg(mut self, index: usize) -> Self {
        self.endpoint_arg = Some(index);
        self
    }

    pub fn parser(mut self, id: impl Into<String>) -> Self {
        self.parser = Some(id.into());
        self
    }

    pub fn exception_mapper(mut self, id: impl Into<String>) -> Self {
        self.exception_mapper = Some(id.into());
        self
    }

    pub fn filter(mut self, id: impl Into<String>) -> Self {
        self.filters.push(id.into());
        self
    }

    pub fn filters<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn unwrap(mut self, unwrap: Unwrap) -> Self {
        self.unwrap = Some(unwrap);
        self
    }

    pub fn skip_encoding(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        for c in chars {
            if !self.skip_encoding.contains(&c) {
                self.skip_encoding.push(c);
            }
        }
        self
    }

    pub fn accepts_options(mut self, accepts: bool) -> Self {
        self.accepts_options = accepts;
        self
    }

    pub fn build(self) -> Result<RequestDescriptor, DescriptorError> {
        if self.operation.trim().is_empty() {
            return Err(DescriptorError::Invalid {
                id: self.operation,
                reason: "operation id must not be empty".to_string(),
            });
        }

        let mut path = PathTemplate::parse(&self.path)?;
        for (name, index) in &self.path_params {
            if !path.rebind(name, *index) {
                return Err(DescriptorError::Invalid {
                    id: self.operation,
                    reason: format!("path parameter '{}' does not appear in '{}'", name, self.path),
                });
            }
        }

        for param in self.query.iter().chain(self.headers.iter()) {
            if param.key.is_empty() {
                return Err(DescriptorError::Invalid {
                    id: self.operation,
                    reason: "parameter keys must not be empty".to_string(),
                });
            }
        }

        Ok(RequestDescriptor {
            operation: self.operation,
            method: self.method,
            path,
            query: self.query,
            headers: self.headers,
            consumes: self.consumes,
            payload: self.payload,
            endpoint_arg: self.endpoint_arg,
            parser: self
                .parser
                .unwrap_or_else(|| crate::response::ReleasePayload::ID.to_string()),
            exception_mapper: self.exception_mapper,
            filters: self.filters,
            unwrap: self.unwrap,
            skip_encoding: self.skip_encoding,
            accepts_options: self.accepts_options,
        })
    }
}
