//! Declarative API manifest (YAML or JSON) that produces descriptors.
//!
//! ```yaml
//! id: cloudstack
//! endpoint: http://localhost:8080/client/api
//! defaults:
//!   filters: [query_signer]
//!   query: [{ key: response, value: json }]
//!   skip_encoding: "/,"
//! operations:
//!   - id: iso.getISO
//!     method: GET
//!     consumes: application/json
//!     query:
//!       - { key: command, value: listISOs }
//!       - { key: id, arg: 0 }
//!     parser: json
//!     unwrap: { path: "listisosresponse.iso[0]" }
//! ```

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::DescriptorError;
use super::model::{
    Conversion, DescriptorBuilder, Param, ParamSource, PayloadSource, PayloadSpec,
    RequestDescriptor, Unwrap,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiManifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base endpoint for clients built from this manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub defaults: OperationDefaults,
    pub operations: Vec<OperationDef>,
}

/// Settings applied to every operation, the way interface-level annotations
/// apply to every method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationDefaults {
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub query: Vec<ParamDef>,
    #[serde(default)]
    pub headers: Vec<ParamDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_encoding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDef {
    pub id: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_params: Vec<PathParamDef>,
    #[serde(default)]
    pub query: Vec<ParamDef>,
    #[serde(default)]
    pub headers: Vec<ParamDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_arg: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_mapper: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unwrap: Option<UnwrapDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_encoding: Option<String>,
    /// Whether callers may pass option objects.
    #[serde(default)]
    pub options: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathParamDef {
    pub name: String,
    pub arg: usize,
}

/// `{ key, value }` for a fixed parameter, `{ key, arg }` for one filled from
/// a positional argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<usize>,
    #[serde(default)]
    pub optional: bool,
    /// Allowed wire names for enum arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<usize>,
    #[serde(default)]
    pub fields: Vec<ParamDef>,
    pub serializer: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnwrapDef {
    Path { path: String },
    Depth { depth: usize },
}

impl ApiManifest {
    pub fn from_yaml_str(content: &str) -> Result<Self, DescriptorError> {
        serde_yaml::from_str(content).map_err(|e| DescriptorError::YamlError(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> Result<Self, DescriptorError> {
        serde_json::from_str(content).map_err(|e| DescriptorError::LoadError {
            path: "<inline json>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a manifest file; `.json` is parsed as JSON, anything else as YAML.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DescriptorError::LoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            serde_json::from_str(&content).map_err(|e| DescriptorError::LoadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Convert every operation into a descriptor, applying manifest defaults.
    pub fn descriptors(&self) -> Result<Vec<RequestDescriptor>, DescriptorError> {
        self.operations.iter().map(|op| self.descriptor(op)).collect()
    }

    fn descriptor(&self, op: &OperationDef) -> Result<RequestDescriptor, DescriptorError> {
        let method = Method::from_bytes(op.method.to_uppercase().as_bytes()).map_err(|_| {
            DescriptorError::Invalid {
                id: op.id.clone(),
                reason: format!("unsupported HTTP method '{}'", op.method),
            }
        })?;

        let mut builder = DescriptorBuilder::new(op.id.clone(), method).path(op.path.clone());
        for pp in &op.path_params {
            builder = builder.path_param(pp.name.clone(), pp.arg);
        }
        for def in self.defaults.query.iter().chain(op.query.iter()) {
            builder = builder.query_param(def.to_param(&op.id)?);
        }
        for def in self.defaults.headers.iter().chain(op.headers.iter()) {
            builder = builder.header_param(def.to_param(&op.id)?);
        }
        if let Some(consumes) = op.consumes.as_ref().or(self.defaults.consumes.as_ref()) {
            builder = builder.consumes(consumes.clone());
        }
        if let Some(payload) = &op.payload {
            builder = builder.payload(payload.to_spec(&op.id)?);
        }
        if let Some(arg) = op.endpoint_arg {
            builder = builder.endpoint_arg(arg);
        }
        if let Some(parser) = &op.parser {
            builder = builder.parser(parser.clone());
        }
        if let Some(mapper) = &op.exception_mapper {
            builder = builder.exception_mapper(mapper.clone());
        }

        let mut filters = self.defaults.filters.clone();
        for f in &op.filters {
            if !filters.contains(f) {
                filters.push(f.clone());
            }
        }
        builder = builder.filters(filters);

        if let Some(unwrap) = &op.unwrap {
            builder = builder.unwrap(match unwrap {
                UnwrapDef::Path { path } => Unwrap::Path(path.clone()),
                UnwrapDef::Depth { depth } => Unwrap::Depth(*depth),
            });
        }
        if let Some(skip) = op
            .skip_encoding
            .as_ref()
            .or(self.defaults.skip_encoding.as_ref())
        {
            builder = builder.skip_encoding(skip.chars());
        }

        builder.accepts_options(op.options).build()
    }
}

impl ParamDef {
    fn to_param(&self, operation: &str) -> Result<Param, DescriptorError> {
        let source = match (&self.value, self.arg) {
            (Some(v), None) => ParamSource::Fixed(v.clone()),
            (None, Some(index)) => ParamSource::Arg {
                index,
                required: !self.optional,
                conversion: match &self.values {
                    Some(values) => Conversion::Enum(values.clone()),
                    None => Conversion::Plain,
                },
            },
            _ => {
                return Err(DescriptorError::Invalid {
                    id: operation.to_string(),
                    reason: format!(
                        "parameter '{}' needs exactly one of 'value' or 'arg'",
                        self.key
                    ),
                })
            }
        };
        Ok(Param {
            key: self.key.clone(),
            source,
        })
    }
}

impl PayloadDef {
    fn to_spec(&self, operation: &str) -> Result<PayloadSpec, DescriptorError> {
        let source = match self.arg {
            Some(index) if self.fields.is_empty() => PayloadSource::Arg(index),
            None => PayloadSource::Fields(
                self.fields
                    .iter()
                    .map(|f| f.to_param(operation))
                    .collect::<Result<_, _>>()?,
            ),
            Some(_) => {
                return Err(DescriptorError::Invalid {
                    id: operation.to_string(),
                    reason: "payload declares both 'arg' and 'fields'".to_string(),
                })
            }
        };
        Ok(PayloadSpec {
            source,
            serializer: self.serializer.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
id: cloudstack
endpoint: http://localhost:8080/client/api
defaults:
  filters: [query_signer]
  query:
    - { key: response, value: json }
  skip_encoding: "/,"
operations:
  - id: iso.getISO
    consumes: application/json
    query:
      - { key: command, value: listISOs }
      - { key: id, arg: 0 }
    parser: json
    unwrap: { path: "listisosresponse.iso[0]" }
  - id: iso.extractISO
    query:
      - { key: command, value: extractISO }
      - { key: id, arg: 0 }
      - { key: mode, arg: 1, values: [HTTP_DOWNLOAD, FTP_UPLOAD] }
    options: true
    unwrap: { depth: 1 }
"#;

    #[test]
    fn test_defaults_apply_before_operation_params() {
        let manifest = ApiManifest::from_yaml_str(MANIFEST).unwrap();
        let descriptors = manifest.descriptors().unwrap();
        let get = &descriptors[0];
        assert_eq!(get.method, Method::GET);
        assert_eq!(get.query[0], Param::fixed("response", "json"));
        assert_eq!(get.query[1], Param::fixed("command", "listISOs"));
        assert_eq!(get.query[2], Param::arg("id", 0));
        assert_eq!(get.filters, vec!["query_signer".to_string()]);
        assert_eq!(get.skip_encoding, vec!['/', ',']);
        assert_eq!(
            get.unwrap,
            Some(Unwrap::Path("listisosresponse.iso[0]".into()))
        );
    }

    #[test]
    fn test_enum_and_options() {
        let manifest = ApiManifest::from_yaml_str(MANIFEST).unwrap();
        let extract = &manifest.descriptors().unwrap()[1];
        assert!(extract.accepts_options);
        assert_eq!(extract.unwrap, Some(Unwrap::Depth(1)));
        assert_eq!(
            extract.query[3],
            Param::enum_arg("mode", 1, ["HTTP_DOWNLOAD", "FTP_UPLOAD"])
        );
    }

    #[test]
    fn test_param_needs_one_source() {
        let bad = r#"
id: x
operations:
  - id: broken
    query:
      - { key: id }
"#;
        let manifest = ApiManifest::from_yaml_str(bad).unwrap();
        assert!(matches!(
            manifest.descriptors(),
            Err(DescriptorError::Invalid { .. })
        ));
    }
}
