//! Raw API description structs for serde deserialization.
//!
//! Covers the subset of OpenAPI 3.x and Swagger 2.x needed to derive endpoints and their
//! schemas. Maps are `IndexMap`s so document order survives parsing.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{GenError, Result};

/// HTTP method keys recognised inside a path item.
pub const OPERATION_KEYS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// Root of a parsed API description.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    /// OpenAPI 3.x version string.
    #[serde(default, deserialize_with = "version_string")]
    pub openapi: Option<String>,
    /// Swagger 2.x version string.
    #[serde(default, deserialize_with = "version_string")]
    pub swagger: Option<String>,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    pub components: Option<Components>,
    /// Swagger 2.x schema definitions.
    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,
    /// Swagger 2.x reusable parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    /// Swagger 2.x reusable responses.
    #[serde(default)]
    pub responses: IndexMap<String, ResponseOrRef>,
    /// Document-wide security requirements.
    pub security: Option<Vec<SecurityRequirement>>,
}

/// One security requirement object: scheme name → scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

#[derive(Debug, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default)]
    pub responses: IndexMap<String, ResponseOrRef>,
    #[serde(default, rename = "requestBodies")]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,
}

/// A path item. Operations stay as raw JSON until normalization so that the method keys
/// keep their document order alongside unrelated keys (`summary`, `servers`, ...).
#[derive(Debug, Deserialize)]
pub struct PathItem {
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    #[serde(flatten)]
    pub entries: IndexMap<String, Value>,
}

impl PathItem {
    /// Operations of this path item in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .filter(|(key, _)| OPERATION_KEYS.contains(&key.to_ascii_lowercase().as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }
}

/// An API operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    pub request_body: Option<RequestBodyOrRef>,
    #[serde(default)]
    pub responses: IndexMap<String, ResponseOrRef>,
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(rename = "x-public")]
    pub x_public: Option<bool>,
}

/// A parameter given inline or as a reference into the reusable parameters.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Inline(Parameter),
}

/// A parameter (path, query, header, cookie, 2.x body or formData).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Schema>,

    // Swagger 2.x non-body parameters describe their type inline.
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub format: Option<String>,
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

impl Parameter {
    /// The schema describing this parameter's value, whichever version shape it uses.
    pub fn effective_schema(&self) -> Schema {
        if let Some(schema) = &self.schema {
            return schema.clone();
        }
        Schema {
            schema_type: Some(SchemaType::Single(
                self.param_type.clone().unwrap_or_else(|| "string".to_string()),
            )),
            format: self.format.clone(),
            items: self.items.clone(),
            enum_values: self.enum_values.clone(),
            ..Schema::default()
        }
    }
}

/// A request body given inline or as a reference into `components/requestBodies`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RequestBodyOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Inline(RequestBody),
}

/// A 3.x request body definition.
#[derive(Debug, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response given inline or as a reference into the reusable responses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponseOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Inline(Response),
}

/// A response definition.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub content: Option<IndexMap<String, MediaType>>,
    /// Swagger 2.x response schema.
    pub schema: Option<Schema>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Deserialize)]
pub struct MediaType {
    pub schema: Option<Schema>,
}

/// JSON Schema definition used by both document versions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    pub properties: Option<IndexMap<String, Schema>>,

    pub required: Option<Vec<String>>,

    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,

    pub any_of: Option<Vec<Schema>>,

    pub one_of: Option<Vec<Schema>>,

    pub all_of: Option<Vec<Schema>>,

    pub additional_properties: Option<AdditionalProperties>,

    /// Format hint (e.g., date-time, uuid, email).
    pub format: Option<String>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,

    /// Swagger 2.x nullable extension.
    #[serde(rename = "x-nullable")]
    pub x_nullable: Option<bool>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// Which family of the format a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    Swagger2,
    OpenApi3,
}

impl SpecDocument {
    /// Parse a document from JSON or YAML text.
    ///
    /// `source_name` only feeds error messages.
    pub fn parse(text: &str, source_name: &str) -> Result<Self> {
        let trimmed = text.trim_start();
        let value = if trimmed.starts_with('{') {
            serde_json::from_str::<Value>(text).map_err(|e| GenError::parse(source_name, e))?
        } else {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| GenError::parse(source_name, e))?;
            yaml_to_json(yaml)
        };
        Self::from_value(value, source_name)
    }

    /// Build a document from an already-parsed JSON value.
    pub fn from_value(value: Value, source_name: &str) -> Result<Self> {
        if !value.is_object() {
            return Err(GenError::parse(source_name, "document root is not an object"));
        }
        let doc: SpecDocument =
            serde_json::from_value(value).map_err(|e| GenError::parse(source_name, e))?;
        doc.version()
            .ok_or_else(|| GenError::parse(source_name, "missing 'openapi' or 'swagger' version field"))?;
        Ok(doc)
    }

    pub fn version(&self) -> Option<SpecVersion> {
        match (&self.openapi, &self.swagger) {
            (Some(v), _) if v.starts_with('3') => Some(SpecVersion::OpenApi3),
            (_, Some(v)) if v.starts_with('2') => Some(SpecVersion::Swagger2),
            _ => None,
        }
    }

    /// All named schemas, 3.x components first, then 2.x definitions.
    pub fn schema_definitions(&self) -> IndexMap<String, Schema> {
        let mut defs = IndexMap::new();
        if let Some(components) = &self.components {
            for (name, schema) in &components.schemas {
                defs.insert(name.clone(), schema.clone());
            }
        }
        for (name, schema) in &self.definitions {
            defs.entry(name.clone()).or_insert_with(|| schema.clone());
        }
        defs
    }

    /// Look up a reusable parameter by `$ref`.
    pub fn resolve_parameter(&self, ref_path: &str) -> Option<&Parameter> {
        if let Some(name) = ref_path.strip_prefix("#/components/parameters/") {
            return self.components.as_ref()?.parameters.get(name);
        }
        let name = ref_path.strip_prefix("#/parameters/")?;
        self.parameters.get(name)
    }

    /// Look up a reusable request body by `$ref`.
    pub fn resolve_request_body(&self, ref_path: &str) -> Option<&RequestBodyOrRef> {
        let name = ref_path.strip_prefix("#/components/requestBodies/")?;
        self.components.as_ref()?.request_bodies.get(name)
    }

    /// Look up a reusable response by `$ref`.
    pub fn resolve_response(&self, ref_path: &str) -> Option<&ResponseOrRef> {
        if let Some(name) = ref_path.strip_prefix("#/components/responses/") {
            return self.components.as_ref()?.responses.get(name);
        }
        let name = ref_path.strip_prefix("#/responses/")?;
        self.responses.get(name)
    }
}

impl Schema {
    /// Check if this schema is nullable (nullable flag, type array, or null in anyOf).
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) || self.x_nullable == Some(true) {
            return true;
        }

        if let Some(SchemaType::Multiple(types)) = &self.schema_type
            && types.iter().any(|t| t == "null")
        {
            return true;
        }

        false
    }

    /// True for `{ "type": "null" }`.
    pub fn is_null_type(&self) -> bool {
        matches!(&self.schema_type, Some(SchemaType::Single(t)) if t == "null")
    }
}

/// Unquoted YAML versions (`swagger: 2.0`) arrive as numbers.
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    }))
}

/// YAML mappings may use non-string keys (`200:` for status codes); JSON needs strings.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = serde_json::Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => serde_yaml::to_string(&other)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                };
                object.insert(key, yaml_to_json(value));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_with_numeric_status_keys() {
        let yaml = r#"
openapi: 3.0.3
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        200:
          description: OK
          content:
            application/json:
              schema:
                type: array
                items:
                  type: string
"#;
        let doc = SpecDocument::parse(yaml, "pets.yaml").unwrap();
        assert_eq!(doc.version(), Some(SpecVersion::OpenApi3));
        let item = &doc.paths["/pets"];
        let (method, op) = item.operations().next().unwrap();
        assert_eq!(method, "get");
        let op: Operation = serde_json::from_value(op.clone()).unwrap();
        assert!(op.responses.contains_key("200"));
    }

    #[test]
    fn test_missing_version_is_parse_error() {
        let err = SpecDocument::parse(r#"{ "paths": {} }"#, "inline").unwrap_err();
        assert_eq!(err.kind(), "SpecParseError");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = SpecDocument::parse(r#"{ "openapi": "3.1.0", "paths": "#, "inline").unwrap_err();
        assert_eq!(err.kind(), "SpecParseError");
    }

    #[test]
    fn test_operations_keep_document_order() {
        let doc = SpecDocument::parse(
            r#"{
  "openapi": "3.1.0",
  "paths": {
    "/b": { "summary": "b", "post": { "responses": {} }, "get": { "responses": {} } },
    "/a": { "delete": { "responses": {} } }
  }
}"#,
            "inline",
        )
        .unwrap();
        let paths: Vec<_> = doc.paths.keys().map(String::as_str).collect();
        assert_eq!(paths, ["/b", "/a"]);
        let methods: Vec<_> = doc.paths["/b"].operations().map(|(m, _)| m).collect();
        assert_eq!(methods, ["post", "get"]);
    }

    #[test]
    fn test_swagger_parameter_effective_schema() {
        let param: Parameter = serde_json::from_str(
            r#"{ "name": "tags", "in": "query", "type": "array", "items": { "type": "string" } }"#,
        )
        .unwrap();
        let schema = param.effective_schema();
        assert!(matches!(schema.schema_type, Some(SchemaType::Single(ref t)) if t == "array"));
        assert!(schema.items.is_some());
    }
}
