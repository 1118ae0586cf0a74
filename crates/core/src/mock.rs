//! Deterministic mock data synthesis from resolved schemas.

use serde_json::{Map, Number, Value, json};

use crate::config::MockConfig;
use crate::openapi::{Endpoint, HttpMethod, PrimitiveKind, SchemaNode};

/// A canned response for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
    pub latency_ms: u64,
}

/// A mock keyed by the endpoint's route key (`POST /users`).
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointMock {
    pub route: String,
    pub endpoint_id: String,
    pub response: MockResponse,
}

#[derive(Debug, Clone, Copy)]
pub struct MockSynthesizer {
    options: MockConfig,
}

impl MockSynthesizer {
    pub fn new(options: MockConfig) -> Self {
        Self { options }
    }

    /// Synthesize a value shaped like `node`.
    pub fn synthesize(&self, node: &SchemaNode) -> Value {
        self.value(node, None, 0)
    }

    pub fn response_for(&self, endpoint: &Endpoint) -> MockResponse {
        let status = if endpoint.method == HttpMethod::Post { 201 } else { 200 };
        MockResponse {
            status,
            body: endpoint
                .response
                .as_ref()
                .map_or(Value::Null, |node| self.synthesize(node)),
            latency_ms: self.options.latency_ms,
        }
    }

    pub fn mock_endpoints(&self, endpoints: &[Endpoint]) -> Vec<EndpointMock> {
        endpoints
            .iter()
            .map(|endpoint| EndpointMock {
                route: endpoint.route_key(),
                endpoint_id: endpoint.id.clone(),
                response: self.response_for(endpoint),
            })
            .collect()
    }

    /// `field` is the enclosing property name, `index` the enclosing array position.
    fn value(&self, node: &SchemaNode, field: Option<&str>, index: usize) -> Value {
        match node {
            SchemaNode::Primitive {
                kind,
                format,
                enum_values,
            } => {
                if let Some(first) = enum_values.first() {
                    return first.clone();
                }
                primitive(*kind, format.as_deref(), field, index)
            }
            SchemaNode::Array(element) => Value::Array(
                (0..self.options.array_len)
                    .map(|i| self.value(element, field, i))
                    .collect(),
            ),
            SchemaNode::Object(object) => {
                let mut map = Map::new();
                for (name, field_node) in &object.fields {
                    map.insert(name.clone(), self.value(field_node, Some(name), index));
                }
                Value::Object(map)
            }
            SchemaNode::Map(value) => {
                let mut map = Map::new();
                map.insert("key".to_string(), self.value(value, Some("key"), index));
                Value::Object(map)
            }
            SchemaNode::Union(variants) => variants
                .iter()
                .find(|v| !is_null(v))
                .or_else(|| variants.first())
                .map_or(Value::Null, |v| self.value(v, field, index)),
            SchemaNode::Nullable(inner) => self.value(inner, field, index),
            SchemaNode::Named { node, .. } => self.value(node, field, index),
            SchemaNode::Cyclic { .. } => Value::Null,
        }
    }
}

fn is_null(node: &SchemaNode) -> bool {
    matches!(
        node,
        SchemaNode::Primitive {
            kind: PrimitiveKind::Null,
            ..
        }
    )
}

fn primitive(kind: PrimitiveKind, format: Option<&str>, field: Option<&str>, index: usize) -> Value {
    let n = index + 1;
    match kind {
        PrimitiveKind::String => Value::String(sample_string(format, field, n)),
        PrimitiveKind::Integer => {
            if field.is_some_and(is_id_field) {
                json!(n)
            } else {
                json!(n * 10)
            }
        }
        PrimitiveKind::Number => Number::from_f64(n as f64 * 1.5).map_or(Value::Null, Value::Number),
        PrimitiveKind::Boolean => Value::Bool(index % 2 == 0),
        PrimitiveKind::Null | PrimitiveKind::Unknown => Value::Null,
    }
}

fn sample_string(format: Option<&str>, field: Option<&str>, n: usize) -> String {
    let field_lower = field.map(str::to_ascii_lowercase).unwrap_or_default();
    let format = match format {
        Some(format) => Some(format),
        None if field_lower.contains("email") => Some("email"),
        None if field_lower.ends_with("url") || field_lower.ends_with("uri") => Some("uri"),
        None => None,
    };
    let day = (n - 1) % 28 + 1;

    match format {
        Some("email") => format!("user{n}@example.com"),
        Some("date") => format!("2024-01-{day:02}"),
        Some("date-time") => format!("2024-01-{day:02}T12:00:00Z"),
        Some("uuid") => format!("00000000-0000-4000-8000-{n:012}"),
        Some("uri" | "url") => format!("https://example.com/{}/{n}", field.unwrap_or("items")),
        Some("hostname") => format!("host{n}.example.com"),
        Some("ipv4") => format!("192.0.2.{}", n % 255),
        Some("byte") => "c2FtcGxl".to_string(),
        _ => match field {
            Some(name) => format!("{name} {n}"),
            None => format!("string {n}"),
        },
    }
}

fn is_id_field(name: &str) -> bool {
    name.eq_ignore_ascii_case("id") || name.ends_with("Id") || name.ends_with("_id")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::openapi::{AuthDecision, BodyEncoding, ObjectNode};

    fn string() -> SchemaNode {
        SchemaNode::primitive(PrimitiveKind::String)
    }

    fn formatted(format: &str) -> SchemaNode {
        SchemaNode::Primitive {
            kind: PrimitiveKind::String,
            format: Some(format.to_string()),
            enum_values: Vec::new(),
        }
    }

    fn user() -> SchemaNode {
        let mut object = ObjectNode::default();
        object
            .fields
            .insert("id".into(), SchemaNode::primitive(PrimitiveKind::Integer));
        object.fields.insert("name".into(), string());
        object.fields.insert("email".into(), formatted("email"));
        object.required.insert("id".into());
        SchemaNode::Named {
            name: "User".into(),
            node: Box::new(SchemaNode::Object(object)),
        }
    }

    fn endpoint(method: HttpMethod, response: Option<SchemaNode>) -> Endpoint {
        Endpoint {
            path: "/users".into(),
            method,
            id: "users".into(),
            summary: None,
            parameters: Vec::new(),
            body_encoding: BodyEncoding::Json,
            response,
            requires_auth: true,
            auth_decision: AuthDecision::Default,
        }
    }

    #[test]
    fn test_array_of_objects() {
        let synth = MockSynthesizer::new(MockConfig::default());
        let value = synth.synthesize(&SchemaNode::Array(Box::new(user())));
        assert_eq!(
            value,
            json!([
                { "id": 1, "name": "name 1", "email": "user1@example.com" },
                { "id": 2, "name": "name 2", "email": "user2@example.com" },
                { "id": 3, "name": "name 3", "email": "user3@example.com" }
            ])
        );
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let synth = MockSynthesizer::new(MockConfig::default());
        let node = SchemaNode::Array(Box::new(user()));
        assert_eq!(synth.synthesize(&node), synth.synthesize(&node));
    }

    #[test]
    fn test_formats() {
        let synth = MockSynthesizer::new(MockConfig::default());
        assert_eq!(synth.synthesize(&formatted("date")), json!("2024-01-01"));
        assert_eq!(
            synth.synthesize(&formatted("date-time")),
            json!("2024-01-01T12:00:00Z")
        );
        assert_eq!(
            synth.synthesize(&formatted("uuid")),
            json!("00000000-0000-4000-8000-000000000001")
        );
        assert_eq!(synth.synthesize(&formatted("ipv4")), json!("192.0.2.1"));
        assert_eq!(
            synth.synthesize(&formatted("hostname")),
            json!("host1.example.com")
        );
    }

    #[test]
    fn test_enum_nullable_union_and_cycles() {
        let synth = MockSynthesizer::new(MockConfig::default());
        let status = SchemaNode::Primitive {
            kind: PrimitiveKind::String,
            format: None,
            enum_values: vec![json!("active"), json!("disabled")],
        };
        assert_eq!(synth.synthesize(&status), json!("active"));
        assert_eq!(
            synth.synthesize(&SchemaNode::Nullable(Box::new(SchemaNode::primitive(
                PrimitiveKind::Boolean
            )))),
            json!(true)
        );
        assert_eq!(
            synth.synthesize(&SchemaNode::Union(vec![
                SchemaNode::primitive(PrimitiveKind::Null),
                SchemaNode::primitive(PrimitiveKind::Integer),
            ])),
            json!(10)
        );
        assert_eq!(
            synth.synthesize(&SchemaNode::Cyclic {
                name: "Node".into()
            }),
            Value::Null
        );
        assert_eq!(
            synth.synthesize(&SchemaNode::Map(Box::new(string()))),
            json!({ "key": "key 1" })
        );
    }

    #[test]
    fn test_array_length_is_configurable() {
        let synth = MockSynthesizer::new(MockConfig {
            latency_ms: 0,
            array_len: 2,
        });
        let value = synth.synthesize(&SchemaNode::Array(Box::new(string())));
        assert_eq!(value, json!(["string 1", "string 2"]));
    }

    #[test]
    fn test_response_status_and_latency() {
        let synth = MockSynthesizer::new(MockConfig::default());
        let created = synth.response_for(&endpoint(HttpMethod::Post, Some(user())));
        assert_eq!(created.status, 201);
        assert_eq!(created.latency_ms, 250);
        assert!(created.body.is_object());

        let listed = synth.response_for(&endpoint(HttpMethod::Get, None));
        assert_eq!(listed.status, 200);
        assert_eq!(listed.body, Value::Null);
    }
}
