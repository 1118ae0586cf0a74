//! Schema reference resolution.
//!
//! Expands `$ref`s against the document's named schemas into a concrete `SchemaNode` tree.
//! References currently being expanded form the open set; a reference back into the open
//! set becomes a terminal `SchemaNode::Cyclic` marker, so every chain ends in bounded depth.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use super::spec::{AdditionalProperties, Schema, SchemaType};
use crate::error::{GenError, Result};

const COMPONENTS_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// No usable type information.
    Unknown,
}

impl PrimitiveKind {
    fn from_type_name(name: &str) -> Self {
        match name {
            "string" => PrimitiveKind::String,
            "integer" => PrimitiveKind::Integer,
            "number" => PrimitiveKind::Number,
            "boolean" => PrimitiveKind::Boolean,
            "null" => PrimitiveKind::Null,
            _ => PrimitiveKind::Unknown,
        }
    }
}

/// A resolved schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive {
        kind: PrimitiveKind,
        format: Option<String>,
        enum_values: Vec<Value>,
    },
    Array(Box<SchemaNode>),
    Object(ObjectNode),
    /// String-keyed map (`additionalProperties`).
    Map(Box<SchemaNode>),
    /// `anyOf` / `oneOf`.
    Union(Vec<SchemaNode>),
    Nullable(Box<SchemaNode>),
    /// An expanded reference to a named schema.
    Named { name: String, node: Box<SchemaNode> },
    /// A reference back into a schema that is still being expanded.
    Cyclic { name: String },
}

/// Object fields in declaration order plus the required subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    pub fields: IndexMap<String, SchemaNode>,
    pub required: BTreeSet<String>,
}

impl SchemaNode {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        SchemaNode::Primitive {
            kind,
            format: None,
            enum_values: Vec::new(),
        }
    }

    pub fn unknown() -> Self {
        Self::primitive(PrimitiveKind::Unknown)
    }

    /// The name of the schema this node was expanded from, if any.
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            SchemaNode::Named { name, .. } | SchemaNode::Cyclic { name } => Some(name),
            _ => None,
        }
    }

    /// True for nodes that render as plain scalars.
    pub fn is_primitive(&self) -> bool {
        match self {
            SchemaNode::Primitive { .. } => true,
            SchemaNode::Nullable(inner) => inner.is_primitive(),
            _ => false,
        }
    }
}

/// Extract the schema name from a local schema reference.
pub fn reference_target(ref_path: &str) -> Option<String> {
    let name = ref_path
        .strip_prefix(COMPONENTS_PREFIX)
        .or_else(|| ref_path.strip_prefix(DEFINITIONS_PREFIX))?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name.replace("~1", "/").replace("~0", "~"))
}

/// Resolves schemas against one document's named definitions.
#[derive(Debug)]
pub struct SchemaResolver<'a> {
    definitions: &'a IndexMap<String, Schema>,
    open: Vec<String>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(definitions: &'a IndexMap<String, Schema>) -> Self {
        Self {
            definitions,
            open: Vec::new(),
        }
    }

    /// Resolve `schema` into a fully expanded tree.
    pub fn resolve(&mut self, schema: &Schema) -> Result<SchemaNode> {
        let node = self.resolve_inner(schema)?;
        let already = matches!(
            node,
            SchemaNode::Nullable(_)
                | SchemaNode::Primitive {
                    kind: PrimitiveKind::Null,
                    ..
                }
        );
        if schema.is_nullable() && !already {
            return Ok(SchemaNode::Nullable(Box::new(node)));
        }
        Ok(node)
    }

    /// Resolve a named definition directly.
    pub fn resolve_named(&mut self, name: &str) -> Result<SchemaNode> {
        if self.open.iter().any(|open| open == name) {
            trace!(schema = name, "Breaking reference cycle.");
            return Ok(SchemaNode::Cyclic {
                name: name.to_string(),
            });
        }
        let definitions = self.definitions;
        let target = definitions
            .get(name)
            .ok_or_else(|| GenError::UnresolvedSchemaRef {
                reference: name.to_string(),
            })?;

        self.open.push(name.to_string());
        let resolved = self.resolve(target);
        self.open.pop();

        Ok(SchemaNode::Named {
            name: name.to_string(),
            node: Box::new(resolved?),
        })
    }

    fn resolve_inner(&mut self, schema: &Schema) -> Result<SchemaNode> {
        if let Some(ref_path) = &schema.ref_path {
            let name = reference_target(ref_path).ok_or_else(|| GenError::UnresolvedSchemaRef {
                reference: ref_path.clone(),
            })?;
            return self.resolve_named(&name);
        }

        if let Some(all_of) = &schema.all_of {
            return self.resolve_all_of(schema, all_of);
        }

        if let Some(variants) = schema.any_of.as_ref().or(schema.one_of.as_ref()) {
            return self.resolve_union(variants);
        }

        match &schema.schema_type {
            Some(SchemaType::Single(t)) => self.resolve_typed(t, schema),
            Some(SchemaType::Multiple(types)) => {
                let non_null: Vec<_> = types.iter().filter(|t| *t != "null").collect();
                match non_null.as_slice() {
                    [] => Ok(SchemaNode::primitive(PrimitiveKind::Null)),
                    [single] => self.resolve_typed(single, schema),
                    many => {
                        let variants = many
                            .iter()
                            .map(|t| self.resolve_typed(t, schema))
                            .collect::<Result<Vec<_>>>()?;
                        Ok(SchemaNode::Union(variants))
                    }
                }
            }
            None if schema.properties.is_some() => self.resolve_object(schema),
            None if schema.additional_properties.is_some() => self.resolve_additional(schema),
            None if schema.items.is_some() => self.resolve_typed("array", schema),
            None if schema.enum_values.is_some() => self.resolve_typed("string", schema),
            None => Ok(SchemaNode::unknown()),
        }
    }

    fn resolve_typed(&mut self, type_name: &str, schema: &Schema) -> Result<SchemaNode> {
        match type_name {
            "array" => {
                let element = match &schema.items {
                    Some(items) => self.resolve(items)?,
                    None => SchemaNode::unknown(),
                };
                Ok(SchemaNode::Array(Box::new(element)))
            }
            "object" => {
                if schema.properties.is_some() {
                    self.resolve_object(schema)
                } else if schema.additional_properties.is_some() {
                    self.resolve_additional(schema)
                } else {
                    Ok(SchemaNode::Map(Box::new(SchemaNode::unknown())))
                }
            }
            other => Ok(SchemaNode::Primitive {
                kind: PrimitiveKind::from_type_name(other),
                format: schema.format.clone(),
                enum_values: schema.enum_values.clone().unwrap_or_default(),
            }),
        }
    }

    fn resolve_object(&mut self, schema: &Schema) -> Result<SchemaNode> {
        let mut object = ObjectNode::default();
        if let Some(properties) = &schema.properties {
            for (name, prop) in properties {
                object.fields.insert(name.clone(), self.resolve(prop)?);
            }
        }
        if let Some(required) = &schema.required {
            object.required.extend(required.iter().cloned());
        }
        Ok(SchemaNode::Object(object))
    }

    fn resolve_additional(&mut self, schema: &Schema) -> Result<SchemaNode> {
        let value = match &schema.additional_properties {
            Some(AdditionalProperties::Schema(inner)) => self.resolve(inner)?,
            Some(AdditionalProperties::Bool(_)) | None => SchemaNode::unknown(),
        };
        Ok(SchemaNode::Map(Box::new(value)))
    }

    fn resolve_union(&mut self, variants: &[Schema]) -> Result<SchemaNode> {
        let nullable = variants.iter().any(Schema::is_null_type);
        let mut resolved = variants
            .iter()
            .filter(|v| !v.is_null_type())
            .map(|v| self.resolve(v))
            .collect::<Result<Vec<_>>>()?;

        let node = if resolved.len() == 1 {
            resolved.remove(0)
        } else if resolved.is_empty() {
            SchemaNode::primitive(PrimitiveKind::Null)
        } else {
            SchemaNode::Union(resolved)
        };

        if nullable && !matches!(node, SchemaNode::Primitive { kind: PrimitiveKind::Null, .. }) {
            Ok(SchemaNode::Nullable(Box::new(node)))
        } else {
            Ok(node)
        }
    }

    /// `allOf` members that resolve to objects are merged into one object; anything else
    /// falls back to the first member.
    fn resolve_all_of(&mut self, schema: &Schema, members: &[Schema]) -> Result<SchemaNode> {
        let mut merged = ObjectNode::default();
        let mut fallback = None;

        for member in members {
            let node = self.resolve(member)?;
            match object_view(&node) {
                Some(object) => {
                    for (name, field) in &object.fields {
                        merged.fields.insert(name.clone(), field.clone());
                    }
                    merged.required.extend(object.required.iter().cloned());
                }
                None => {
                    fallback.get_or_insert(node);
                }
            }
        }

        if let SchemaNode::Object(own) = self.resolve_object(schema)? {
            merged.fields.extend(own.fields);
            merged.required.extend(own.required);
        }

        if merged.fields.is_empty()
            && let Some(node) = fallback
        {
            return Ok(node);
        }
        Ok(SchemaNode::Object(merged))
    }
}

/// Look through `Named` wrappers to an object body.
fn object_view(node: &SchemaNode) -> Option<&ObjectNode> {
    match node {
        SchemaNode::Object(object) => Some(object),
        SchemaNode::Named { node, .. } => object_view(node),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn definitions(json: &str) -> IndexMap<String, Schema> {
        serde_json::from_str(json).unwrap()
    }

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_self_referential_schema_terminates() {
        let defs = definitions(
            r##"{
  "Node": {
    "type": "object",
    "required": ["value"],
    "properties": {
      "value": { "type": "integer" },
      "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } }
    }
  }
}"##,
        );
        let mut resolver = SchemaResolver::new(&defs);
        let node = resolver
            .resolve(&schema(r##"{ "$ref": "#/components/schemas/Node" }"##))
            .unwrap();

        let SchemaNode::Named { name, node } = node else {
            panic!("expected named node");
        };
        assert_eq!(name, "Node");
        let SchemaNode::Object(object) = *node else {
            panic!("expected object");
        };
        assert!(object.required.contains("value"));
        assert_eq!(
            object.fields["children"],
            SchemaNode::Array(Box::new(SchemaNode::Cyclic {
                name: "Node".into()
            }))
        );
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let defs = definitions(
            r##"{
  "A": { "type": "object", "properties": { "b": { "$ref": "#/definitions/B" } } },
  "B": { "type": "object", "properties": { "a": { "$ref": "#/definitions/A" } } }
}"##,
        );
        let mut resolver = SchemaResolver::new(&defs);
        let node = resolver.resolve_named("A").unwrap();
        let SchemaNode::Named { node, .. } = node else {
            panic!("expected named node");
        };
        let SchemaNode::Object(a) = *node else {
            panic!("expected object");
        };
        let SchemaNode::Named { name, node } = &a.fields["b"] else {
            panic!("expected named B");
        };
        assert_eq!(name, "B");
        let SchemaNode::Object(b) = &**node else {
            panic!("expected object");
        };
        assert_eq!(b.fields["a"], SchemaNode::Cyclic { name: "A".into() });
    }

    #[test]
    fn test_sibling_references_are_not_cycles() {
        let defs = definitions(
            r##"{
  "Tag": { "type": "string" },
  "Post": { "type": "object", "properties": {
    "primary": { "$ref": "#/components/schemas/Tag" },
    "secondary": { "$ref": "#/components/schemas/Tag" }
  } }
}"##,
        );
        let mut resolver = SchemaResolver::new(&defs);
        let SchemaNode::Named { node, .. } = resolver.resolve_named("Post").unwrap() else {
            panic!("expected named node");
        };
        let SchemaNode::Object(post) = *node else {
            panic!("expected object");
        };
        for field in ["primary", "secondary"] {
            assert!(matches!(&post.fields[field], SchemaNode::Named { name, .. } if name == "Tag"));
        }
    }

    #[test]
    fn test_unresolved_reference() {
        let defs = IndexMap::new();
        let mut resolver = SchemaResolver::new(&defs);
        let err = resolver
            .resolve(&schema(r##"{ "$ref": "#/components/schemas/Missing" }"##))
            .unwrap_err();
        assert!(matches!(err, GenError::UnresolvedSchemaRef { ref reference } if reference == "Missing"));

        let err = resolver
            .resolve(&schema(r##"{ "$ref": "other.json#/Thing" }"##))
            .unwrap_err();
        assert_eq!(err.kind(), "UnresolvedSchemaRef");
    }

    #[test]
    fn test_nullable_forms() {
        let defs = IndexMap::new();
        let mut resolver = SchemaResolver::new(&defs);

        let any_of = resolver
            .resolve(&schema(r#"{ "anyOf": [{ "type": "string" }, { "type": "null" }] }"#))
            .unwrap();
        assert_eq!(
            any_of,
            SchemaNode::Nullable(Box::new(SchemaNode::primitive(PrimitiveKind::String)))
        );

        let type_array = resolver
            .resolve(&schema(r#"{ "type": ["integer", "null"] }"#))
            .unwrap();
        assert_eq!(
            type_array,
            SchemaNode::Nullable(Box::new(SchemaNode::primitive(PrimitiveKind::Integer)))
        );

        let flag = resolver
            .resolve(&schema(r#"{ "type": "boolean", "nullable": true }"#))
            .unwrap();
        assert_eq!(
            flag,
            SchemaNode::Nullable(Box::new(SchemaNode::primitive(PrimitiveKind::Boolean)))
        );
    }

    #[test]
    fn test_all_of_merges_objects() {
        let defs = definitions(
            r##"{
  "Base": { "type": "object", "required": ["id"], "properties": { "id": { "type": "integer" } } }
}"##,
        );
        let mut resolver = SchemaResolver::new(&defs);
        let node = resolver
            .resolve(&schema(
                r##"{ "allOf": [
  { "$ref": "#/components/schemas/Base" },
  { "type": "object", "required": ["name"], "properties": { "name": { "type": "string" } } }
] }"##,
            ))
            .unwrap();
        let SchemaNode::Object(object) = node else {
            panic!("expected merged object");
        };
        let fields: Vec<_> = object.fields.keys().map(String::as_str).collect();
        assert_eq!(fields, ["id", "name"]);
        assert!(object.required.contains("id") && object.required.contains("name"));
    }

    #[test]
    fn test_reference_target_decodes_pointer_escapes() {
        assert_eq!(
            reference_target("#/components/schemas/a~1b~0c").as_deref(),
            Some("a/b~c")
        );
        assert_eq!(reference_target("#/definitions/Pet").as_deref(), Some("Pet"));
        assert_eq!(reference_target("#/components/responses/Pet"), None);
    }
}
