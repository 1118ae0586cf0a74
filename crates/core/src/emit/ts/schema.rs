//! Resolved schemas to TypeScript types, and the `types.ts` module.

use indexmap::IndexMap;
use serde_json::Value;

use super::types::{TsLiteral, TsModule, TsPrimitive, TsProp, TsType, TsTypeDef, TypeDefKind};
use super::utils::{enum_value_to_key, json_to_literal, to_pascal_case};
use crate::emit::EmitContext;
use crate::emit::naming::reachable_schemas;
use crate::openapi::{Endpoint, ObjectNode, PrimitiveKind, SchemaNode};

/// Maps `SchemaNode`s onto TypeScript types using the planned schema type names.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    schema_types: &'a IndexMap<String, String>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schema_types: &'a IndexMap<String, String>) -> Self {
        Self { schema_types }
    }

    fn type_name(&self, schema: &str) -> String {
        self.schema_types
            .get(schema)
            .cloned()
            .unwrap_or_else(|| to_pascal_case(schema))
    }

    pub fn ts_type(&self, node: &SchemaNode) -> TsType {
        match node {
            SchemaNode::Primitive {
                kind,
                format,
                enum_values,
            } => {
                if let Some(literals) = enum_literals(enum_values) {
                    return literals;
                }
                match (kind, format.as_deref()) {
                    (PrimitiveKind::String, Some("binary")) => TsType::Ref("Blob".into()),
                    _ => TsType::Primitive(primitive(*kind)),
                }
            }
            SchemaNode::Array(element) => TsType::Array(Box::new(self.ts_type(element))),
            SchemaNode::Object(object) => TsType::Object(self.props(object)),
            SchemaNode::Map(value) => TsType::Record(Box::new(self.ts_type(value))),
            SchemaNode::Union(variants) => {
                TsType::Union(variants.iter().map(|v| self.ts_type(v)).collect())
            }
            SchemaNode::Nullable(inner) => {
                let mut variants = match self.ts_type(inner) {
                    TsType::Union(variants) => variants,
                    other => vec![other],
                };
                variants.push(TsType::Primitive(TsPrimitive::Null));
                TsType::Union(variants)
            }
            SchemaNode::Named { name, .. } | SchemaNode::Cyclic { name } => {
                TsType::Ref(self.type_name(name))
            }
        }
    }

    /// Type of an optional schema; missing schemas are `unknown`.
    pub fn ts_type_or_unknown(&self, node: Option<&SchemaNode>) -> TsType {
        node.map_or_else(TsType::unknown, |n| self.ts_type(n))
    }

    fn props(&self, object: &ObjectNode) -> Vec<TsProp> {
        object
            .fields
            .iter()
            .map(|(name, field)| TsProp {
                name: name.clone(),
                ty: self.ts_type(field),
                optional: !object.required.contains(name),
            })
            .collect()
    }

    /// Definition for a named schema whose expanded body is `node`.
    pub fn definition(&self, name: &str, node: &SchemaNode) -> TsTypeDef {
        let kind = match node {
            SchemaNode::Object(object) => TypeDefKind::Interface {
                properties: self.props(object),
            },
            SchemaNode::Primitive { enum_values, .. } if !enum_values.is_empty() => {
                match const_enum_values(enum_values) {
                    Some(values) => TypeDefKind::ConstEnum { values },
                    None => TypeDefKind::TypeAlias {
                        ty: self.ts_type(node),
                    },
                }
            }
            _ => TypeDefKind::TypeAlias {
                ty: self.ts_type(node),
            },
        };
        TsTypeDef {
            name: self.type_name(name),
            kind,
        }
    }

    /// Interface of an endpoint's path, query and header parameters.
    pub fn params_interface(&self, name: &str, endpoint: &Endpoint) -> TsTypeDef {
        let properties = endpoint
            .request_params()
            .map(|param| TsProp {
                name: param.name.clone(),
                ty: self.ts_type(&param.schema),
                optional: !param.required,
            })
            .collect();
        TsTypeDef {
            name: name.to_string(),
            kind: TypeDefKind::Interface { properties },
        }
    }
}

fn primitive(kind: PrimitiveKind) -> TsPrimitive {
    match kind {
        PrimitiveKind::String => TsPrimitive::String,
        PrimitiveKind::Integer | PrimitiveKind::Number => TsPrimitive::Number,
        PrimitiveKind::Boolean => TsPrimitive::Boolean,
        PrimitiveKind::Null => TsPrimitive::Null,
        PrimitiveKind::Unknown => TsPrimitive::Unknown,
    }
}

fn enum_literals(values: &[Value]) -> Option<TsType> {
    let mut literals: Vec<TsType> = values
        .iter()
        .filter_map(json_to_literal)
        .map(TsType::Literal)
        .collect();
    match literals.len() {
        0 => None,
        1 => literals.pop(),
        _ => Some(TsType::Union(literals)),
    }
}

/// Keyed values for a const enum; `None` when keys would clash or a value is not a literal.
fn const_enum_values(values: &[Value]) -> Option<Vec<(String, TsLiteral)>> {
    let mut out: Vec<(String, TsLiteral)> = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let key = enum_value_to_key(value, index);
        if out.iter().any(|(existing, _)| *existing == key) {
            return None;
        }
        out.push((key, json_to_literal(value)?));
    }
    Some(out)
}

/// `types.ts`: named schemas in first-use order, then per-endpoint aliases.
pub fn types_module(ctx: &EmitContext<'_>) -> TsModule {
    let mapper = TypeMapper::new(&ctx.names.schema_types);
    let mut types: Vec<TsTypeDef> = reachable_schemas(ctx.endpoints)
        .into_iter()
        .map(|(name, node)| mapper.definition(&name, node))
        .collect();

    for (endpoint, names) in ctx.endpoints.iter().zip(&ctx.names.endpoint_types) {
        if let Some(name) = &names.params {
            types.push(mapper.params_interface(name, endpoint));
        }
        if let (Some(name), Some(body)) = (&names.body, endpoint.body()) {
            types.push(TsTypeDef {
                name: name.clone(),
                kind: TypeDefKind::TypeAlias {
                    ty: mapper.ts_type(&body.schema),
                },
            });
        }
        if let (Some(name), Some(response)) = (&names.response, &endpoint.response) {
            types.push(TsTypeDef {
                name: name.clone(),
                kind: TypeDefKind::TypeAlias {
                    ty: mapper.ts_type(response),
                },
            });
        }
    }

    TsModule {
        types,
        ..TsModule::default()
    }
}
