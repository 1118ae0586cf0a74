//! Generated identifier planning.
//!
//! All names of one run are decided up front so emission itself cannot fail on collisions.
//! Two candidates deriving the same name are disambiguated by appending the owning
//! endpoint's HTTP method to every colliding name; anything still colliding is an error.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::ts::{to_camel_case, to_pascal_case};
use crate::error::{GenError, Result};
use crate::openapi::{Endpoint, HttpMethod, SchemaNode};

/// A name wanted by some owner (an endpoint route or a schema).
#[derive(Debug, Clone)]
pub struct NameRequest {
    pub candidate: String,
    /// Human-readable owner, used in collision errors.
    pub owner: String,
    /// Method available for disambiguation; schemas have none.
    pub method: Option<HttpMethod>,
}

/// Resolve requests into unique names, index-aligned with the input.
pub fn allocate_names(requests: &[NameRequest]) -> Result<Vec<String>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for request in requests {
        *counts.entry(request.candidate.as_str()).or_default() += 1;
    }

    let names: Vec<String> = requests
        .iter()
        .map(|request| match request.method {
            Some(method) if counts[request.candidate.as_str()] > 1 => {
                format!("{}{}", request.candidate, method.pascal())
            }
            _ => request.candidate.clone(),
        })
        .collect();

    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (name, request) in names.iter().zip(requests) {
        if let Some(first) = owners.insert(name.as_str(), request.owner.as_str()) {
            return Err(GenError::NameCollision {
                name: name.clone(),
                first: first.to_string(),
                second: request.owner.clone(),
            });
        }
    }
    Ok(names)
}

/// Names of one endpoint's bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingNames {
    /// Fetcher function, e.g. `getUsersById`
    pub fetcher: String,
    /// Hook or composable, e.g. `useGetUsersById`
    pub binding: String,
    /// Query key helper, e.g. `getUsersByIdKey`
    pub key: String,
}

impl BindingNames {
    fn new(base: String) -> Self {
        Self {
            binding: format!("use{}", to_pascal_case(&base)),
            key: format!("{base}Key"),
            fetcher: base,
        }
    }

    pub fn pascal(&self) -> String {
        to_pascal_case(&self.fetcher)
    }
}

/// Per-endpoint type names in `types.ts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointTypeNames {
    /// Interface of path/query/header parameters.
    pub params: Option<String>,
    /// Alias for an inline request body.
    pub body: Option<String>,
    /// Alias for an inline response.
    pub response: Option<String>,
}

/// Every generated name of a run.
#[derive(Debug, Clone)]
pub struct NamePlan {
    /// Index-aligned with the endpoint list.
    pub bindings: Vec<BindingNames>,
    /// Index-aligned with the endpoint list.
    pub endpoint_types: Vec<EndpointTypeNames>,
    /// Schema name → exported type name, in first-use order.
    pub schema_types: IndexMap<String, String>,
}

impl NamePlan {
    pub fn build(endpoints: &[Endpoint]) -> Result<Self> {
        let binding_requests: Vec<NameRequest> = endpoints
            .iter()
            .map(|e| NameRequest {
                candidate: to_camel_case(&e.id),
                owner: e.route_key(),
                method: Some(e.method),
            })
            .collect();
        let bindings: Vec<BindingNames> = allocate_names(&binding_requests)?
            .into_iter()
            .map(BindingNames::new)
            .collect();

        let schemas = reachable_schemas(endpoints);

        // Schemas first so their names win over endpoint aliases.
        let mut type_requests: Vec<NameRequest> = schemas
            .keys()
            .map(|name| NameRequest {
                candidate: to_pascal_case(name),
                owner: format!("schema '{name}'"),
                method: None,
            })
            .collect();
        let mut slots = Vec::new();
        for (index, (endpoint, names)) in endpoints.iter().zip(&bindings).enumerate() {
            let pascal = names.pascal();
            let mut push = |slot: TypeSlot, suffix: &str| {
                type_requests.push(NameRequest {
                    candidate: format!("{pascal}{suffix}"),
                    owner: endpoint.route_key(),
                    method: Some(endpoint.method),
                });
                slots.push((index, slot));
            };
            if endpoint.has_request_params() {
                push(TypeSlot::Params, "Params");
            }
            if endpoint.body().is_some_and(|b| needs_alias(&b.schema)) {
                push(TypeSlot::Body, "Body");
            }
            if endpoint.response.as_ref().is_some_and(needs_alias) {
                push(TypeSlot::Response, "Response");
            }
        }

        let mut type_names = allocate_names(&type_requests)?.into_iter();
        let schema_types: IndexMap<String, String> = schemas
            .keys()
            .cloned()
            .zip(type_names.by_ref())
            .collect();

        let mut endpoint_types = vec![EndpointTypeNames::default(); endpoints.len()];
        for ((index, slot), name) in slots.into_iter().zip(type_names) {
            let entry = &mut endpoint_types[index];
            match slot {
                TypeSlot::Params => entry.params = Some(name),
                TypeSlot::Body => entry.body = Some(name),
                TypeSlot::Response => entry.response = Some(name),
            }
        }

        Ok(Self {
            bindings,
            endpoint_types,
            schema_types,
        })
    }
}

/// Inline composite shapes get their own exported alias; scalars and named schemas don't.
fn needs_alias(node: &SchemaNode) -> bool {
    node.reference_name().is_none() && !node.is_primitive()
}

#[derive(Debug, Clone, Copy)]
enum TypeSlot {
    Params,
    Body,
    Response,
}

/// Named schemas reachable from any endpoint, keyed by schema name, in first-use order.
///
/// The value is the expanded body of the first occurrence.
pub fn reachable_schemas(endpoints: &[Endpoint]) -> IndexMap<String, &SchemaNode> {
    let mut found = IndexMap::new();
    for endpoint in endpoints {
        for param in &endpoint.parameters {
            collect_named(&param.schema, &mut found);
        }
        if let Some(response) = &endpoint.response {
            collect_named(response, &mut found);
        }
    }
    found
}

fn collect_named<'a>(node: &'a SchemaNode, found: &mut IndexMap<String, &'a SchemaNode>) {
    match node {
        SchemaNode::Named { name, node } => {
            if !found.contains_key(name) {
                found.insert(name.clone(), &**node);
                collect_named(node, found);
            }
        }
        SchemaNode::Array(inner) | SchemaNode::Map(inner) | SchemaNode::Nullable(inner) => {
            collect_named(inner, found);
        }
        SchemaNode::Object(object) => {
            for field in object.fields.values() {
                collect_named(field, found);
            }
        }
        SchemaNode::Union(variants) => {
            for variant in variants {
                collect_named(variant, found);
            }
        }
        SchemaNode::Primitive { .. } | SchemaNode::Cyclic { .. } => {}
    }
}
