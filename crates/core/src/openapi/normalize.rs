//! Normalization from a parsed document to the canonical endpoint list.
//!
//! This module handles all the description-format specific logic:
//! - Parameter merging, `$ref` lookup and grouping by location
//! - Request body and success response selection
//! - Stable identifiers and `requiresAuth` derivation
//! - Route uniqueness

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, info};

use super::endpoint::{
    AuthDecision, BodyEncoding, Endpoint, EndpointParam, EndpointSeed, HttpMethod, ParamLocation,
};
use super::resolve::{PrimitiveKind, SchemaNode, SchemaResolver};
use super::spec::{
    MediaType, Operation, Parameter, ParameterOrRef, RequestBody, RequestBodyOrRef, Response,
    ResponseOrRef, Schema, SchemaType, SecurityRequirement, SpecDocument,
};
use crate::config::PublicPathPolicy;
use crate::error::{GenError, Result};

/// Upper bound on chained request body and response `$ref`s.
const MAX_REF_HOPS: usize = 8;

/// Normalize every operation of `doc`, resolving schemas against its own definitions.
pub fn normalize_document(doc: &SpecDocument, policy: &PublicPathPolicy) -> Result<Vec<Endpoint>> {
    let definitions = doc.schema_definitions();
    let mut resolver = SchemaResolver::new(&definitions);
    normalize(doc, &mut resolver, policy)
}

/// Produce the ordered endpoint list for `doc`.
///
/// Path items and operations are visited in document order.
pub fn normalize(
    doc: &SpecDocument,
    resolver: &mut SchemaResolver<'_>,
    policy: &PublicPathPolicy,
) -> Result<Vec<Endpoint>> {
    let mut endpoints = Vec::new();
    let mut routes = RouteSet::default();

    for (raw_path, item) in &doc.paths {
        let path = normalize_path(raw_path);
        let shared = resolve_parameter_refs(doc, &item.parameters)?;

        for (key, value) in item.operations() {
            let Some(method) = HttpMethod::from_key(&key.to_ascii_lowercase()) else {
                continue;
            };
            let operation: Operation = serde_json::from_value(value.clone())
                .map_err(|e| GenError::parse(format!("operation {method} {raw_path}"), e))?;

            routes.insert(method, &path)?;
            let endpoint =
                normalize_operation(doc, resolver, policy, &path, method, &operation, &shared)?;
            debug!(
                id = %endpoint.id,
                route = %endpoint.route_key(),
                params = endpoint.parameters.len(),
                requires_auth = endpoint.requires_auth,
                "Normalized endpoint."
            );
            endpoints.push(endpoint);
        }
    }

    info!(count = endpoints.len(), "Normalized API description.");
    Ok(endpoints)
}

/// Turn heuristic seeds into endpoints under the same path, identifier and duplicate rules.
///
/// Seeds carry no security metadata, so every one of them requires auth.
pub fn normalize_seeds(seeds: &[EndpointSeed]) -> Result<Vec<Endpoint>> {
    let mut routes = RouteSet::default();
    let mut endpoints = Vec::with_capacity(seeds.len());

    for seed in seeds {
        let path = normalize_path(&seed.path);
        routes.insert(seed.method, &path)?;
        let parameters = placeholders(&path)
            .into_iter()
            .map(|name| EndpointParam {
                name,
                location: ParamLocation::Path,
                schema: SchemaNode::primitive(PrimitiveKind::String),
                required: true,
            })
            .collect();
        endpoints.push(Endpoint {
            id: synthesize_id(seed.method, &path),
            path,
            method: seed.method,
            summary: None,
            parameters,
            body_encoding: BodyEncoding::Json,
            response: None,
            requires_auth: true,
            auth_decision: AuthDecision::Default,
        });
    }

    info!(count = endpoints.len(), "Normalized discovered endpoints.");
    Ok(endpoints)
}

/// Tracks (method, route signature) pairs seen so far.
#[derive(Debug, Default)]
struct RouteSet {
    seen: HashMap<(HttpMethod, String), String>,
}

impl RouteSet {
    fn insert(&mut self, method: HttpMethod, path: &str) -> Result<()> {
        let signature = route_signature(path);
        if let Some(first) = self.seen.get(&(method, signature.clone())) {
            debug!(%method, path, first = %first, "Duplicate route.");
            return Err(GenError::DuplicateEndpoint {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        self.seen.insert((method, signature), path.to_string());
        Ok(())
    }
}

/// Leading slash, no repeated or trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Path with every placeholder name erased, so `/users/{id}` and `/users/{userId}` compare equal.
pub fn route_signature(path: &str) -> String {
    let mut signature = String::with_capacity(path.len());
    let mut in_param = false;
    for c in normalize_path(path).chars() {
        match c {
            '{' => {
                in_param = true;
                signature.push_str("{}");
            }
            '}' => in_param = false,
            _ if in_param => {}
            _ => signature.push(c),
        }
    }
    signature
}

/// Placeholder names in template order.
fn placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut in_param = false;
    for c in path.chars() {
        if c == '{' {
            in_param = true;
            current.clear();
        } else if c == '}' && in_param {
            names.push(current.clone());
            in_param = false;
        } else if in_param {
            current.push(c);
        }
    }
    names
}

/// `GET /users/{id}` → `get_users_by_id`
pub fn synthesize_id(method: HttpMethod, path: &str) -> String {
    let mut parts = vec![method.key().to_string()];
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let part = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => format!("by_{}", identifier_part(name)),
            None => identifier_part(segment),
        };
        if !part.is_empty() {
            parts.push(part);
        }
    }
    if parts.len() == 1 {
        parts.push("root".to_string());
    }
    parts.join("_")
}

/// Lowercase snake form of one path segment.
fn identifier_part(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut prev_lower = false;
    for c in segment.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

fn normalize_operation(
    doc: &SpecDocument,
    resolver: &mut SchemaResolver<'_>,
    policy: &PublicPathPolicy,
    path: &str,
    method: HttpMethod,
    op: &Operation,
    shared: &[Parameter],
) -> Result<Endpoint> {
    let id = match &op.operation_id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => synthesize_id(method, path),
    };

    let merged = merge_parameters(shared, resolve_parameter_refs(doc, &op.parameters)?);
    let (mut parameters, mut body_encoding) = normalize_params(resolver, &merged)?;

    for name in placeholders(path) {
        let declared = parameters
            .iter()
            .any(|p| p.location == ParamLocation::Path && p.name == name);
        if !declared {
            debug!(%path, %name, "Adding undeclared path parameter.");
            parameters.push(EndpointParam {
                name,
                location: ParamLocation::Path,
                schema: SchemaNode::primitive(PrimitiveKind::String),
                required: true,
            });
        }
    }

    let request_body = match &op.request_body {
        Some(body) => Some(resolve_request_body(doc, body)?),
        None => None,
    };
    if let Some(request_body) = request_body
        && let Some((schema, encoding)) = select_request_body(request_body)
    {
        parameters.retain(|p| p.location != ParamLocation::Body);
        parameters.push(EndpointParam {
            name: "body".to_string(),
            location: ParamLocation::Body,
            schema: resolver.resolve(schema)?,
            required: request_body.required,
        });
        body_encoding = encoding;
    }
    parameters.sort_by_key(|p| p.location);

    let response = match success_response_schema(doc, op)? {
        Some(schema) => Some(resolver.resolve(schema)?),
        None => None,
    };

    let (requires_auth, auth_decision) = auth_requirement(doc, op, path, policy);

    Ok(Endpoint {
        path: path.to_string(),
        method,
        id,
        summary: op.summary.clone(),
        parameters,
        body_encoding,
        response,
        requires_auth,
        auth_decision,
    })
}

fn resolve_parameter_refs(doc: &SpecDocument, list: &[ParameterOrRef]) -> Result<Vec<Parameter>> {
    list.iter()
        .map(|p| match p {
            ParameterOrRef::Inline(param) => Ok(param.clone()),
            ParameterOrRef::Ref { ref_path } => doc
                .resolve_parameter(ref_path)
                .cloned()
                .ok_or_else(|| unresolved(ref_path)),
        })
        .collect()
}

/// Operation-level parameters override path-level ones with the same name and location.
fn merge_parameters(shared: &[Parameter], own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged = shared.to_vec();
    for param in own {
        merged.retain(|p| !(p.name == param.name && p.location == param.location));
        merged.push(param);
    }
    merged
}

/// Resolve path, query, header and 2.x body parameters; 2.x `formData` fields are folded into
/// one object body. Cookie parameters are skipped.
fn normalize_params(
    resolver: &mut SchemaResolver<'_>,
    params: &[Parameter],
) -> Result<(Vec<EndpointParam>, BodyEncoding)> {
    let mut out = Vec::new();
    let mut encoding = BodyEncoding::Json;
    let mut form_fields = Vec::new();

    for param in params {
        match param.location.as_str() {
            "cookie" => {
                debug!(name = %param.name, "Skipping cookie parameter.");
            }
            "formData" => form_fields.push(param),
            "body" => out.push(EndpointParam {
                name: "body".to_string(),
                location: ParamLocation::Body,
                schema: resolver.resolve(&param.effective_schema())?,
                required: param.required,
            }),
            other => {
                let Some(location) = ParamLocation::from_key(other) else {
                    debug!(name = %param.name, location = other, "Skipping parameter with unknown location.");
                    continue;
                };
                out.push(EndpointParam {
                    name: param.name.clone(),
                    location,
                    schema: resolver.resolve(&param.effective_schema())?,
                    required: param.required || location == ParamLocation::Path,
                });
            }
        }
    }

    if !form_fields.is_empty() {
        let is_multipart = form_fields
            .iter()
            .any(|p| p.param_type.as_deref() == Some("file"));
        encoding = if is_multipart {
            BodyEncoding::FormData
        } else {
            BodyEncoding::UrlEncoded
        };

        let mut properties = IndexMap::new();
        let mut required = Vec::new();
        for field in &form_fields {
            let mut schema = field.effective_schema();
            if field.param_type.as_deref() == Some("file") {
                schema.schema_type = Some(SchemaType::Single("string".to_string()));
                schema.format = Some("binary".to_string());
            }
            properties.insert(field.name.clone(), schema);
            if field.required {
                required.push(field.name.clone());
            }
        }
        let body_required = !required.is_empty();
        let form = Schema {
            schema_type: Some(SchemaType::Single("object".to_string())),
            properties: Some(properties),
            required: Some(required),
            ..Schema::default()
        };
        out.retain(|p| p.location != ParamLocation::Body);
        out.push(EndpointParam {
            name: "body".to_string(),
            location: ParamLocation::Body,
            schema: resolver.resolve(&form)?,
            required: body_required,
        });
    }

    Ok((out, encoding))
}

fn is_json_media(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

/// JSON first, then multipart, then url-encoded, then any media type carrying a schema.
fn select_request_body(body: &RequestBody) -> Option<(&Schema, BodyEncoding)> {
    if let Some(schema) = body
        .content
        .iter()
        .find(|(media, _)| is_json_media(media))
        .and_then(|(_, m)| media_schema(m))
    {
        return Some((schema, BodyEncoding::Json));
    }
    for (media, encoding) in [
        ("multipart/form-data", BodyEncoding::FormData),
        ("application/x-www-form-urlencoded", BodyEncoding::UrlEncoded),
    ] {
        if let Some(schema) = body.content.get(media).and_then(media_schema) {
            return Some((schema, encoding));
        }
    }
    body.content
        .values()
        .find_map(media_schema)
        .map(|schema| (schema, BodyEncoding::Json))
}

fn media_schema(media: &MediaType) -> Option<&Schema> {
    media.schema.as_ref()
}

/// Follow a request body `$ref` chain to its definition.
fn resolve_request_body<'a>(
    doc: &'a SpecDocument,
    body: &'a RequestBodyOrRef,
) -> Result<&'a RequestBody> {
    let mut current = body;
    let mut hops = 0;
    loop {
        let ref_path = match current {
            RequestBodyOrRef::Inline(body) => return Ok(body),
            RequestBodyOrRef::Ref { ref_path } => ref_path,
        };
        hops += 1;
        current = doc
            .resolve_request_body(ref_path)
            .filter(|_| hops <= MAX_REF_HOPS)
            .ok_or_else(|| unresolved(ref_path))?;
    }
}

/// Follow a response `$ref` chain to its definition.
fn resolve_response<'a>(doc: &'a SpecDocument, response: &'a ResponseOrRef) -> Result<&'a Response> {
    let mut current = response;
    let mut hops = 0;
    loop {
        let ref_path = match current {
            ResponseOrRef::Inline(response) => return Ok(response),
            ResponseOrRef::Ref { ref_path } => ref_path,
        };
        hops += 1;
        current = doc
            .resolve_response(ref_path)
            .filter(|_| hops <= MAX_REF_HOPS)
            .ok_or_else(|| unresolved(ref_path))?;
    }
}

fn unresolved(reference: &str) -> GenError {
    GenError::UnresolvedSchemaRef {
        reference: reference.to_string(),
    }
}

/// Schema of the first 2xx response in document order.
fn success_response_schema<'a>(doc: &'a SpecDocument, op: &'a Operation) -> Result<Option<&'a Schema>> {
    let Some((_, response)) = op
        .responses
        .iter()
        .find(|(status, _)| status.starts_with('2'))
    else {
        return Ok(None);
    };
    Ok(response_schema(resolve_response(doc, response)?))
}

fn response_schema(response: &Response) -> Option<&Schema> {
    if let Some(schema) = &response.schema {
        return Some(schema);
    }
    let content = response.content.as_ref()?;
    content
        .iter()
        .find(|(media, _)| is_json_media(media))
        .or_else(|| content.first())
        .and_then(|(_, media)| media.schema.as_ref())
}

/// Explicit metadata first (operation `security`, `x-public`, document `security`), then the
/// public-path policy, then required.
fn auth_requirement(
    doc: &SpecDocument,
    op: &Operation,
    path: &str,
    policy: &PublicPathPolicy,
) -> (bool, AuthDecision) {
    if let Some(security) = &op.security {
        return (security_requires_auth(security), AuthDecision::Explicit);
    }
    if let Some(public) = op.x_public {
        return (!public, AuthDecision::Explicit);
    }
    if let Some(security) = &doc.security {
        return (security_requires_auth(security), AuthDecision::Explicit);
    }
    if policy.matches(path) {
        return (false, AuthDecision::Heuristic);
    }
    (true, AuthDecision::Default)
}

/// An empty list, or an empty requirement object among the alternatives, means no auth.
fn security_requires_auth(requirements: &[SecurityRequirement]) -> bool {
    !requirements.is_empty() && !requirements.iter().any(IndexMap::is_empty)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SpecDocument {
        SpecDocument::parse(json, "test.json").unwrap()
    }

    fn endpoints(json: &str) -> Vec<Endpoint> {
        normalize_document(&parse(json), &PublicPathPolicy::default()).unwrap()
    }

    #[test]
    fn test_document_order_and_identifiers() {
        let eps = endpoints(
            r#"{
  "openapi": "3.0.0",
  "paths": {
    "/zebras": { "get": { "responses": {} } },
    "/users/{id}": {
      "delete": { "responses": {} },
      "get": { "operationId": "getUser", "responses": {} }
    },
    "/": { "get": { "responses": {} } }
  }
}"#,
        );
        let ids: Vec<_> = eps.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            ["get_zebras", "delete_users_by_id", "getUser", "get_root"]
        );
    }

    #[test]
    fn test_synthesize_id_handles_mixed_segments() {
        assert_eq!(synthesize_id(HttpMethod::Get, "/users/{id}"), "get_users_by_id");
        assert_eq!(
            synthesize_id(HttpMethod::Post, "/userProfiles/{profileId}/avatar-image"),
            "post_user_profiles_by_profile_id_avatar_image"
        );
        assert_eq!(synthesize_id(HttpMethod::Get, "/v1/items.json"), "get_v1_items_json");
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(normalize_path("users//{id}/"), "/users/{id}");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(route_signature("/users/{id}"), route_signature("/users/{userId}/"));
        assert_ne!(route_signature("/users/{id}"), route_signature("/users/{id}/posts"));
    }

    #[test]
    fn test_duplicate_route_after_normalization() {
        let doc = parse(
            r#"{
  "openapi": "3.0.0",
  "paths": {
    "/users/{id}": { "get": { "responses": {} } },
    "/users/{userId}/": { "get": { "responses": {} } }
  }
}"#,
        );
        let err = normalize_document(&doc, &PublicPathPolicy::default()).unwrap_err();
        assert!(
            matches!(err, GenError::DuplicateEndpoint { ref method, ref path } if method == "GET" && path == "/users/{userId}")
        );
    }

    #[test]
    fn test_same_path_different_methods_is_not_duplicate() {
        let eps = endpoints(
            r#"{
  "openapi": "3.0.0",
  "paths": {
    "/users": { "get": { "responses": {} }, "post": { "responses": {} } }
  }
}"#,
        );
        assert_eq!(eps.len(), 2);
    }

    #[test]
    fn test_parameter_grouping_override_and_cookie_skip() {
        let eps = endpoints(
            r##"{
  "openapi": "3.0.0",
  "components": {
    "parameters": {
      "Trace": { "name": "X-Trace", "in": "header", "schema": { "type": "string" } }
    }
  },
  "paths": {
    "/items/{itemId}": {
      "parameters": [
        { "name": "limit", "in": "query", "schema": { "type": "string" } },
        { "name": "itemId", "in": "path", "required": true, "schema": { "type": "string" } }
      ],
      "put": {
        "parameters": [
          { "$ref": "#/components/parameters/Trace" },
          { "name": "session", "in": "cookie", "schema": { "type": "string" } },
          { "name": "limit", "in": "query", "required": true, "schema": { "type": "integer" } }
        ],
        "requestBody": {
          "required": true,
          "content": { "application/json": { "schema": { "type": "object", "properties": { "name": { "type": "string" } } } } }
        },
        "responses": {}
      }
    }
  }
}"##,
        );
        let params: Vec<_> = eps[0]
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location))
            .collect();
        assert_eq!(
            params,
            [
                ("itemId", ParamLocation::Path),
                ("limit", ParamLocation::Query),
                ("X-Trace", ParamLocation::Header),
                ("body", ParamLocation::Body),
            ]
        );
        let limit = &eps[0].parameters[1];
        assert!(limit.required);
        assert_eq!(limit.schema, SchemaNode::primitive(PrimitiveKind::Integer));
        assert!(eps[0].body().unwrap().required);
    }

    #[test]
    fn test_missing_parameter_ref() {
        let doc = parse(
            r##"{
  "openapi": "3.0.0",
  "paths": { "/a": { "get": { "parameters": [{ "$ref": "#/components/parameters/Nope" }], "responses": {} } } }
}"##,
        );
        let err = normalize_document(&doc, &PublicPathPolicy::default()).unwrap_err();
        assert_eq!(err.kind(), "UnresolvedSchemaRef");
    }

    #[test]
    fn test_undeclared_placeholders_become_path_params() {
        let eps = endpoints(
            r#"{
  "openapi": "3.0.0",
  "paths": {
    "/users/{id}": { "get": { "responses": {} } },
    "/orgs/{org}/repos/{repo}": {
      "get": {
        "parameters": [
          { "name": "repo", "in": "path", "required": true, "schema": { "type": "integer" } },
          { "name": "page", "in": "query", "schema": { "type": "integer" } }
        ],
        "responses": {}
      }
    }
  }
}"#,
        );
        let id = &eps[0].parameters;
        assert_eq!(id.len(), 1);
        assert_eq!(id[0].name, "id");
        assert_eq!(id[0].location, ParamLocation::Path);
        assert!(id[0].required);
        assert_eq!(id[0].schema, SchemaNode::primitive(PrimitiveKind::String));

        let params: Vec<_> = eps[1]
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location, p.schema.clone()))
            .collect();
        assert_eq!(
            params,
            [
                (
                    "repo",
                    ParamLocation::Path,
                    SchemaNode::primitive(PrimitiveKind::Integer)
                ),
                (
                    "org",
                    ParamLocation::Path,
                    SchemaNode::primitive(PrimitiveKind::String)
                ),
                (
                    "page",
                    ParamLocation::Query,
                    SchemaNode::primitive(PrimitiveKind::Integer)
                ),
            ]
        );
    }

    #[test]
    fn test_component_request_body_and_response_refs() {
        let eps = endpoints(
            r##"{
  "openapi": "3.0.0",
  "components": {
    "schemas": {
      "User": { "type": "object", "properties": { "name": { "type": "string" } } }
    },
    "requestBodies": {
      "UserBody": {
        "required": true,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } }
      },
      "UserBodyAlias": { "$ref": "#/components/requestBodies/UserBody" }
    },
    "responses": {
      "UserResp": {
        "description": "ok",
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } }
      }
    }
  },
  "paths": {
    "/users": {
      "post": {
        "requestBody": { "$ref": "#/components/requestBodies/UserBody" },
        "responses": { "200": { "$ref": "#/components/responses/UserResp" } }
      },
      "put": {
        "requestBody": { "$ref": "#/components/requestBodies/UserBodyAlias" },
        "responses": {}
      }
    }
  }
}"##,
        );
        let body = eps[0].body().unwrap();
        assert!(body.required);
        assert!(matches!(&body.schema, SchemaNode::Named { name, .. } if name == "User"));
        assert!(matches!(&eps[0].response, Some(SchemaNode::Named { name, .. }) if name == "User"));
        assert!(eps[1].body().is_some_and(|b| b.required));
    }

    #[test]
    fn test_swagger2_response_ref() {
        let eps = endpoints(
            r##"{
  "swagger": "2.0",
  "responses": {
    "Count": { "description": "ok", "schema": { "type": "integer" } }
  },
  "paths": { "/count": { "get": { "responses": { "200": { "$ref": "#/responses/Count" } } } } }
}"##,
        );
        assert_eq!(
            eps[0].response,
            Some(SchemaNode::primitive(PrimitiveKind::Integer))
        );
    }

    #[test]
    fn test_missing_request_body_and_response_refs() {
        for operation in [
            r##"{ "requestBody": { "$ref": "#/components/requestBodies/Nope" }, "responses": {} }"##,
            r##"{ "responses": { "200": { "$ref": "#/components/responses/Nope" } } }"##,
        ] {
            let doc = parse(&format!(
                r#"{{ "openapi": "3.0.0", "paths": {{ "/a": {{ "post": {operation} }} }} }}"#
            ));
            let err = normalize_document(&doc, &PublicPathPolicy::default()).unwrap_err();
            assert!(
                matches!(&err, GenError::UnresolvedSchemaRef { reference } if reference.ends_with("/Nope"))
            );
        }
    }

    #[test]
    fn test_cyclic_request_body_ref_is_unresolved() {
        let doc = parse(
            r##"{
  "openapi": "3.0.0",
  "components": {
    "requestBodies": {
      "A": { "$ref": "#/components/requestBodies/B" },
      "B": { "$ref": "#/components/requestBodies/A" }
    }
  },
  "paths": { "/a": { "post": { "requestBody": { "$ref": "#/components/requestBodies/A" }, "responses": {} } } }
}"##,
        );
        let err = normalize_document(&doc, &PublicPathPolicy::default()).unwrap_err();
        assert_eq!(err.kind(), "UnresolvedSchemaRef");
    }

    #[test]
    fn test_first_success_response_in_document_order() {
        let eps = endpoints(
            r#"{
  "openapi": "3.0.0",
  "paths": {
    "/a": { "post": { "responses": {
      "400": { "content": { "application/json": { "schema": { "type": "string" } } } },
      "201": { "content": { "application/json": { "schema": { "type": "integer" } } } },
      "200": { "content": { "application/json": { "schema": { "type": "boolean" } } } }
    } } },
    "/b": { "delete": { "responses": { "204": { "description": "gone" } } } }
  }
}"#,
        );
        assert_eq!(
            eps[0].response,
            Some(SchemaNode::primitive(PrimitiveKind::Integer))
        );
        assert_eq!(eps[1].response, None);
    }

    #[test]
    fn test_requires_auth_precedence() {
        let eps = endpoints(
            r#"{
  "openapi": "3.0.0",
  "paths": {
    "/health": { "get": { "responses": {} } },
    "/users": { "get": { "responses": {} } },
    "/login": { "post": { "security": [{ "bearer": [] }], "responses": {} } },
    "/docs": { "get": { "x-public": true, "responses": {} } },
    "/feed": { "get": { "security": [{}, { "bearer": [] }], "responses": {} } }
  }
}"#,
        );
        let decisions: Vec<_> = eps
            .iter()
            .map(|e| (e.path.as_str(), e.requires_auth, e.auth_decision))
            .collect();
        assert_eq!(
            decisions,
            [
                ("/health", false, AuthDecision::Heuristic),
                ("/users", true, AuthDecision::Default),
                ("/login", true, AuthDecision::Explicit),
                ("/docs", false, AuthDecision::Explicit),
                ("/feed", false, AuthDecision::Explicit),
            ]
        );
    }

    #[test]
    fn test_document_security_overrides_heuristic() {
        let eps = endpoints(
            r#"{
  "openapi": "3.0.0",
  "security": [{ "apiKey": [] }],
  "paths": {
    "/health": { "get": { "responses": {} } },
    "/ping": { "get": { "security": [], "responses": {} } }
  }
}"#,
        );
        assert!(eps[0].requires_auth);
        assert_eq!(eps[0].auth_decision, AuthDecision::Explicit);
        assert!(!eps[1].requires_auth);
    }

    #[test]
    fn test_swagger2_body_and_form_data() {
        let eps = endpoints(
            r##"{
  "swagger": "2.0",
  "definitions": {
    "Pet": { "type": "object", "properties": { "name": { "type": "string" } } }
  },
  "paths": {
    "/pets": {
      "post": {
        "parameters": [{ "name": "pet", "in": "body", "required": true, "schema": { "$ref": "#/definitions/Pet" } }],
        "responses": { "200": { "description": "ok", "schema": { "$ref": "#/definitions/Pet" } } }
      }
    },
    "/pets/{petId}/photo": {
      "post": {
        "parameters": [
          { "name": "petId", "in": "path", "type": "integer" },
          { "name": "caption", "in": "formData", "type": "string" },
          { "name": "file", "in": "formData", "type": "file", "required": true }
        ],
        "responses": {}
      }
    }
  }
}"##,
        );
        let body = eps[0].body().unwrap();
        assert!(matches!(&body.schema, SchemaNode::Named { name, .. } if name == "Pet"));
        assert_eq!(eps[0].body_encoding, BodyEncoding::Json);
        assert!(matches!(&eps[0].response, Some(SchemaNode::Named { name, .. }) if name == "Pet"));

        let upload = &eps[1];
        assert_eq!(upload.body_encoding, BodyEncoding::FormData);
        assert!(upload.parameters[0].required);
        let SchemaNode::Object(form) = &upload.body().unwrap().schema else {
            panic!("expected form object");
        };
        assert_eq!(form.fields.len(), 2);
        assert!(form.required.contains("file"));
    }

    #[test]
    fn test_seeds_follow_route_rules() {
        let seeds = vec![
            EndpointSeed {
                method: HttpMethod::Get,
                path: "users/".to_string(),
            },
            EndpointSeed {
                method: HttpMethod::Get,
                path: "/health".to_string(),
            },
        ];
        let eps = normalize_seeds(&seeds).unwrap();
        assert_eq!(eps[0].path, "/users");
        assert_eq!(eps[0].id, "get_users");
        assert!(eps.iter().all(|e| e.requires_auth && e.response.is_none()));

        let dup = vec![seeds[0].clone(), seeds[0].clone()];
        assert_eq!(normalize_seeds(&dup).unwrap_err().kind(), "DuplicateEndpoint");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("/a/{x}/b/{y}.json"), ["x", "y"]);
        assert!(placeholders("/plain").is_empty());
    }
}
