//! Canonical endpoint model produced by normalization.

use std::fmt;

use super::resolve::SchemaNode;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Parse a lowercase path-item key (`get`, `post`, ...).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Suffix appended to colliding generated names (`Get`, `Post`, ...).
    pub fn pascal(&self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Patch => "Patch",
            HttpMethod::Delete => "Delete",
            HttpMethod::Head => "Head",
            HttpMethod::Options => "Options",
        }
    }

    /// Safe methods are read-only and get auto-invoked bindings.
    pub fn is_safe(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Options)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels. Variant order is the grouping order of `Endpoint::parameters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "body" => Some(ParamLocation::Body),
            _ => None,
        }
    }
}

/// Request body wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Json,
    FormData,
    UrlEncoded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointParam {
    /// Name as declared in the document (`body` for request bodies).
    pub name: String,
    pub location: ParamLocation,
    pub schema: SchemaNode,
    pub required: bool,
}

/// How `Endpoint::requires_auth` was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Operation or document security metadata.
    Explicit,
    /// Public-path policy match.
    Heuristic,
    /// Nothing said otherwise.
    Default,
}

/// One (path, method) pair of the backend API.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Path template, e.g. `/users/{id}`
    pub path: String,
    pub method: HttpMethod,
    /// Declared operation id, or synthesized from method and path.
    pub id: String,
    pub summary: Option<String>,
    /// Grouped by location (path, query, header, body), document order within a group.
    pub parameters: Vec<EndpointParam>,
    pub body_encoding: BodyEncoding,
    /// Primary success response; `None` when undeclared or empty.
    pub response: Option<SchemaNode>,
    pub requires_auth: bool,
    pub auth_decision: AuthDecision,
}

impl Endpoint {
    /// Route key shared by the client and the mock module, e.g. `GET /users/{id}`.
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &EndpointParam> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    pub fn body(&self) -> Option<&EndpointParam> {
        self.params_in(ParamLocation::Body).next()
    }

    /// Path, query and header parameters.
    pub fn request_params(&self) -> impl Iterator<Item = &EndpointParam> {
        self.parameters
            .iter()
            .filter(|p| p.location != ParamLocation::Body)
    }

    pub fn has_request_params(&self) -> bool {
        self.request_params().next().is_some()
    }
}

/// An endpoint inferred by heuristic probing: method and path only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSeed {
    pub method: HttpMethod,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_keys_round_trip() {
        for method in HttpMethod::ALL {
            assert_eq!(HttpMethod::from_key(method.key()), Some(method));
        }
        assert_eq!(HttpMethod::from_key("trace"), None);
        assert_eq!(HttpMethod::from_key("parameters"), None);
    }

    #[test]
    fn test_safe_methods() {
        assert!(HttpMethod::Get.is_safe());
        assert!(!HttpMethod::Post.is_safe());
        assert!(!HttpMethod::Delete.is_safe());
    }

    #[test]
    fn test_location_order_groups_path_first() {
        let mut locations = vec![
            ParamLocation::Body,
            ParamLocation::Header,
            ParamLocation::Path,
            ParamLocation::Query,
        ];
        locations.sort();
        assert_eq!(
            locations,
            [
                ParamLocation::Path,
                ParamLocation::Query,
                ParamLocation::Header,
                ParamLocation::Body
            ]
        );
    }
}
