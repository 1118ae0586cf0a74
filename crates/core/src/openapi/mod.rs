//! API description ingestion.
//!
//! This module turns an OpenAPI 3.x / Swagger 2.x description (or heuristic probe results)
//! into the canonical endpoint model:
//! - Discovery of the description document
//! - Cycle-safe schema resolution
//! - Endpoint normalization

mod endpoint;
mod loader;
mod normalize;
mod resolve;
mod spec;

pub use endpoint::{
    AuthDecision, BodyEncoding, Endpoint, EndpointParam, EndpointSeed, HttpMethod, ParamLocation,
};
pub use loader::{DiscoveryStrategy, LoadedSpec, SpecLoader};
pub use normalize::{normalize, normalize_document, normalize_path, normalize_seeds, synthesize_id};
pub use resolve::{ObjectNode, PrimitiveKind, SchemaNode, SchemaResolver, reference_target};
pub use spec::{SpecDocument, SpecVersion};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::PublicPathPolicy;

    const USERS_OPENAPI_YAML: &str = r##"
openapi: 3.0.3
info:
  title: Users
  version: "1.0"
paths:
  /users:
    get:
      summary: List users
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: "#/components/schemas/User"
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/NewUser"
      responses:
        "201":
          description: Created
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/User"
  /users/{id}:
    get:
      operationId: getUser
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: integer
      responses:
        "200":
          description: OK
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/User"
  /health:
    get:
      responses:
        "200":
          description: OK
components:
  schemas:
    User:
      type: object
      required: [id, name]
      properties:
        id:
          type: integer
        name:
          type: string
        manager:
          $ref: "#/components/schemas/User"
    NewUser:
      type: object
      required: [name]
      properties:
        name:
          type: string
"##;

    fn users_endpoints() -> Vec<Endpoint> {
        let doc = SpecDocument::parse(USERS_OPENAPI_YAML, "users.yaml").unwrap();
        normalize_document(&doc, &PublicPathPolicy::default()).unwrap()
    }

    #[test]
    fn test_yaml_document_normalizes_in_order() {
        let endpoints = users_endpoints();
        let routes: Vec<_> = endpoints.iter().map(Endpoint::route_key).collect();
        assert_eq!(
            routes,
            ["GET /users", "POST /users", "GET /users/{id}", "GET /health"]
        );
        let ids: Vec<_> = endpoints.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["get_users", "post_users", "getUser", "get_health"]);
    }

    #[test]
    fn test_normalization_is_reproducible() {
        assert_eq!(users_endpoints(), users_endpoints());
    }

    #[test]
    fn test_recursive_user_schema_resolves() {
        let endpoints = users_endpoints();
        let Some(SchemaNode::Named { name, node }) = &endpoints[2].response else {
            panic!("expected named response");
        };
        assert_eq!(name, "User");
        let SchemaNode::Object(user) = &**node else {
            panic!("expected object");
        };
        assert_eq!(
            user.fields["manager"],
            SchemaNode::Cyclic {
                name: "User".into()
            }
        );
    }

    #[test]
    fn test_health_is_public() {
        let endpoints = users_endpoints();
        let health = endpoints.iter().find(|e| e.path == "/health").unwrap();
        assert!(!health.requires_auth);
        assert_eq!(health.auth_decision, AuthDecision::Heuristic);
        assert!(endpoints.iter().filter(|e| e.path != "/health").all(|e| e.requires_auth));
    }
}
