//! Discovery against a live (mocked) backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use apiconnect_core::openapi::{HttpMethod, LoadedSpec, SpecLoader};
use apiconnect_core::{GenerationConfig, PipelineState, SpecSource, Stage, connect};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PETS_SPEC: &str = r#"{
  "openapi": "3.0.3",
  "info": { "title": "pets", "version": "1" },
  "paths": {
    "/pets": {
      "get": {
        "operationId": "listPets",
        "responses": {
          "200": {
            "description": "ok",
            "content": { "application/json": { "schema": { "type": "array", "items": { "type": "string" } } } }
          }
        }
      }
    }
  }
}"#;

fn config_for(server: &MockServer, out: &std::path::Path) -> GenerationConfig {
    let mut config = GenerationConfig::new(server.uri());
    config.output_dir = out.to_path_buf();
    config.discovery.timeout = Duration::from_secs(5);
    config.discovery.retries = 0;
    config
}

#[tokio::test]
async fn test_conventional_location_is_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PETS_SPEC))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());
    let loaded = SpecLoader::new(&config).unwrap().load().await.unwrap();

    match loaded {
        LoadedSpec::Document { document, source } => {
            assert_eq!(source, format!("{}/v3/api-docs", server.uri()));
            assert!(document.paths.contains_key("/pets"));
        }
        LoadedSpec::Seeds(_) => panic!("expected a document"),
    }
}

#[tokio::test]
async fn test_non_document_probe_response_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not here</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/swagger.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PETS_SPEC))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = connect(&config_for(&server, dir.path())).await.unwrap();
    assert_eq!(
        report.source,
        SpecSource::Document(format!("{}/swagger.json", server.uri()))
    );
    assert_eq!(report.endpoints[0].id, "listPets");
}

#[tokio::test]
async fn test_heuristic_probing_yields_get_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = connect(&config_for(&server, dir.path())).await.unwrap();

    assert_eq!(report.source, SpecSource::Heuristic);
    let routes: Vec<(HttpMethod, &str)> = report
        .endpoints
        .iter()
        .map(|e| (e.method, e.path.as_str()))
        .collect();
    assert_eq!(
        routes,
        [(HttpMethod::Get, "/users"), (HttpMethod::Get, "/api/items")]
    );
    assert!(report.endpoints.iter().all(|e| e.requires_auth));
    assert!(report.endpoints.iter().all(|e| e.response.is_none()));
}

#[tokio::test]
async fn test_nothing_found_fails_discovery() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("api");

    let states = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = std::sync::Arc::clone(&states);
    let config = config_for(&server, &out);
    let mut pipeline = apiconnect_core::Pipeline::new(&config)
        .with_observer(move |s| seen.lock().unwrap().push(s));
    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.stage, Stage::Discovering);
    assert_eq!(err.kind(), "SpecNotFound");
    assert_eq!(
        *states.lock().unwrap(),
        [
            PipelineState::Discovering,
            PipelineState::Failed(Stage::Discovering)
        ]
    );
    assert!(!out.exists());
}

#[tokio::test]
async fn test_unreadable_explicit_spec_falls_back_to_probing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PETS_SPEC))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server, dir.path());
    config.spec_location = Some(format!("{}/missing.yaml", server.uri()));
    let report = connect(&config).await.unwrap();
    assert_eq!(
        report.source,
        SpecSource::Document(format!("{}/openapi.json", server.uri()))
    );
}
