//! `mocks.ts`: canned responses keyed by route.

use super::types::{TsFunction, TsModule};
use super::utils::escape_js_string;
use crate::mock::EndpointMock;

const MOCK_ROUTE_INTERFACE: &str = r#"export interface MockRoute {
  status: number;
  latencyMs: number;
  body: unknown;
}"#;

pub fn mocks_module(mocks: &[EndpointMock]) -> TsModule {
    let mut routes = String::from("export const mockRoutes: Record<string, MockRoute> = {\n");
    for mock in mocks {
        let body = format!("{:#}", mock.response.body).replace('\n', "\n    ");
        routes.push_str(&format!(
            "  \"{route}\": {{\n    status: {status},\n    latencyMs: {latency},\n    body: {body},\n  }},\n",
            route = escape_js_string(&mock.route),
            status = mock.response.status,
            latency = mock.response.latency_ms,
        ));
    }
    routes.push_str("};");

    TsModule {
        functions: vec![
            TsFunction::raw_block(MOCK_ROUTE_INTERFACE),
            TsFunction::raw_block(routes),
        ],
        ..TsModule::default()
    }
}
