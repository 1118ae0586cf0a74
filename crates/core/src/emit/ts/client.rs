//! `client.ts`: the HTTP wrapper every binding calls through.
//!
//! The wrapper is parametrized by the auth strategy (bearer header from an injected token
//! provider, credentialed cookies, or cookies plus a CSRF round trip) and, in mock mode,
//! answers from `mockRoutes` after the recorded latency.

use std::collections::BTreeSet;

use super::types::{TsFunction, TsImport, TsModule};
use super::utils::escape_js_string;
use crate::auth::AuthStrategyDescriptor;
use crate::emit::EmitContext;
use crate::openapi::HttpMethod;

const API_ERROR_CLASS: &str = r#"export class ApiError extends Error {
  status: number;
  statusText: string;
  body: unknown;

  constructor(status: number, statusText: string, body: unknown) {
    super(`HTTP ${status}: ${statusText}`);
    this.name = "ApiError";
    this.status = status;
    this.statusText = statusText;
    this.body = body;
  }
}"#;

const REQUEST_OPTIONS: &str = r#"export type BodyEncoding = "json" | "form-data" | "urlencoded";

export interface RequestOptions {
  /** Route key (`GET /users/{id}`) used to look up mocks. */
  route?: string;
  params?: Record<string, unknown>;
  headers?: Record<string, string>;
  body?: unknown;
  bodyEncoding?: BodyEncoding;
  /** `false` for public endpoints: no token or CSRF header is attached. */
  auth?: boolean;
  init?: RequestInit;
}"#;

const ERROR_CHECK: &str = r#"    if (!res.ok) {
      const body = await res.text();
      let parsed: unknown;
      try { parsed = JSON.parse(body); } catch { parsed = body; }
      throw new ApiError(res.status, res.statusText, parsed);
    }"#;

/// Build the `client.ts` module.
pub fn client_module(ctx: &EmitContext<'_>) -> TsModule {
    let mock_mode = ctx.mocks.is_some();
    let mut imports = Vec::new();
    if mock_mode {
        imports.push(TsImport::new(vec!["mockRoutes".into()], "./mocks"));
    }

    let mut functions = vec![
        TsFunction::raw_block(API_ERROR_CLASS),
        TsFunction::raw_block(format!(
            "const DEFAULT_BASE_URL = \"{}\";",
            escape_js_string(&ctx.base_url)
        )),
    ];
    if ctx.auth.uses_token_provider() {
        functions.push(TsFunction::raw_block(
            "export type TokenProvider = () => string | null | undefined | Promise<string | null | undefined>;",
        ));
    }
    functions.push(TsFunction::raw_block(config_interface(&ctx.auth, mock_mode)));
    functions.push(TsFunction::raw_block(REQUEST_OPTIONS));

    let verbs: BTreeSet<HttpMethod> = ctx.endpoints.iter().map(|e| e.method).collect();
    functions.push(TsFunction::raw_block(create_api_client(
        &ctx.auth, mock_mode, &verbs,
    )));
    functions.push(TsFunction::raw_block(
        "export type ApiClient = ReturnType<typeof createApiClient>;",
    ));
    functions.push(TsFunction::raw_block(
        "export const apiClient = createApiClient();\n\nexport default apiClient;",
    ));

    TsModule {
        imports,
        types: Vec::new(),
        functions,
    }
}

fn config_interface(auth: &AuthStrategyDescriptor, mock_mode: bool) -> String {
    let mut out = String::from("export interface ApiClientConfig {\n");
    out.push_str("  /** Defaults to the URL the client was generated against. */\n");
    out.push_str("  baseUrl?: string;\n");
    if auth.uses_token_provider() {
        out.push_str("  /** Supplies the bearer token; called before every request. */\n");
        out.push_str("  tokenProvider?: TokenProvider;\n");
    }
    if auth.csrf.is_some() {
        out.push_str("  /** Overrides fetching the CSRF token from the backend. */\n");
        out.push_str("  csrfTokenProvider?: () => string | Promise<string>;\n");
    }
    if mock_mode {
        out.push_str("  /** Answer from `mockRoutes` instead of the network. Defaults to true. */\n");
        out.push_str("  useMocks?: boolean;\n");
    }
    out.push_str("  fetchImpl?: typeof fetch;\n");
    out.push('}');
    out
}

fn create_api_client(
    auth: &AuthStrategyDescriptor,
    mock_mode: bool,
    verbs: &BTreeSet<HttpMethod>,
) -> String {
    let mut out = String::from(
        "export const createApiClient = (config: ApiClientConfig = {}) => {\n  const baseUrl = (config.baseUrl ?? DEFAULT_BASE_URL).replace(/\\/+$/, \"\");\n  const fetchImpl = config.fetchImpl ?? globalThis.fetch.bind(globalThis);\n",
    );
    if mock_mode {
        out.push_str("  const useMocks = config.useMocks ?? true;\n");
    }

    if let Some(csrf) = &auth.csrf {
        out.push_str(&format!(
            r#"  let csrfToken: string | undefined;

  const fetchCsrfToken = async (): Promise<string> => {{
    if (config.csrfTokenProvider) return config.csrfTokenProvider();
    if (csrfToken !== undefined) return csrfToken;
    const res = await fetchImpl(`${{baseUrl}}{endpoint}`, {{ credentials: "{credentials}" }});
    if (!res.ok) throw new ApiError(res.status, res.statusText, await res.text());
    const payload = (await res.json()) as Record<string, unknown>;
    csrfToken = String(payload["{field}"]);
    return csrfToken;
  }};
"#,
            endpoint = escape_template(&csrf.endpoint),
            credentials = auth.credentials.as_str(),
            field = escape_js_string(&csrf.response_field),
        ));
    }

    out.push_str(
        "\n  const request = async <T>(method: string, path: string, options: RequestOptions = {}): Promise<T> => {\n",
    );
    if mock_mode {
        out.push_str(
            r#"    const mock = useMocks && options.route ? mockRoutes[options.route] : undefined;
    if (mock) {
      await new Promise((resolve) => setTimeout(resolve, mock.latencyMs));
      if (mock.status >= 400) throw new ApiError(mock.status, "Mock error", mock.body);
      return structuredClone(mock.body) as T;
    }

"#,
        );
    }
    out.push_str(
        r#"    const url = new URL(`${baseUrl}${path}`, globalThis.location?.origin);
    for (const [key, value] of Object.entries(options.params ?? {})) {
      if (value == null) continue;
      if (Array.isArray(value)) value.forEach((v) => url.searchParams.append(key, String(v)));
      else url.searchParams.set(key, String(value));
    }

    const headers: Record<string, string> = { Accept: "application/json", ...options.headers };
"#,
    );
    if auth.header.is_some() || auth.csrf.is_some() {
        out.push_str("    if (options.auth !== false) {\n");
        if let Some(injection) = &auth.header {
            out.push_str(&format!(
                "      const token = await config.tokenProvider?.();\n      if (token) headers[\"{}\"] = `{} ${{token}}`;\n",
                escape_js_string(&injection.header),
                escape_template(&injection.scheme),
            ));
        }
        if let Some(csrf) = &auth.csrf {
            out.push_str(&format!(
                "      if (![\"GET\", \"HEAD\", \"OPTIONS\"].includes(method)) {{\n        headers[\"{}\"] = await fetchCsrfToken();\n      }}\n",
                escape_js_string(&csrf.header_name),
            ));
        }
        out.push_str("    }\n");
    }

    out.push_str(
        r#"
    let body: BodyInit | undefined;
    if (options.body !== undefined) {
      switch (options.bodyEncoding ?? "json") {
        case "form-data": {
          const form = new FormData();
          for (const [key, value] of Object.entries(options.body as Record<string, unknown>)) {
            if (value != null) form.append(key, value instanceof Blob ? value : String(value));
          }
          body = form;
          break;
        }
        case "urlencoded":
          headers["Content-Type"] = "application/x-www-form-urlencoded";
          body = new URLSearchParams(options.body as Record<string, string>);
          break;
        default:
          headers["Content-Type"] = "application/json";
          body = JSON.stringify(options.body);
      }
    }

"#,
    );
    out.push_str(&format!(
        "    const res = await fetchImpl(url, {{ ...options.init, method, headers, body, credentials: \"{}\" }});\n",
        auth.credentials.as_str()
    ));
    out.push_str(ERROR_CHECK);
    out.push_str(
        r#"
    if (res.status === 204) return undefined as T;
    const text = await res.text();
    return (text ? JSON.parse(text) : undefined) as T;
  };

  return {
    request,
"#,
    );
    for verb in verbs {
        out.push_str(&format!(
            "    {key}: <T>(path: string, options?: RequestOptions) => request<T>(\"{method}\", path, options),\n",
            key = verb.key(),
            method = verb.as_str(),
        ));
    }
    out.push_str("  };\n};");
    out
}

/// Escape text placed inside a template literal.
fn escape_template(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::resolve_auth_strategy;
    use crate::config::CsrfConfig;

    fn client(mode: &str, mock_mode: bool, verbs: &[HttpMethod]) -> String {
        let auth = resolve_auth_strategy(mode, &CsrfConfig::default()).unwrap();
        create_api_client(&auth, mock_mode, &verbs.iter().copied().collect())
    }

    #[test]
    fn test_token_mode_injects_bearer_header() {
        let code = client("token", false, &[HttpMethod::Get]);
        assert!(code.contains("config.tokenProvider?.()"));
        assert!(code.contains("headers[\"Authorization\"] = `Bearer ${token}`"));
        assert!(code.contains("credentials: \"same-origin\""));
        assert!(!code.contains("fetchCsrfToken"));
        assert!(!code.contains("mockRoutes"));
    }

    #[test]
    fn test_session_mode_fetches_csrf_for_mutations() {
        let code = client("session", false, &[HttpMethod::Get, HttpMethod::Post]);
        assert!(code.contains("fetchImpl(`${baseUrl}/csrf-token`"));
        assert!(code.contains("payload[\"csrfToken\"]"));
        assert!(code.contains("headers[\"X-CSRF-Token\"] = await fetchCsrfToken();"));
        assert!(code.contains("credentials: \"include\""));
        assert!(!code.contains("tokenProvider?.()"));
    }

    #[test]
    fn test_public_requests_skip_auth_headers() {
        let token = client("token", false, &[HttpMethod::Get]);
        assert!(token.contains(
            "    if (options.auth !== false) {\n      const token = await config.tokenProvider?.();\n      if (token) headers[\"Authorization\"] = `Bearer ${token}`;\n    }\n"
        ));

        let session = client("session", false, &[HttpMethod::Post]);
        assert!(session.contains(
            "    if (options.auth !== false) {\n      if (![\"GET\", \"HEAD\", \"OPTIONS\"].includes(method)) {\n        headers[\"X-CSRF-Token\"] = await fetchCsrfToken();\n      }\n    }\n"
        ));

        let cookie = client("cookie", false, &[HttpMethod::Get]);
        assert!(!cookie.contains("options.auth"));
        assert!(REQUEST_OPTIONS.contains("  auth?: boolean;"));
    }

    #[test]
    fn test_one_callable_per_used_verb() {
        let code = client("cookie", false, &[HttpMethod::Delete, HttpMethod::Get]);
        assert!(code.contains("    get: <T>(path: string"));
        assert!(code.contains("    delete: <T>(path: string"));
        assert!(!code.contains("    post:"));
        assert!(code.find("    get:").unwrap() < code.find("    delete:").unwrap());
    }

    #[test]
    fn test_mock_mode_waits_for_latency() {
        let code = client("token", true, &[HttpMethod::Get]);
        assert!(code.contains("const useMocks = config.useMocks ?? true;"));
        assert!(code.contains("setTimeout(resolve, mock.latencyMs)"));
    }

    #[test]
    fn test_config_interface_follows_auth_mode() {
        let csrf = CsrfConfig::default();
        let token = resolve_auth_strategy("token", &csrf).unwrap();
        let session = resolve_auth_strategy("session", &csrf).unwrap();
        assert!(config_interface(&token, false).contains("tokenProvider?: TokenProvider;"));
        assert!(!config_interface(&token, false).contains("useMocks"));
        assert!(config_interface(&session, true).contains("csrfTokenProvider?:"));
        assert!(config_interface(&session, true).contains("useMocks?: boolean;"));
    }
}
