//! Authentication strategy resolution.

use std::fmt;
use std::str::FromStr;

use crate::config::CsrfConfig;
use crate::error::GenError;
use crate::openapi::HttpMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Token,
    Cookie,
    Session,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Token => "token",
            AuthMode::Cookie => "cookie",
            AuthMode::Session => "session",
        }
    }
}

impl FromStr for AuthMode {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(AuthMode::Token),
            "cookie" => Ok(AuthMode::Cookie),
            "session" => Ok(AuthMode::Session),
            _ => Err(GenError::UnsupportedAuthMode(s.to_string())),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `fetch` credentials policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    SameOrigin,
    Include,
}

impl Credentials {
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::SameOrigin => "same-origin",
            Credentials::Include => "include",
        }
    }
}

/// A header whose value comes from the injected `tokenProvider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInjection {
    pub header: String,
    /// Prefix placed before the token, e.g. `Bearer`.
    pub scheme: String,
}

/// Fetch a CSRF token before mutating requests and send it back in a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfStep {
    pub endpoint: String,
    pub response_field: String,
    pub header_name: String,
}

/// What the emitted client does to authenticate requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStrategyDescriptor {
    pub mode: AuthMode,
    pub header: Option<HeaderInjection>,
    pub credentials: Credentials,
    pub csrf: Option<CsrfStep>,
}

impl AuthStrategyDescriptor {
    /// Whether the client takes a `tokenProvider` capability.
    pub fn uses_token_provider(&self) -> bool {
        self.header.is_some()
    }

    /// Whether a request with `method` goes through the CSRF step.
    pub fn needs_csrf(&self, method: HttpMethod) -> bool {
        self.csrf.is_some() && !method.is_safe()
    }
}

/// Map a mode tag (case-insensitive) to its strategy.
pub fn resolve_auth_strategy(
    mode: &str,
    csrf: &CsrfConfig,
) -> Result<AuthStrategyDescriptor, GenError> {
    let mode: AuthMode = mode.parse()?;
    let descriptor = match mode {
        AuthMode::Token => AuthStrategyDescriptor {
            mode,
            header: Some(HeaderInjection {
                header: "Authorization".to_string(),
                scheme: "Bearer".to_string(),
            }),
            credentials: Credentials::SameOrigin,
            csrf: None,
        },
        AuthMode::Cookie => AuthStrategyDescriptor {
            mode,
            header: None,
            credentials: Credentials::Include,
            csrf: None,
        },
        AuthMode::Session => AuthStrategyDescriptor {
            mode,
            header: None,
            credentials: Credentials::Include,
            csrf: Some(CsrfStep {
                endpoint: csrf.endpoint.clone(),
                response_field: csrf.response_field.clone(),
                header_name: csrf.header_name.clone(),
            }),
        },
    };
    Ok(descriptor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_injects_bearer_header() {
        let strategy = resolve_auth_strategy("token", &CsrfConfig::default()).unwrap();
        assert!(strategy.uses_token_provider());
        assert_eq!(strategy.header.as_ref().unwrap().scheme, "Bearer");
        assert!(strategy.csrf.is_none());
        assert!(!strategy.needs_csrf(HttpMethod::Post));
    }

    #[test]
    fn test_cookie_relies_on_credentials() {
        let strategy = resolve_auth_strategy("cookie", &CsrfConfig::default()).unwrap();
        assert!(!strategy.uses_token_provider());
        assert_eq!(strategy.credentials, Credentials::Include);
        assert!(strategy.csrf.is_none());
    }

    #[test]
    fn test_session_adds_csrf_step_for_mutations() {
        let csrf = CsrfConfig {
            endpoint: "/auth/csrf".into(),
            ..CsrfConfig::default()
        };
        let strategy = resolve_auth_strategy("Session", &csrf).unwrap();
        assert_eq!(strategy.mode, AuthMode::Session);
        assert_eq!(strategy.credentials, Credentials::Include);
        assert_eq!(strategy.csrf.as_ref().unwrap().endpoint, "/auth/csrf");
        assert!(strategy.needs_csrf(HttpMethod::Delete));
        assert!(!strategy.needs_csrf(HttpMethod::Get));
    }

    #[test]
    fn test_unknown_mode() {
        let err = resolve_auth_strategy("oauth2", &CsrfConfig::default()).unwrap_err();
        assert!(matches!(err, GenError::UnsupportedAuthMode(ref mode) if mode == "oauth2"));
    }
}
