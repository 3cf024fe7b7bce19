//! Shared validation policy plus per-scheme endpoint checks.
//!
//! Checks run in a fixed order and the first failure wins; none may be
//! skipped on a path to success. Validation never mutates or releases
//! buffers; cleanup belongs to whoever owns them.

use std::collections::HashMap;
use std::time::Duration;

use muxcall_encoding::{keys, ArgScheme};

use crate::error::{RequestError, Result};

/// Endpoint used by health-check requests.
pub const HEALTH_ENDPOINT: &str = "Meta::health";

type EndpointCheck = fn(&str) -> std::result::Result<(), String>;

/// Scheme descriptor attached to a builder: the fixed arg-scheme tag plus
/// an optional endpoint-shape check layered on the shared invariants.
///
/// This replaces per-scheme builder subtypes: one builder, one pluggable
/// policy.
#[derive(Clone, Copy, Debug)]
pub struct SchemePolicy {
    scheme: ArgScheme,
    endpoint_check: Option<EndpointCheck>,
}

impl SchemePolicy {
    /// The stock policy for a scheme.
    ///
    /// Thrift schemes require the `Interface::method` endpoint form;
    /// health checks require exactly [`HEALTH_ENDPOINT`]; raw and JSON
    /// accept any non-empty name.
    pub fn for_scheme(scheme: ArgScheme) -> Self {
        let endpoint_check: Option<EndpointCheck> = match scheme {
            ArgScheme::Thrift | ArgScheme::StreamingThrift => Some(thrift_endpoint),
            ArgScheme::HealthCheck => Some(health_endpoint),
            ArgScheme::Raw | ArgScheme::Json => None,
        };
        Self {
            scheme,
            endpoint_check,
        }
    }

    /// A policy with a caller-supplied endpoint check in place of the
    /// stock one.
    pub fn with_endpoint_check(scheme: ArgScheme, check: EndpointCheck) -> Self {
        Self {
            scheme,
            endpoint_check: Some(check),
        }
    }

    /// The fixed arg scheme this policy enforces.
    pub fn scheme(&self) -> ArgScheme {
        self.scheme
    }

    pub(crate) fn check_endpoint(&self, name: &str) -> Result<()> {
        if let Some(check) = self.endpoint_check {
            check(name).map_err(|reason| RequestError::Validation {
                field: "arg1",
                reason,
            })?;
        }
        Ok(())
    }
}

fn thrift_endpoint(name: &str) -> std::result::Result<(), String> {
    match name.split_once("::") {
        Some((interface, method)) if !interface.is_empty() && !method.is_empty() => Ok(()),
        _ => Err(format!(
            "thrift endpoint '{name}' must take the Interface::method form"
        )),
    }
}

fn health_endpoint(name: &str) -> std::result::Result<(), String> {
    if name == HEALTH_ENDPOINT {
        Ok(())
    } else {
        Err(format!(
            "health-check endpoint must be '{HEALTH_ENDPOINT}', got '{name}'"
        ))
    }
}

pub(crate) fn check_service(service: &str) -> Result<()> {
    if service.is_empty() {
        return Err(RequestError::Validation {
            field: "service",
            reason: "service name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Structural check on a pre-encoded arg1: it must decode to a non-empty
/// UTF-8 endpoint name.
pub(crate) fn decode_endpoint(arg1: &[u8]) -> Result<&str> {
    let name = std::str::from_utf8(arg1).map_err(|_| RequestError::Validation {
        field: "arg1",
        reason: "endpoint name is not valid UTF-8".to_string(),
    })?;
    if name.is_empty() {
        return Err(endpoint_missing());
    }
    Ok(name)
}

pub(crate) fn endpoint_missing() -> RequestError {
    RequestError::Validation {
        field: "arg1",
        reason: "endpoint name must not be empty".to_string(),
    }
}

pub(crate) fn check_scheme_header(
    transport_headers: &HashMap<String, String>,
    scheme: ArgScheme,
) -> Result<()> {
    match transport_headers.get(keys::ARG_SCHEME_KEY) {
        Some(recorded) if recorded == scheme.as_str() => Ok(()),
        Some(recorded) => Err(RequestError::Validation {
            field: "as",
            reason: format!("records scheme '{recorded}', builder is fixed to '{scheme}'"),
        }),
        None => Err(RequestError::Validation {
            field: "as",
            reason: "transport headers must record the arg scheme".to_string(),
        }),
    }
}

pub(crate) fn check_ttl(ttl: Option<Duration>) -> Result<()> {
    match ttl {
        Some(ttl) if ttl.is_zero() => Err(RequestError::Validation {
            field: "ttl",
            reason: "time budget must be positive".to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_service_rejected() {
        let err = check_service("").unwrap_err();
        assert_eq!(err.field(), Some("service"));
        assert!(check_service("auth").is_ok());
    }

    #[test]
    fn endpoint_must_be_utf8_and_non_empty() {
        assert_eq!(decode_endpoint(b"Login").unwrap(), "Login");
        assert!(decode_endpoint(b"").is_err());
        assert!(decode_endpoint(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn thrift_policy_requires_interface_method_form() {
        let policy = SchemePolicy::for_scheme(ArgScheme::Thrift);
        assert!(policy.check_endpoint("Auth::login").is_ok());
        assert!(policy.check_endpoint("login").is_err());
        assert!(policy.check_endpoint("::login").is_err());
        assert!(policy.check_endpoint("Auth::").is_err());
    }

    #[test]
    fn health_policy_pins_the_endpoint() {
        let policy = SchemePolicy::for_scheme(ArgScheme::HealthCheck);
        assert!(policy.check_endpoint(HEALTH_ENDPOINT).is_ok());
        assert!(policy.check_endpoint("Meta::status").is_err());
    }

    #[test]
    fn raw_and_json_accept_any_name() {
        for scheme in [ArgScheme::Raw, ArgScheme::Json] {
            let policy = SchemePolicy::for_scheme(scheme);
            assert!(policy.check_endpoint("anything-goes").is_ok());
        }
    }

    #[test]
    fn custom_endpoint_check_replaces_the_stock_one() {
        fn lowercase_only(name: &str) -> std::result::Result<(), String> {
            if name.chars().all(|c| c.is_ascii_lowercase()) {
                Ok(())
            } else {
                Err("endpoint must be lowercase".to_string())
            }
        }

        let policy = SchemePolicy::with_endpoint_check(ArgScheme::Raw, lowercase_only);
        assert!(policy.check_endpoint("ping").is_ok());
        assert!(policy.check_endpoint("Ping").is_err());
    }

    #[test]
    fn scheme_header_must_match_the_policy() {
        let mut headers = HashMap::new();
        assert!(check_scheme_header(&headers, ArgScheme::Thrift).is_err());

        headers.insert("as".to_string(), "raw".to_string());
        let err = check_scheme_header(&headers, ArgScheme::Thrift).unwrap_err();
        assert_eq!(err.field(), Some("as"));

        headers.insert("as".to_string(), "thrift".to_string());
        assert!(check_scheme_header(&headers, ArgScheme::Thrift).is_ok());
    }

    #[test]
    fn zero_ttl_rejected_but_absent_is_fine() {
        assert!(check_ttl(None).is_ok());
        assert!(check_ttl(Some(Duration::from_millis(500))).is_ok());
        let err = check_ttl(Some(Duration::ZERO)).unwrap_err();
        assert_eq!(err.field(), Some("ttl"));
    }
}
