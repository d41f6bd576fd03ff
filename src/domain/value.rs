use std::fmt;

use crate::domain::validation::ValidationError;

#[derive(Clone, PartialEq, Eq)]
/// Address and credentials of one device.
///
/// Immutable once built. The password is redacted from `Debug` output.
pub struct Endpoint {
    base_url: String,
    username: String,
    password: String,
}

impl Endpoint {
    /// Create an endpoint. The base URL is only parsed when a request is built.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Same credentials against another base URL (one-time download hosts).
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SOAP action identifier (`<namespace-URI>#<MethodName>`).
///
/// Invariant: splits on `#` into exactly two non-empty parts.
pub struct SoapAction {
    namespace: String,
    method: String,
}

impl SoapAction {
    /// HTTP header carrying the action identifier.
    pub const HEADER: &'static str = "SoapAction";

    /// Separator between the service namespace and the method name.
    pub const SEPARATOR: char = '#';

    /// Parse and validate an action identifier.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref();
        let parts = value.split(Self::SEPARATOR).collect::<Vec<_>>();
        match parts.as_slice() {
            [namespace, method] if !namespace.is_empty() && !method.is_empty() => Ok(Self {
                namespace: (*namespace).to_owned(),
                method: (*method).to_owned(),
            }),
            _ => Err(ValidationError::MalformedAction {
                input: value.to_owned(),
                parts: parts.len(),
            }),
        }
    }

    /// Service namespace, e.g. `urn:dslforum-org:service:DeviceInfo:1`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Method name, e.g. `GetInfo`.
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for SoapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, Self::SEPARATOR, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soap_action_splits_namespace_and_method() {
        let action = SoapAction::new("urn:dslforum-org:service:DeviceInfo:1#GetInfo").unwrap();
        assert_eq!(action.namespace(), "urn:dslforum-org:service:DeviceInfo:1");
        assert_eq!(action.method(), "GetInfo");
        assert_eq!(
            action.to_string(),
            "urn:dslforum-org:service:DeviceInfo:1#GetInfo"
        );
    }

    #[test]
    fn soap_action_rejects_wrong_part_count() {
        for input in ["GetInfo", "a#b#c", ""] {
            assert!(
                matches!(
                    SoapAction::new(input),
                    Err(ValidationError::MalformedAction { .. })
                ),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn soap_action_rejects_empty_parts() {
        assert!(SoapAction::new("#GetInfo").is_err());
        assert!(SoapAction::new("urn:x#").is_err());
    }

    #[test]
    fn endpoint_debug_redacts_password() {
        let endpoint = Endpoint::new("http://192.168.178.1:49000", "admin", "s3cret");
        let debug = format!("{endpoint:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("admin"));
    }

    #[test]
    fn endpoint_with_base_url_keeps_credentials() {
        let endpoint = Endpoint::new("http://192.168.178.1:49000", "admin", "pw");
        let download = endpoint.with_base_url("https://192.168.178.1:49443");
        assert_eq!(download.base_url(), "https://192.168.178.1:49443");
        assert_eq!(download.username(), "admin");
        assert_eq!(download.password(), "pw");
    }
}
