//! Client layer: runs one SOAP call per `execute`, including the digest handshake.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::WWW_AUTHENTICATE;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{Endpoint, SoapAction, SoapRequest, ValidationError};
use crate::transport::{
    DecodeError, DigestChallenge, DigestCredential, DigestError, DigestOptions, SoapResponse,
    encode_envelope, new_cnonce,
};

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";
const AUTHORIZATION: &str = "Authorization";
const METHOD: &str = "POST";

type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Clone)]
struct HttpRequest {
    url: Url,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

#[derive(Debug)]
struct HttpResponse {
    status: u16,
    status_text: String,
    www_authenticate: Option<String>,
    /// Fully drained body, or the error hit while draining it.
    body: Result<Vec<u8>, BoxError>,
}

trait HttpTransport: Send + Sync {
    fn post(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport for ReqwestTransport {
    fn post(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = self.client.post(request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        let response = builder.body(request.body).send()?;

        let status = response.status();
        let www_authenticate = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        // Always read to the end so the connection goes back to the pool.
        let body = response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| Box::new(err) as BoxError);

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.to_string(),
            www_authenticate,
            body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Coarse classification of [`SoapError`].
pub enum SoapErrorKind {
    /// Malformed action identifier or URL; nothing was sent.
    Construction,
    /// Connection, DNS, TLS or body-read failure.
    Transport,
    /// First response was neither 200 nor 401.
    Protocol,
    /// No digest credential could be computed from the challenge.
    Authentication,
    /// Response XML was malformed or incomplete.
    Decode,
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`SoapClient`].
pub enum SoapError {
    /// The action identifier is not `<namespace>#<method>`.
    #[error("invalid SOAP action {action:?}: {source}")]
    InvalidAction {
        action: String,
        #[source]
        source: ValidationError,
    },

    /// Base URL plus path does not form a valid URL.
    #[error("invalid URL {base_url:?} + {path:?}: {source}")]
    InvalidUrl {
        base_url: String,
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client itself could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] BoxError),

    /// HTTP client / transport failure (DNS, TLS, connection reset, timeout).
    #[error("transport error on {}: {source}", target(.path, .action))]
    Transport {
        path: String,
        action: String,
        #[source]
        source: BoxError,
    },

    /// The response body could not be read.
    #[error("failed to read response body from {}: {source}", target(.path, .action))]
    Body {
        path: String,
        action: String,
        #[source]
        source: BoxError,
    },

    /// The first response was neither 200 nor a 401 challenge.
    #[error("http error on {}: {status_text}", target(.path, .action))]
    HttpStatus {
        path: String,
        action: String,
        status: u16,
        status_text: String,
    },

    /// The digest credential could not be computed.
    #[error("digest authentication failed on {}: {source}", target(.path, .action))]
    Authentication {
        path: String,
        action: String,
        #[source]
        source: DigestError,
    },

    /// The response body did not decode into the expected shape.
    #[error("failed to decode {element} from {}: {source}", target(.path, .action))]
    Decode {
        path: String,
        action: String,
        element: &'static str,
        #[source]
        source: DecodeError,
    },
}

impl SoapError {
    pub fn kind(&self) -> SoapErrorKind {
        match self {
            Self::InvalidAction { .. } | Self::InvalidUrl { .. } => SoapErrorKind::Construction,
            Self::ClientBuild(_) | Self::Transport { .. } | Self::Body { .. } => {
                SoapErrorKind::Transport
            }
            Self::HttpStatus { .. } => SoapErrorKind::Protocol,
            Self::Authentication { .. } => SoapErrorKind::Authentication,
            Self::Decode { .. } => SoapErrorKind::Decode,
        }
    }
}

#[derive(Debug, Clone)]
/// Builder for [`SoapClient`].
pub struct SoapClientBuilder {
    endpoint: Endpoint,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl SoapClientBuilder {
    /// No timeout and the default user-agent.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            timeout: None,
            user_agent: None,
        }
    }

    /// Set an HTTP client timeout applied to the entire request.
    ///
    /// Without one, calls block until the device answers or the connection fails.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build a [`SoapClient`].
    ///
    /// Certificate validation is switched off on this client only: the device
    /// serves a self-signed certificate with no SAN for its LAN address.
    pub fn build(self) -> Result<SoapClient, SoapError> {
        let mut builder = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(self.timeout);
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| SoapError::ClientBuild(Box::new(err)))?;

        Ok(SoapClient {
            endpoint: self.endpoint,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

#[derive(Clone)]
/// SOAP client for one device endpoint.
///
/// Holds no per-call state: every [`SoapClient::execute`] builds its own
/// request and negotiates digest authentication from scratch.
pub struct SoapClient {
    endpoint: Endpoint,
    http: Arc<dyn HttpTransport>,
}

impl SoapClient {
    /// Create a client with default settings.
    pub fn new(endpoint: Endpoint) -> Result<Self, SoapError> {
        SoapClientBuilder::new(endpoint).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(endpoint: Endpoint) -> SoapClientBuilder {
        SoapClientBuilder::new(endpoint)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Same credentials and HTTP client, different base URL.
    ///
    /// Used for the one-time download URLs the device hands out, which live on
    /// another port (and scheme) than the control endpoint.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            endpoint: self.endpoint.with_base_url(base_url),
            http: Arc::clone(&self.http),
        }
    }

    /// POST to `base_url + path` and return the response body.
    ///
    /// With a non-empty `action` the body is a SOAP envelope around
    /// `payload`; with an empty one nothing is sent, which serves plain file
    /// downloads.
    ///
    /// Authentication: a 200 on the first attempt is returned directly; a 401
    /// is answered with exactly one digest-authenticated retry (nonce count 1)
    /// whose body is returned whatever its status; anything else fails with
    /// [`SoapError::HttpStatus`].
    pub fn execute(&self, path: &str, action: &str, payload: &str) -> Result<Vec<u8>, SoapError> {
        let request =
            SoapRequest::new(path, action, payload).map_err(|source| SoapError::InvalidAction {
                action: action.to_owned(),
                source,
            })?;
        let url = resolve_url(self.endpoint.base_url(), path).map_err(|source| {
            SoapError::InvalidUrl {
                base_url: self.endpoint.base_url().to_owned(),
                path: path.to_owned(),
                source,
            }
        })?;

        debug!(%url, action, "sending request");
        let first = self.send(&request, &url, None)?;
        match first.status {
            200 => {
                info!(path, action, "no authentication needed?");
                return read_body(&request, first);
            }
            401 => {}
            status => {
                return Err(SoapError::HttpStatus {
                    path: path.to_owned(),
                    action: action.to_owned(),
                    status,
                    status_text: first.status_text,
                });
            }
        }

        let challenge = first
            .www_authenticate
            .as_deref()
            .and_then(|header| {
                DigestChallenge::parse(header)
                    .inspect_err(|err| debug!(path, error = %err, "unparsable challenge"))
                    .ok()
            })
            .unwrap_or_default();
        drop(first);

        let uri = request_uri(&url);
        let body = encode_envelope(&request);
        let cnonce = new_cnonce();
        let credential = DigestCredential::compute(
            &challenge,
            &DigestOptions {
                username: self.endpoint.username(),
                password: self.endpoint.password(),
                method: METHOD,
                uri: &uri,
                body: &body,
                count: 1,
                cnonce: &cnonce,
            },
        )
        .map_err(|source| SoapError::Authentication {
            path: path.to_owned(),
            action: action.to_owned(),
            source,
        })?;

        debug!(%url, realm = %challenge.realm, "retrying with digest credentials");
        let second = self.send(&request, &url, Some(credential.to_string()))?;
        if second.status != 200 {
            warn!(
                path,
                action,
                status = %second.status_text,
                "authenticated request was not accepted"
            );
        }
        read_body(&request, second)
    }

    /// Execute and decode the response into `R`.
    pub fn call<R: SoapResponse>(
        &self,
        path: &str,
        action: &str,
        payload: &str,
    ) -> Result<R, SoapError> {
        let body = self.execute(path, action, payload)?;
        R::decode(&body).map_err(|source| SoapError::Decode {
            path: path.to_owned(),
            action: action.to_owned(),
            element: R::ELEMENT,
            source,
        })
    }

    /// Plain download (no envelope, no `SoapAction` header).
    pub fn download(&self, path: &str) -> Result<Vec<u8>, SoapError> {
        self.execute(path, "", "")
    }

    // Rebuilt from scratch per attempt; nothing is shared with earlier sends.
    fn send(
        &self,
        request: &SoapRequest,
        url: &Url,
        authorization: Option<String>,
    ) -> Result<HttpResponse, SoapError> {
        let mut headers = vec![(CONTENT_TYPE, CONTENT_TYPE_XML.to_owned())];
        if let Some(action) = request.action() {
            headers.push((SoapAction::HEADER, action.to_string()));
        }
        if let Some(authorization) = authorization {
            headers.push((AUTHORIZATION, authorization));
        }

        self.http
            .post(HttpRequest {
                url: url.clone(),
                headers,
                body: encode_envelope(request),
            })
            .map_err(|source| SoapError::Transport {
                path: request.path().to_owned(),
                action: action_name(request),
                source,
            })
    }
}

fn read_body(request: &SoapRequest, response: HttpResponse) -> Result<Vec<u8>, SoapError> {
    response.body.map_err(|source| SoapError::Body {
        path: request.path().to_owned(),
        action: action_name(request),
        source,
    })
}

/// Empty for plain downloads.
fn action_name(request: &SoapRequest) -> String {
    request
        .action()
        .map(ToString::to_string)
        .unwrap_or_default()
}

// `path` alone for plain downloads, `path (action)` otherwise.
fn target(path: &str, action: &str) -> String {
    if action.is_empty() {
        path.to_owned()
    } else {
        format!("{path} ({action})")
    }
}

/// Join `path` (optionally carrying `?query`) onto the base URL's path.
fn resolve_url(base_url: &str, path: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let joined = if joined.len() > 1 {
        joined.trim_end_matches('/').to_owned()
    } else {
        joined
    };
    url.set_path(&joined);
    if query.is_some() {
        url.set_query(query);
    }
    Ok(url)
}

/// Path plus query, as digest auth expects in `uri`.
fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_owned(),
    }
}
