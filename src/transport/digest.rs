//! HTTP digest authentication (RFC 7616 / RFC 2617).
//!
//! Only the pieces a single challenge-response round trip needs: parse the
//! `WWW-Authenticate` challenge, compute the credential, render the
//! `Authorization` header value.

use std::collections::HashMap;
use std::fmt;

use md5::Md5;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("not a digest challenge: {header:?}")]
    NotDigest { header: String },

    #[error("challenge has no nonce")]
    MissingNonce,

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported qop options: {0:?}")]
    UnsupportedQop(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl Algorithm {
    fn parse(value: &str) -> Result<Self, DigestError> {
        match value.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Self::Md5),
            "MD5-SESS" => Ok(Self::Md5Sess),
            "SHA-256" => Ok(Self::Sha256),
            "SHA-256-SESS" => Ok(Self::Sha256Sess),
            _ => Err(DigestError::UnsupportedAlgorithm(value.to_owned())),
        }
    }

    fn is_session(self) -> bool {
        matches!(self, Self::Md5Sess | Self::Sha256Sess)
    }

    /// Hex digest of `parts` joined with `:`.
    pub fn hash_parts(self, parts: &[&str]) -> String {
        let parts = parts.iter().map(|part| part.as_bytes()).collect::<Vec<_>>();
        self.hash(&parts)
    }

    fn hash(self, parts: &[&[u8]]) -> String {
        match self {
            Self::Md5 | Self::Md5Sess => hex_digest::<Md5>(parts),
            Self::Sha256 | Self::Sha256Sess => hex_digest::<Sha256>(parts),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Md5 => "MD5",
            Self::Md5Sess => "MD5-sess",
            Self::Sha256 => "SHA-256",
            Self::Sha256Sess => "SHA-256-sess",
        })
    }
}

fn hex_digest<D: Digest>(parts: &[&[u8]]) -> String {
    let mut hasher = D::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update(b":");
        }
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Parameters of a `WWW-Authenticate: Digest ...` challenge.
///
/// The default value is the empty challenge used when parsing fails; computing a
/// credential from it is rejected for lack of a nonce.
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub qop: Vec<String>,
    pub algorithm: Option<String>,
    pub stale: bool,
    pub domain: Option<String>,
    pub charset: Option<String>,
    pub userhash: bool,
}

impl DigestChallenge {
    /// Parse a `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self, DigestError> {
        let trimmed = header.trim_start();
        let params = match trimmed.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("Digest") => rest,
            _ => {
                return Err(DigestError::NotDigest {
                    header: header.to_owned(),
                });
            }
        };

        let mut params = parse_auth_params(params);
        let flag = |value: Option<String>| value.is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self {
            realm: params.remove("realm").unwrap_or_default(),
            nonce: params.remove("nonce").unwrap_or_default(),
            opaque: params.remove("opaque"),
            qop: params
                .remove("qop")
                .map(|qop| {
                    qop.split(',')
                        .map(str::trim)
                        .filter(|it| !it.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            algorithm: params.remove("algorithm"),
            stale: flag(params.remove("stale")),
            domain: params.remove("domain"),
            charset: params.remove("charset"),
            userhash: flag(params.remove("userhash")),
        })
    }
}

/// `key=value` / `key="quoted, value"` pairs; keys are lower-cased.
fn parse_auth_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && *c != ',') {
            key.push(c);
        }
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            if chars.peek().is_none() {
                break;
            }
            chars.next();
            continue;
        }

        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if chars.next_if_eq(&'"').is_some() {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => value.extend(chars.next()),
                        '"' => break,
                        _ => value.push(c),
                    }
                }
            } else {
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    value.push(c);
                }
                value = value.trim().to_owned();
            }
        }
        params.insert(key, value);
    }

    params
}

#[derive(Debug, Clone)]
/// Inputs bound into one credential.
pub struct DigestOptions<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub method: &'a str,
    pub uri: &'a str,
    /// Request body, hashed only for `qop=auth-int`.
    pub body: &'a [u8],
    pub count: u32,
    pub cnonce: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Computed digest credential; renders as the `Authorization` header value.
pub struct DigestCredential {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    pub response: String,
    pub algorithm: Option<Algorithm>,
    pub cnonce: Option<String>,
    pub opaque: Option<String>,
    pub qop: Option<String>,
    pub nc: Option<u32>,
    pub userhash: bool,
}

impl DigestCredential {
    pub fn compute(
        challenge: &DigestChallenge,
        options: &DigestOptions<'_>,
    ) -> Result<Self, DigestError> {
        if challenge.nonce.is_empty() {
            return Err(DigestError::MissingNonce);
        }
        let algorithm = challenge
            .algorithm
            .as_deref()
            .map(Algorithm::parse)
            .transpose()?;
        let alg = algorithm.unwrap_or_default();
        let qop = select_qop(&challenge.qop)?;

        let realm = challenge.realm.as_str();
        let nonce = challenge.nonce.as_str();
        let cnonce = options.cnonce;
        let nc = format!("{:08x}", options.count);

        let mut ha1 = alg.hash(&[
            options.username.as_bytes(),
            realm.as_bytes(),
            options.password.as_bytes(),
        ]);
        if alg.is_session() {
            ha1 = alg.hash(&[ha1.as_bytes(), nonce.as_bytes(), cnonce.as_bytes()]);
        }

        let ha2 = match qop {
            Some("auth-int") => {
                let body = alg.hash(&[options.body]);
                alg.hash(&[
                    options.method.as_bytes(),
                    options.uri.as_bytes(),
                    body.as_bytes(),
                ])
            }
            _ => alg.hash(&[options.method.as_bytes(), options.uri.as_bytes()]),
        };

        let response = match qop {
            Some(qop) => alg.hash(&[
                ha1.as_bytes(),
                nonce.as_bytes(),
                nc.as_bytes(),
                cnonce.as_bytes(),
                qop.as_bytes(),
                ha2.as_bytes(),
            ]),
            None => alg.hash(&[ha1.as_bytes(), nonce.as_bytes(), ha2.as_bytes()]),
        };

        let username = if challenge.userhash {
            alg.hash(&[options.username.as_bytes(), realm.as_bytes()])
        } else {
            options.username.to_owned()
        };

        Ok(Self {
            username,
            realm: realm.to_owned(),
            nonce: nonce.to_owned(),
            uri: options.uri.to_owned(),
            response,
            algorithm,
            cnonce: qop.map(|_| cnonce.to_owned()),
            opaque: challenge.opaque.clone(),
            qop: qop.map(str::to_owned),
            nc: qop.map(|_| options.count),
            userhash: challenge.userhash,
        })
    }
}

/// `auth` wins over `auth-int`; an absent qop means the RFC 2069 form.
fn select_qop(offered: &[String]) -> Result<Option<&'static str>, DigestError> {
    if offered.is_empty() {
        return Ok(None);
    }
    let offers = |name: &str| offered.iter().any(|it| it.eq_ignore_ascii_case(name));
    if offers("auth") {
        Ok(Some("auth"))
    } else if offers("auth-int") {
        Ok(Some("auth-int"))
    } else {
        Err(DigestError::UnsupportedQop(offered.to_vec()))
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl fmt::Display for DigestCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Digest username={}, realm={}, nonce={}, uri={}, response={}",
            quote(&self.username),
            quote(&self.realm),
            quote(&self.nonce),
            quote(&self.uri),
            quote(&self.response),
        )?;
        if let Some(algorithm) = self.algorithm {
            write!(f, ", algorithm={algorithm}")?;
        }
        if let Some(cnonce) = &self.cnonce {
            write!(f, ", cnonce={}", quote(cnonce))?;
        }
        if let Some(opaque) = &self.opaque {
            write!(f, ", opaque={}", quote(opaque))?;
        }
        if let Some(qop) = &self.qop {
            write!(f, ", qop={qop}")?;
        }
        if let Some(nc) = self.nc {
            write!(f, ", nc={nc:08x}")?;
        }
        if self.userhash {
            f.write_str(", userhash=true")?;
        }
        Ok(())
    }
}

/// Fresh client nonce: 16 random bytes, hex encoded.
pub fn new_cnonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options<'a>(uri: &'a str, cnonce: &'a str) -> DigestOptions<'a> {
        DigestOptions {
            username: "Mufasa",
            password: "Circle Of Life",
            method: "GET",
            uri,
            body: b"",
            count: 1,
            cnonce,
        }
    }

    #[test]
    fn parses_quoted_and_token_params() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="F!Box SOAP-Auth", nonce="ABCDEF0123", algorithm=MD5, qop="auth,auth-int", opaque="x\"y""#,
        )
        .unwrap();

        assert_eq!(challenge.realm, "F!Box SOAP-Auth");
        assert_eq!(challenge.nonce, "ABCDEF0123");
        assert_eq!(challenge.algorithm.as_deref(), Some("MD5"));
        assert_eq!(challenge.qop, vec!["auth", "auth-int"]);
        assert_eq!(challenge.opaque.as_deref(), Some("x\"y"));
        assert!(!challenge.stale);
    }

    #[test]
    fn parse_rejects_other_schemes() {
        assert!(matches!(
            DigestChallenge::parse(r#"Basic realm="x""#),
            Err(DigestError::NotDigest { .. })
        ));
        assert!(DigestChallenge::parse("").is_err());
    }

    #[test]
    fn rfc2617_example_with_qop_auth() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let credential =
            DigestCredential::compute(&challenge, &options("/dir/index.html", "0a4f113b"))
                .unwrap();

        assert_eq!(credential.response, "6629fae49393a05397450978507c4ef1");
        assert_eq!(credential.qop.as_deref(), Some("auth"));
        assert_eq!(credential.nc, Some(1));
    }

    #[test]
    fn rfc2069_form_without_qop() {
        let challenge = DigestChallenge {
            realm: "testrealm@host.com".to_owned(),
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093".to_owned(),
            ..Default::default()
        };
        let credential =
            DigestCredential::compute(&challenge, &options("/dir/index.html", "unused")).unwrap();

        let ha1 = Algorithm::Md5.hash_parts(&["Mufasa", "testrealm@host.com", "Circle Of Life"]);
        let ha2 = Algorithm::Md5.hash_parts(&["GET", "/dir/index.html"]);
        let expected =
            Algorithm::Md5.hash_parts(&[&ha1, "dcd98b7102dd2f0e8b11d0f600bfb0c093", &ha2]);
        assert_eq!(credential.response, expected);
        assert!(credential.cnonce.is_none());
        assert!(credential.nc.is_none());
    }

    #[test]
    fn empty_challenge_fails_without_nonce() {
        let err = DigestCredential::compute(&DigestChallenge::default(), &options("/", "c"))
            .unwrap_err();
        assert_eq!(err, DigestError::MissingNonce);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let challenge = DigestChallenge {
            nonce: "n".to_owned(),
            algorithm: Some("SHA-512-256".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            DigestCredential::compute(&challenge, &options("/", "c")),
            Err(DigestError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn unknown_qop_is_rejected() {
        let challenge = DigestChallenge {
            nonce: "n".to_owned(),
            qop: vec!["token".to_owned()],
            ..Default::default()
        };
        assert!(matches!(
            DigestCredential::compute(&challenge, &options("/", "c")),
            Err(DigestError::UnsupportedQop(_))
        ));
    }

    #[test]
    fn sha256_session_uses_cnonce_in_ha1() {
        let challenge = DigestChallenge {
            realm: "r".to_owned(),
            nonce: "n".to_owned(),
            algorithm: Some("SHA-256-sess".to_owned()),
            qop: vec!["auth".to_owned()],
            ..Default::default()
        };
        let a = DigestCredential::compute(&challenge, &options("/", "c1")).unwrap();
        let b = DigestCredential::compute(&challenge, &options("/", "c2")).unwrap();
        assert_eq!(a.response.len(), 64);
        assert_ne!(a.response, b.response);
    }

    #[test]
    fn header_value_lists_all_fields() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="x", nonce="y", qop="auth", opaque="o", algorithm=MD5"#,
        )
        .unwrap();
        let credential = DigestCredential::compute(
            &challenge,
            &DigestOptions {
                username: "user",
                password: "pass",
                method: "POST",
                uri: "/upnp/control/deviceinfo",
                body: b"",
                count: 1,
                cnonce: "abc",
            },
        )
        .unwrap();
        let header = credential.to_string();

        assert!(header.starts_with(r#"Digest username="user", realm="x", nonce="y", uri="/upnp/control/deviceinfo", response=""#));
        assert!(header.contains(", algorithm=MD5"));
        assert!(header.contains(r#", cnonce="abc""#));
        assert!(header.contains(r#", opaque="o""#));
        assert!(header.contains(", qop=auth"));
        assert!(header.ends_with(", nc=00000001"));
    }

    #[test]
    fn cnonce_is_random_hex() {
        let a = new_cnonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, new_cnonce());
    }
}
