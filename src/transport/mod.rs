//! Transport layer: wire-format details (SOAP envelopes, digest auth, XML decoding).

mod digest;
mod envelope;
mod response;

pub use digest::{
    Algorithm, DigestChallenge, DigestCredential, DigestError, DigestOptions, new_cnonce,
};
pub use envelope::{argument, encode_envelope};
pub use response::{DecodeError, SoapResponse, extract_sid};
