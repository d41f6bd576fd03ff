//! Backup client for routers speaking TR-064 (SOAP over HTTP with digest auth).
//!
//! The crate is layered the usual way: a domain layer of validated types, a
//! transport layer for the wire format (envelopes, digest challenges, XML
//! decoding), a small client layer running one authenticated SOAP call at a
//! time, and a backup layer sequencing the calls of a full run.
//!
//! ```rust,no_run
//! use fritz_backup::{DEVICE_INFO_PATH, DeviceInfoResponse, Endpoint, GET_INFO, SoapClient};
//!
//! fn main() -> Result<(), fritz_backup::SoapError> {
//!     let endpoint = Endpoint::new("http://192.168.178.1:49000", "admin", "secret");
//!     let client = SoapClient::new(endpoint)?;
//!     let info: DeviceInfoResponse = client.call(DEVICE_INFO_PATH, GET_INFO, "")?;
//!     println!("{} running {}", info.model_name, info.software_version);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod backup;
pub mod client;
pub mod config;
pub mod domain;
mod transport;

pub use backup::{
    AssetsOutcome, Backup, BackupError, DeviceReport, FileSink, PhonebookReport, display_name,
    sanitize_filename,
};
pub use client::{SoapClient, SoapClientBuilder, SoapError, SoapErrorKind};
pub use config::{ConfigError, DEFAULT_CONFIG_FILE, Settings};
pub use domain::{
    BarringListResponse, CONTACT_PATH, CREATE_URL_SID, ConfigFileResponse, DEVICE_CONFIG_PATH,
    DEVICE_INFO_PATH, DeviceInfoResponse, Endpoint, GET_CALL_BARRING_LIST, GET_CONFIG_FILE,
    GET_INFO, GET_PHONEBOOK, GET_PHONEBOOK_LIST, PhonebookListResponse, PhonebookResponse,
    SoapAction, SoapRequest, UrlSidResponse, ValidationError,
};
pub use transport::{
    Algorithm, DecodeError, DigestChallenge, DigestCredential, DigestError, DigestOptions,
    SoapResponse, argument, encode_envelope, extract_sid, new_cnonce,
};
