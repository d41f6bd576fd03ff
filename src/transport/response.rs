use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    BarringListResponse, ConfigFileResponse, DeviceInfoResponse, PhonebookListResponse,
    PhonebookResponse, UrlSidResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid SOAP response XML: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("session descriptor has no `sid=` token: {value:?}")]
    MissingSid { value: String },
}

/// Typed body of one SOAP action's response.
///
/// Elements the device adds beyond the modelled fields are ignored, so newer
/// firmware keeps decoding.
pub trait SoapResponse: Sized {
    /// Response element inside `Envelope/Body`.
    const ELEMENT: &'static str;

    fn decode(xml: &[u8]) -> Result<Self, DecodeError>;
}

// Element names are matched with and without the usual `s:`/`u:` prefixes.
#[derive(Debug, Deserialize)]
struct Envelope<B> {
    #[serde(rename = "Body", alias = "s:Body")]
    body: B,
}

fn decode_body<B: DeserializeOwned>(xml: &[u8]) -> Result<B, DecodeError> {
    let xml = std::str::from_utf8(xml)?;
    let envelope: Envelope<B> = quick_xml::de::from_str(xml)?;
    Ok(envelope.body)
}

#[derive(Debug, Deserialize)]
struct GetInfoBody {
    #[serde(rename = "GetInfoResponse", alias = "u:GetInfoResponse")]
    response: GetInfoWire,
}

#[derive(Debug, Deserialize)]
struct GetInfoWire {
    #[serde(rename = "NewModelName")]
    model_name: String,
    #[serde(rename = "NewDescription")]
    description: String,
    #[serde(rename = "NewSoftwareVersion")]
    software_version: String,
    #[serde(rename = "NewUpTime")]
    uptime: u64,
}

impl SoapResponse for DeviceInfoResponse {
    const ELEMENT: &'static str = "GetInfoResponse";

    fn decode(xml: &[u8]) -> Result<Self, DecodeError> {
        let wire = decode_body::<GetInfoBody>(xml)?.response;
        Ok(Self {
            model_name: wire.model_name,
            description: wire.description,
            software_version: wire.software_version,
            uptime_secs: wire.uptime,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GetConfigFileBody {
    #[serde(
        rename = "X_AVM-DE_GetConfigFileResponse",
        alias = "u:X_AVM-DE_GetConfigFileResponse"
    )]
    response: GetConfigFileWire,
}

#[derive(Debug, Deserialize)]
struct GetConfigFileWire {
    #[serde(rename = "NewX_AVM-DE_ConfigFileUrl")]
    url: String,
}

impl SoapResponse for ConfigFileResponse {
    const ELEMENT: &'static str = "X_AVM-DE_GetConfigFileResponse";

    fn decode(xml: &[u8]) -> Result<Self, DecodeError> {
        let wire = decode_body::<GetConfigFileBody>(xml)?.response;
        Ok(Self {
            url: wire.url.trim().to_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GetPhonebookListBody {
    #[serde(
        rename = "GetPhonebookListResponse",
        alias = "u:GetPhonebookListResponse"
    )]
    response: GetPhonebookListWire,
}

#[derive(Debug, Deserialize)]
struct GetPhonebookListWire {
    #[serde(rename = "NewPhonebookList", default)]
    list: String,
}

impl SoapResponse for PhonebookListResponse {
    const ELEMENT: &'static str = "GetPhonebookListResponse";

    fn decode(xml: &[u8]) -> Result<Self, DecodeError> {
        let wire = decode_body::<GetPhonebookListBody>(xml)?.response;
        let ids = wire
            .list
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(Self { ids })
    }
}

#[derive(Debug, Deserialize)]
struct GetPhonebookBody {
    #[serde(rename = "GetPhonebookResponse", alias = "u:GetPhonebookResponse")]
    response: GetPhonebookWire,
}

#[derive(Debug, Deserialize)]
struct GetPhonebookWire {
    #[serde(rename = "NewPhonebookName")]
    name: String,
    #[serde(rename = "NewPhonebookExtraID", default)]
    extra_id: Option<String>,
    #[serde(rename = "NewPhonebookURL")]
    url: String,
}

impl SoapResponse for PhonebookResponse {
    const ELEMENT: &'static str = "GetPhonebookResponse";

    fn decode(xml: &[u8]) -> Result<Self, DecodeError> {
        let wire = decode_body::<GetPhonebookBody>(xml)?.response;
        Ok(Self {
            name: wire.name,
            extra_id: wire.extra_id.filter(|id| !id.is_empty()),
            url: wire.url.trim().to_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GetCallBarringListBody {
    #[serde(
        rename = "GetCallBarringListResponse",
        alias = "u:GetCallBarringListResponse"
    )]
    response: GetCallBarringListWire,
}

#[derive(Debug, Deserialize)]
struct GetCallBarringListWire {
    #[serde(rename = "NewPhonebookURL")]
    url: String,
}

impl SoapResponse for BarringListResponse {
    const ELEMENT: &'static str = "GetCallBarringListResponse";

    fn decode(xml: &[u8]) -> Result<Self, DecodeError> {
        let wire = decode_body::<GetCallBarringListBody>(xml)?.response;
        Ok(Self {
            url: wire.url.trim().to_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreateUrlSidBody {
    #[serde(
        rename = "X_AVM-DE_CreateUrlSIDResponse",
        alias = "u:X_AVM-DE_CreateUrlSIDResponse"
    )]
    response: CreateUrlSidWire,
}

#[derive(Debug, Deserialize)]
struct CreateUrlSidWire {
    #[serde(rename = "NewX_AVM-DE_UrlSID", alias = "NewXAVMDEUrlSID")]
    url_sid: String,
}

impl SoapResponse for UrlSidResponse {
    const ELEMENT: &'static str = "X_AVM-DE_CreateUrlSIDResponse";

    fn decode(xml: &[u8]) -> Result<Self, DecodeError> {
        let url_sid = decode_body::<CreateUrlSidBody>(xml)?.response.url_sid;
        let sid = extract_sid(&url_sid)?.to_owned();
        Ok(Self { url_sid, sid })
    }
}

/// Everything after the first `sid=`.
pub fn extract_sid(url_sid: &str) -> Result<&str, DecodeError> {
    url_sid
        .split_once("sid=")
        .map(|(_, token)| token)
        .ok_or_else(|| DecodeError::MissingSid {
            value: url_sid.to_owned(),
        })
}
