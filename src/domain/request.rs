use crate::domain::validation::ValidationError;
use crate::domain::value::SoapAction;

pub const DEVICE_INFO_PATH: &str = "/upnp/control/deviceinfo";
pub const DEVICE_CONFIG_PATH: &str = "/upnp/control/deviceconfig";
pub const CONTACT_PATH: &str = "/upnp/control/x_contact";

pub const GET_INFO: &str = "urn:dslforum-org:service:DeviceInfo:1#GetInfo";
pub const GET_CONFIG_FILE: &str = "urn:dslforum-org:service:DeviceConfig:1#X_AVM-DE_GetConfigFile";
pub const CREATE_URL_SID: &str = "urn:dslforum-org:service:DeviceConfig:1#X_AVM-DE_CreateUrlSID";
pub const GET_PHONEBOOK_LIST: &str = "urn:dslforum-org:service:X_AVM-DE_OnTel:1#GetPhonebookList";
pub const GET_PHONEBOOK: &str = "urn:dslforum-org:service:X_AVM-DE_OnTel:1#GetPhonebook";
pub const GET_CALL_BARRING_LIST: &str =
    "urn:dslforum-org:service:X_AVM-DE_OnTel:1#GetCallBarringList";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One call against the device: target path, optional action and inner payload.
///
/// Built fresh for every call. Without an action the request carries no body
/// at all, which is how plain file downloads go through the same client.
pub struct SoapRequest {
    path: String,
    action: Option<SoapAction>,
    payload: String,
}

impl SoapRequest {
    /// Build a request; an empty `action` selects the plain-download form and
    /// discards `payload`.
    pub fn new(
        path: impl Into<String>,
        action: &str,
        payload: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let path = path.into();
        if action.is_empty() {
            return Ok(Self {
                path,
                action: None,
                payload: String::new(),
            });
        }
        Ok(Self {
            path,
            action: Some(SoapAction::new(action)?),
            payload: payload.into(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> Option<&SoapAction> {
        self.action.as_ref()
    }

    /// Raw XML fragment placed inside the method element.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}
