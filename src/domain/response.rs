use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfoResponse {
    pub model_name: String,
    pub description: String,
    pub software_version: String,
    pub uptime_secs: u64,
}

impl DeviceInfoResponse {
    pub fn uptime(&self) -> Duration {
        Duration::from_secs(self.uptime_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileResponse {
    /// One-time URL of the configuration export.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookListResponse {
    /// Phonebook identifiers in device order.
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonebookResponse {
    pub name: String,
    pub extra_id: Option<String>,
    /// One-time URL of the phonebook XML.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarringListResponse {
    /// One-time URL of the call-barring list XML.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSidResponse {
    /// Session descriptor as sent by the device, e.g. `sid=0123abcd`.
    pub url_sid: String,
    /// Token following the first `sid=`.
    pub sid: String,
}
