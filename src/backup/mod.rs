//! Backup run: sequences the SOAP calls and stores what the device hands out.

mod assets;
mod filename;
mod sink;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, warn};
use url::Url;

use crate::client::{SoapClient, SoapError};
use crate::config::Settings;
use crate::domain::{
    BarringListResponse, CONTACT_PATH, ConfigFileResponse, DEVICE_CONFIG_PATH, DEVICE_INFO_PATH,
    DeviceInfoResponse, GET_CALL_BARRING_LIST, GET_CONFIG_FILE, GET_INFO, GET_PHONEBOOK,
    GET_PHONEBOOK_LIST, PhonebookListResponse, PhonebookResponse,
};
use crate::transport::argument;

pub use assets::AssetsOutcome;
pub use filename::sanitize_filename;
pub use sink::FileSink;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("{stage}: {source}")]
    Soap {
        stage: &'static str,
        #[source]
        source: SoapError,
    },

    #[error("{stage}: invalid URL {url:?}: {source}")]
    Url {
        stage: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset export: {0}")]
    Assets(#[source] reqwest::Error),
}

impl BackupError {
    fn soap(stage: &'static str) -> impl FnOnce(SoapError) -> Self {
        move |source| Self::Soap { stage, source }
    }
}

#[derive(Debug, Clone)]
/// What `device_info` learned about the device.
pub struct DeviceReport {
    pub info: DeviceInfoResponse,
    pub up_since: DateTime<Local>,
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\nUp since: {}. ({})",
            self.info.description,
            self.up_since.format("%A %Y-%m-%d %H:%M:%S"),
            format_uptime(self.info.uptime()),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhonebookReport {
    pub saved: Vec<PathBuf>,
    /// Phonebooks whose download failed; the run carried on without them.
    pub failed: Vec<String>,
}

impl fmt::Display for PhonebookReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.saved {
            writeln!(f, "Downloaded: {}", display_name(path))?;
        }
        for name in &self.failed {
            writeln!(f, "Failed to download: {name}")?;
        }
        Ok(())
    }
}

/// Orchestrates one backup run against a single device.
pub struct Backup {
    settings: Settings,
    soap: SoapClient,
    sink: FileSink,
    web_base: Url,
    http: reqwest::blocking::Client,
    file_prefix: String,
}

impl Backup {
    pub fn new(settings: Settings) -> Result<Self, BackupError> {
        let mut builder = SoapClient::builder(settings.device.endpoint());
        if let Some(timeout) = settings.device.timeout() {
            builder = builder.timeout(timeout);
        }
        let soap = builder.build().map_err(BackupError::soap("client setup"))?;

        let control_url = settings.device.url();
        let web_base = web_base_url(&control_url).map_err(|source| BackupError::Url {
            stage: "client setup",
            url: control_url,
            source,
        })?;
        let http = reqwest::blocking::Client::builder()
            .timeout(settings.device.timeout())
            .build()
            .map_err(BackupError::Assets)?;

        Ok(Self {
            sink: FileSink::new(&settings.backup.target_path),
            settings,
            soap,
            web_base,
            http,
            file_prefix: String::new(),
        })
    }

    /// Point the asset export at another web interface than `http://<device ip>/`.
    pub fn with_web_base(mut self, web_base: Url) -> Self {
        self.web_base = web_base;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Prefix of every file written, set by [`Backup::device_info`].
    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    /// Fetch device info and derive the file prefix `<model>_<firmware>_<dd.mm.yy>`.
    pub fn device_info(&mut self) -> Result<DeviceReport, BackupError> {
        let info: DeviceInfoResponse = self
            .soap
            .call(DEVICE_INFO_PATH, GET_INFO, "")
            .map_err(BackupError::soap("device info"))?;

        let now = Local::now();
        self.file_prefix = file_prefix(&info, now);
        debug!(prefix = %self.file_prefix, "device identified");

        Ok(DeviceReport {
            up_since: up_since(now, info.uptime()),
            info,
        })
    }

    /// Ask the device for a one-time configuration export URL.
    pub fn config_export_url(&self) -> Result<Url, BackupError> {
        let payload = argument("NewX_AVM-DE_Password", &self.settings.export.password);
        let response: ConfigFileResponse = self
            .soap
            .call(DEVICE_CONFIG_PATH, GET_CONFIG_FILE, &payload)
            .map_err(BackupError::soap("config export"))?;

        Url::parse(&response.url).map_err(|source| BackupError::Url {
            stage: "config export",
            url: response.url,
            source,
        })
    }

    /// Download the configuration export and save it as `<prefix>-Config.export`.
    pub fn backup_config(&self, url: &Url) -> Result<PathBuf, BackupError> {
        let bytes = self
            .download(url)
            .map_err(BackupError::soap("config download"))?;
        self.save(&format!("{}-Config.export", self.file_prefix), &bytes)
    }

    /// Save every phonebook as `<prefix>-Phonebook-<name>.xml`.
    ///
    /// Failing SOAP calls abort; a failing download only marks that phonebook.
    pub fn backup_phonebooks(&self) -> Result<PhonebookReport, BackupError> {
        let list: PhonebookListResponse = self
            .soap
            .call(CONTACT_PATH, GET_PHONEBOOK_LIST, "")
            .map_err(BackupError::soap("phonebook list"))?;

        let mut report = PhonebookReport::default();
        for id in &list.ids {
            let phonebook: PhonebookResponse = self
                .soap
                .call(CONTACT_PATH, GET_PHONEBOOK, &argument("NewPhonebookID", id))
                .map_err(BackupError::soap("phonebook"))?;

            let filename = format!(
                "{}.xml",
                sanitize_filename(
                    &format!("{}-Phonebook-{}", self.file_prefix, phonebook.name),
                    '_'
                )
            );
            let saved = Url::parse(&phonebook.url)
                .map_err(|err| err.to_string())
                .and_then(|url| self.download(&url).map_err(|err| err.to_string()))
                .and_then(|bytes| self.save(&filename, &bytes).map_err(|err| err.to_string()));

            match saved {
                Ok(path) => report.saved.push(path),
                Err(error) => {
                    warn!(id = %id, url = %phonebook.url, %error, "phonebook download failed");
                    report.failed.push(phonebook.url);
                }
            }
        }
        Ok(report)
    }

    /// Download the call-barring list as `<prefix>-Barringlist.xml`.
    pub fn backup_barring_list(&self) -> Result<PathBuf, BackupError> {
        let response: BarringListResponse = self
            .soap
            .call(CONTACT_PATH, GET_CALL_BARRING_LIST, "")
            .map_err(BackupError::soap("barring list"))?;
        let url = Url::parse(&response.url).map_err(|source| BackupError::Url {
            stage: "barring list",
            url: response.url.clone(),
            source,
        })?;

        let bytes = self
            .download(&url)
            .map_err(BackupError::soap("barring list download"))?;
        self.save(&format!("{}-Barringlist.xml", self.file_prefix), &bytes)
    }

    // One-time URLs go through a client on the URL's own origin, same credentials.
    fn download(&self, url: &Url) -> Result<Vec<u8>, SoapError> {
        let origin = url.origin().ascii_serialization();
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_owned(),
        };
        self.soap.with_base_url(origin).download(&path)
    }

    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, BackupError> {
        self.sink
            .save(filename, bytes)
            .map_err(|source| BackupError::Write {
                path: self.sink.dir().join(filename),
                source,
            })
    }
}

fn file_prefix(info: &DeviceInfoResponse, now: DateTime<Local>) -> String {
    let model = info.model_name.replace('!', ".").replace(' ', "_");
    format!(
        "{}_{}_{}",
        model,
        info.software_version,
        now.format("%d.%m.%y")
    )
}

/// Boot time; an uptime reaching before the representable range clamps to `now`.
fn up_since(now: DateTime<Local>, uptime: Duration) -> DateTime<Local> {
    chrono::Duration::from_std(uptime)
        .ok()
        .and_then(|uptime| now.checked_sub_signed(uptime))
        .unwrap_or(now)
}

/// `http://<host>/` of the control URL, dropping the TR-064 port.
fn web_base_url(control_url: &str) -> Result<Url, url::ParseError> {
    let control = Url::parse(control_url)?;
    let host = control.host_str().ok_or(url::ParseError::EmptyHost)?;
    Url::parse(&format!("http://{host}/"))
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// File name of `path`, as shown in run reports.
pub fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
