use std::fmt;
use std::path::PathBuf;

use reqwest::blocking::multipart::Form;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName};
use tracing::{debug, warn};

use crate::domain::{CREATE_URL_SID, DEVICE_CONFIG_PATH, UrlSidResponse};

use super::{Backup, BackupError, display_name, sanitize_filename};

const FIRMWARE_CFG_PATH: &str = "cgi-bin/firmwarecfg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetsOutcome {
    Saved(PathBuf),
    /// The web interface answered, but not with a zip archive.
    Rejected {
        status: u16,
        content_type: Option<String>,
    },
}

impl fmt::Display for AssetsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(path) => write!(f, "Downloaded: {}", display_name(path)),
            Self::Rejected {
                status,
                content_type,
            } => write!(
                f,
                "Failed to download assets (status {status}, content type {})",
                content_type.as_deref().unwrap_or("none")
            ),
        }
    }
}

impl Backup {
    /// Export phone assets through the web interface's `firmwarecfg` form.
    ///
    /// TR-064 has no action for this, so a session id is requested over SOAP
    /// and then posted with the export password as multipart form data.
    pub fn backup_assets(&self) -> Result<AssetsOutcome, BackupError> {
        let session: UrlSidResponse = self
            .soap
            .call(DEVICE_CONFIG_PATH, CREATE_URL_SID, "")
            .map_err(BackupError::soap("asset session"))?;

        let url = self
            .web_base
            .join(FIRMWARE_CFG_PATH)
            .map_err(|source| BackupError::Url {
                stage: "asset export",
                url: self.web_base.to_string(),
                source,
            })?;

        // The form fields must arrive in exactly this order.
        let form = Form::new()
            .text("sid", session.sid)
            .text(
                "AssetsImportExportPassword",
                self.settings.export.password.clone(),
            )
            .text("AssetsExport", "");

        debug!(%url, "requesting asset export");
        let response = self
            .http
            .post(url)
            .header(ACCEPT, "*/*")
            .multipart(form)
            .send()
            .map_err(BackupError::Assets)?;

        let status = response.status().as_u16();
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        let content_type = header(CONTENT_TYPE);
        let disposition = header(CONTENT_DISPOSITION);

        let is_zip = content_type
            .as_deref()
            .is_some_and(|it| it.trim().starts_with("application/zip"));
        if status != 200 || !is_zip {
            warn!(status, content_type = ?content_type, "asset export was refused");
            // Drain so the connection is released.
            let _ = response.bytes();
            return Ok(AssetsOutcome::Rejected {
                status,
                content_type,
            });
        }

        let filename = disposition
            .as_deref()
            .and_then(attachment_filename)
            .map(|name| sanitize_filename(&name, '_'))
            .unwrap_or_else(|| format!("{}-Assets.zip", self.file_prefix));
        let bytes = response.bytes().map_err(BackupError::Assets)?;
        self.save(&filename, &bytes).map(AssetsOutcome::Saved)
    }
}

/// `filename` parameter of a `Content-Disposition` header.
fn attachment_filename(header: &str) -> Option<String> {
    header.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|it| it.strip_suffix('"'))
            .unwrap_or(value);
        (!value.is_empty()).then(|| value.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{AssetsOutcome, attachment_filename};

    #[test]
    fn filename_is_read_from_content_disposition() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="FRITZ.Box 7590-Assets.zip""#).as_deref(),
            Some("FRITZ.Box 7590-Assets.zip")
        );
        assert_eq!(
            attachment_filename("attachment; size=10; FILENAME=assets.zip").as_deref(),
            Some("assets.zip")
        );
    }

    #[test]
    fn missing_filename_yields_none() {
        assert_eq!(attachment_filename("attachment"), None);
        assert_eq!(attachment_filename(r#"attachment; filename="""#), None);
        assert_eq!(attachment_filename("inline; name=x"), None);
    }

    #[test]
    fn outcome_reports_file_name_or_refusal() {
        let saved = AssetsOutcome::Saved(PathBuf::from("/srv/FRITZ.Box_7590-Assets.zip"));
        assert_eq!(saved.to_string(), "Downloaded: FRITZ.Box_7590-Assets.zip");

        let rejected = AssetsOutcome::Rejected {
            status: 200,
            content_type: Some("text/html".to_owned()),
        };
        assert_eq!(
            rejected.to_string(),
            "Failed to download assets (status 200, content type text/html)"
        );
    }
}
