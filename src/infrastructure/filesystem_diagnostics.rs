//! Concrete `DiagnosticsCollaborator`: tars up `*.log` files under a
//! configured directory, gzips the archive, and ships it to an `ftp://`
//! destination with `suppaftp`.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use suppaftp::FtpStream;
use tokio::sync::mpsc;

use crate::application::diagnostics::{DiagnosticsCollaborator, DiagnosticsError, Progress};

pub struct FileSystemDiagnostics {
    logs_root: PathBuf,
}

impl FileSystemDiagnostics {
    pub fn new(logs_root: impl Into<PathBuf>) -> Self {
        Self {
            logs_root: logs_root.into(),
        }
    }

    fn build_archive(&self, station_id: &str) -> Result<(String, Vec<u8>), DiagnosticsError> {
        let file_name = format!("{station_id}_logs.tar.gz");
        let mut buffer = Vec::new();
        {
            let encoder = GzEncoder::new(&mut buffer, Compression::default());
            let mut builder = tar::Builder::new(encoder);

            let entries = std::fs::read_dir(&self.logs_root)
                .map_err(|e| DiagnosticsError::CollectionFailed(e.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|e| DiagnosticsError::CollectionFailed(e.to_string()))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("log") {
                    continue;
                }
                append_log(&mut builder, &path)?;
            }

            builder
                .finish()
                .map_err(|e| DiagnosticsError::CollectionFailed(e.to_string()))?;
        }
        Ok((file_name, buffer))
    }
}

fn append_log<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    path: &Path,
) -> Result<(), DiagnosticsError> {
    let mut file = std::fs::File::open(path).map_err(|e| DiagnosticsError::CollectionFailed(e.to_string()))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| DiagnosticsError::CollectionFailed(e.to_string()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.log");
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, name, contents.as_slice())
        .map_err(|e| DiagnosticsError::CollectionFailed(e.to_string()))
}

#[async_trait]
impl DiagnosticsCollaborator for FileSystemDiagnostics {
    async fn collect_and_upload(
        &self,
        station_id: &str,
        destination: &str,
        progress: mpsc::UnboundedSender<Progress>,
    ) -> Result<String, DiagnosticsError> {
        let stripped = destination
            .strip_prefix("ftp://")
            .ok_or_else(|| DiagnosticsError::UnsupportedScheme(destination.to_string()))?;
        let (authority, remote_path) = stripped.split_once('/').unwrap_or((stripped, ""));

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };
        let (user, pass) = match userinfo.map(|u| u.split_once(':')) {
            Some(Some((user, pass))) => (user.to_string(), pass.to_string()),
            Some(None) => (userinfo.unwrap().to_string(), String::new()),
            None => ("anonymous".to_string(), "anonymous".to_string()),
        };
        let host = if host_port.contains(':') {
            host_port.to_string()
        } else {
            format!("{host_port}:21")
        };

        let station_id = station_id.to_string();

        let (file_name, archive) = self.build_archive(&station_id)?;
        let _ = progress.send(Progress);

        let remote_path_owned = if remote_path.is_empty() {
            file_name.clone()
        } else {
            format!("{remote_path}/{file_name}")
        };

        tokio::task::spawn_blocking(move || -> Result<(), DiagnosticsError> {
            let mut ftp = FtpStream::connect(&host)
                .map_err(|e| DiagnosticsError::UploadFailed(e.to_string()))?;
            ftp.login(&user, &pass)
                .map_err(|e| DiagnosticsError::UploadFailed(e.to_string()))?;
            let mut cursor = std::io::Cursor::new(archive);
            ftp.put_file(&remote_path_owned, &mut cursor)
                .map_err(|e| DiagnosticsError::UploadFailed(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| DiagnosticsError::UploadFailed(e.to_string()))??;

        let _ = progress.send(Progress);
        Ok(file_name)
    }
}
