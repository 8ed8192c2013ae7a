//! C6's diagnostic sibling: the collaborator that collects log files into an
//! archive and ships it to the Central System's FTP drop, kept behind a
//! trait so the `GetDiagnostics` handler never touches a socket or the
//! filesystem directly — the same separation the teacher draws around
//! `CommandSender`.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone)]
pub enum DiagnosticsError {
    #[error("unsupported upload scheme: {0}")]
    UnsupportedScheme(String),
    #[error("diagnostics collection failed: {0}")]
    CollectionFailed(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// One upload progress tick. The handler forwards each `Progress` as a
/// `DiagnosticsStatusNotification(Uploading)`.
#[derive(Debug, Clone, Copy)]
pub struct Progress;

#[async_trait]
pub trait DiagnosticsCollaborator: Send + Sync {
    /// Collect logs for `station_id` and upload the resulting archive to
    /// `destination` (an `ftp://` URL). Emits a [`Progress`] tick on `progress`
    /// per chunk transferred; returns the archive's file name on success.
    async fn collect_and_upload(
        &self,
        station_id: &str,
        destination: &str,
        progress: mpsc::UnboundedSender<Progress>,
    ) -> Result<String, DiagnosticsError>;
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Always reports the given outcome without touching a filesystem or
    /// socket.
    pub struct StubDiagnostics {
        pub outcome: Result<String, DiagnosticsError>,
    }

    impl StubDiagnostics {
        pub fn succeeding(file_name: impl Into<String>) -> Self {
            Self {
                outcome: Ok(file_name.into()),
            }
        }

        pub fn failing() -> Self {
            Self {
                outcome: Err(DiagnosticsError::UploadFailed("stub failure".into())),
            }
        }
    }

    #[async_trait]
    impl DiagnosticsCollaborator for StubDiagnostics {
        async fn collect_and_upload(
            &self,
            _station_id: &str,
            _destination: &str,
            _progress: mpsc::UnboundedSender<Progress>,
        ) -> Result<String, DiagnosticsError> {
            self.outcome.clone()
        }
    }
}
