mod response;
mod transport;

pub use response::interpret_response;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};

use crate::model::{SelectedFile, SubmissionResult};
use std::time::Duration;
use thiserror::Error;

pub const NO_FILE_MESSAGE: &str = "Por favor, selecione um arquivo";
pub const TIMEOUT_MESSAGE: &str =
    "Tempo de processamento excedido. O arquivo pode ser muito grande ou o servidor está lento.";
pub const CONNECTIVITY_MESSAGE: &str =
    "Erro ao processar arquivo. Verifique sua conexão com a internet e se o servidor está online.";

/// Every way a submission can fail. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{}", NO_FILE_MESSAGE)]
    NoFileSelected,

    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity { cause: String },

    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Application(String),
}

impl SubmissionError {
    /// Only failures that happened before any request was sent skip the history log.
    pub fn records_history(&self) -> bool {
        !matches!(self, SubmissionError::NoFileSelected)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::NoFileSelected => "validation",
            SubmissionError::Connectivity { .. } => "connectivity",
            SubmissionError::Timeout => "timeout",
            SubmissionError::Http { .. } => "http",
            SubmissionError::Application(_) => "application",
        }
    }
}

/// Send one file and interpret the outcome, aborting after `deadline`.
///
/// The request future is dropped when the deadline fires, which cancels the
/// in-flight request. `tokio::time::timeout` owns the timer, so it is released on
/// every completion path.
pub async fn execute_submission<T>(
    transport: &T,
    file: &SelectedFile,
    deadline: Duration,
) -> Result<SubmissionResult, SubmissionError>
where
    T: Transport + ?Sized,
{
    match tokio::time::timeout(deadline, transport.post_file(file)).await {
        Err(_) => {
            tracing::warn!(file = %file.name, ?deadline, "submission timed out");
            Err(SubmissionError::Timeout)
        }
        Ok(Err(e)) => {
            tracing::warn!(file = %file.name, error = %e, "transport failure");
            Err(SubmissionError::Connectivity {
                cause: e.to_string(),
            })
        }
        Ok(Ok(resp)) => interpret_response(&resp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::StatusCode;

    struct Hanging;

    #[async_trait]
    impl Transport for Hanging {
        async fn post_file(&self, _file: &SelectedFile) -> Result<RawResponse, TransportError> {
            futures::future::pending().await
        }
    }

    struct Fixed(u16, &'static str);

    #[async_trait]
    impl Transport for Fixed {
        async fn post_file(&self, _file: &SelectedFile) -> Result<RawResponse, TransportError> {
            Ok(RawResponse {
                status: StatusCode::from_u16(self.0).unwrap(),
                body: Bytes::from_static(self.1.as_bytes()),
            })
        }
    }

    struct BadUrl;

    #[async_trait]
    impl Transport for BadUrl {
        async fn post_file(&self, _file: &SelectedFile) -> Result<RawResponse, TransportError> {
            Err(TransportError::InvalidUrl("nope".into()))
        }
    }

    fn file() -> SelectedFile {
        SelectedFile::new("contratos.xlsx", vec![0u8; 16])
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_yields_timeout() {
        let err = execute_submission(&Hanging, &file(), Duration::from_secs(120))
            .await
            .unwrap_err();
        assert_eq!(err, SubmissionError::Timeout);
        assert_eq!(err.to_string(), TIMEOUT_MESSAGE);
    }

    #[tokio::test]
    async fn transport_failure_is_connectivity() {
        let err = execute_submission(&BadUrl, &file(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "connectivity");
        assert_eq!(err.to_string(), CONNECTIVITY_MESSAGE);
        assert!(err.records_history());
    }

    #[tokio::test]
    async fn response_goes_through_interpretation() {
        let r = execute_submission(
            &Fixed(200, r#"{"total_linhas": 42}"#),
            &file(),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(r.total_rows, Some(42));
    }

    #[test]
    fn validation_error_skips_history() {
        assert!(!SubmissionError::NoFileSelected.records_history());
        assert_eq!(SubmissionError::NoFileSelected.to_string(), NO_FILE_MESSAGE);
    }
}
