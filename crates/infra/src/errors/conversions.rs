//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use moodmix_common::storage::StorageError;
use moodmix_domain::MoodmixError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MoodmixError);

impl From<InfraError> for MoodmixError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MoodmixError> for InfraError {
    fn from(value: MoodmixError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMoodmixError {
    fn into_moodmix(self) -> MoodmixError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MoodmixError */
/* -------------------------------------------------------------------------- */

impl IntoMoodmixError for HttpError {
    fn into_moodmix(self) -> MoodmixError {
        if self.is_timeout() {
            return MoodmixError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MoodmixError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => MoodmixError::Auth(message),
                404 => MoodmixError::NotFound(message),
                400..=499 if code != 429 => MoodmixError::InvalidInput(message),
                _ => MoodmixError::Network(message),
            };
        }

        if self.is_decode() {
            return MoodmixError::InvalidInput(format!("malformed response body: {self}"));
        }

        MoodmixError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_moodmix())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError / io::Error → MoodmixError */
/* -------------------------------------------------------------------------- */

impl IntoMoodmixError for StorageError {
    fn into_moodmix(self) -> MoodmixError {
        match self {
            StorageError::Decode { .. } | StorageError::Encode { .. } => {
                MoodmixError::InvalidInput(self.to_string())
            }
            StorageError::Io(message) => MoodmixError::Storage(message),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        Self(value.into_moodmix())
    }
}

impl IntoMoodmixError for IoError {
    fn into_moodmix(self) -> MoodmixError {
        MoodmixError::Storage(format!("I/O failure: {self}"))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_moodmix())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn status_error(status: StatusCode) -> HttpError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err()
    }

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let mapped: MoodmixError = InfraError::from(status_error(StatusCode::UNAUTHORIZED).await).into();
        match mapped {
            MoodmixError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_status_429_is_network_error() {
        let mapped: MoodmixError =
            InfraError::from(status_error(StatusCode::TOO_MANY_REQUESTS).await).into();
        assert!(matches!(mapped, MoodmixError::Network(_)));
    }

    #[test]
    fn storage_decode_maps_to_invalid_input() {
        let err = StorageError::Decode { key: "liked_songs".into(), message: "eof".into() };
        let mapped: MoodmixError = InfraError::from(err).into();
        assert!(matches!(mapped, MoodmixError::InvalidInput(msg) if msg.contains("liked_songs")));
    }

    #[test]
    fn io_errors_map_to_storage() {
        let err = IoError::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let mapped: MoodmixError = InfraError::from(err).into();
        assert!(matches!(mapped, MoodmixError::Storage(msg) if msg.contains("read-only")));
    }
}
