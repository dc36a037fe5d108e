//! HTTP implementation of [`MediaService`] over the vendor's REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{MediaError, MediaService};

/// How long to wait on any single vendor call before reporting failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the media vendor.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Base URL of the vendor API, without a trailing slash.
    pub base_url: String,
    /// Value sent in the `Authorization` header.
    pub api_key: String,
    /// Vendor application id, echoed to clients so their SDK can join.
    pub app_id: String,
}

/// [`MediaService`] backed by the vendor's REST API.
pub struct HttpMediaService {
    http: reqwest::Client,
    config: MediaConfig,
}

impl HttpMediaService {
    pub fn new(config: MediaConfig) -> Result<Self, MediaError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// The application id clients need alongside their join credential.
    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }
}

// -- Request/response DTOs --------------------------------------------------

#[derive(Serialize)]
struct CreateMeetingRequest<'a> {
    title: &'a str,
    waiting_room_enabled: bool,
}

#[derive(Deserialize)]
struct MeetingEnvelope {
    data: MeetingData,
}

#[derive(Deserialize)]
struct MeetingData {
    id: String,
}

#[derive(Serialize)]
struct AddParticipantRequest<'a> {
    name: &'a str,
    preset_name: &'a str,
    custom_participant_id: &'a str,
}

#[derive(Deserialize)]
struct ParticipantEnvelope {
    data: ParticipantData,
}

#[derive(Deserialize)]
struct ParticipantData {
    token: String,
}

fn parse_meeting_response(body: &str) -> Result<String, MediaError> {
    let envelope: MeetingEnvelope = serde_json::from_str(body)
        .map_err(|e| MediaError::Malformed(e.to_string()))?;
    Ok(envelope.data.id)
}

fn parse_participant_response(body: &str) -> Result<String, MediaError> {
    let envelope: ParticipantEnvelope = serde_json::from_str(body)
        .map_err(|e| MediaError::Malformed(e.to_string()))?;
    Ok(envelope.data.token)
}

#[async_trait]
impl MediaService for HttpMediaService {
    async fn create_session(
        &self,
        title: &str,
        waiting_room_disabled: bool,
    ) -> Result<String, MediaError> {
        let url = format!("{}/meetings", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", &self.config.api_key)
            .json(&CreateMeetingRequest {
                title,
                waiting_room_enabled: !waiting_room_disabled,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MediaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let session_id = parse_meeting_response(&body)?;
        tracing::info!(%session_id, title, "media session created");
        Ok(session_id)
    }

    async fn issue_join_credential(
        &self,
        session_id: &str,
        display_name: &str,
        preset_name: &str,
        client_instance_id: &str,
    ) -> Result<String, MediaError> {
        let url = format!(
            "{}/meetings/{session_id}/participants",
            self.config.base_url
        );
        let response = self
            .http
            .post(&url)
            .header("Authorization", &self.config.api_key)
            .json(&AddParticipantRequest {
                name: display_name,
                preset_name,
                custom_participant_id: client_instance_id,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MediaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_participant_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meeting_response() {
        let id =
            parse_meeting_response(r#"{"data":{"id":"meet-1"}}"#).unwrap();
        assert_eq!(id, "meet-1");
    }

    #[test]
    fn test_parse_meeting_response_malformed() {
        let result = parse_meeting_response(r#"{"ok":true}"#);
        assert!(matches!(result, Err(MediaError::Malformed(_))));
    }

    #[test]
    fn test_parse_participant_response() {
        let token =
            parse_participant_response(r#"{"data":{"token":"jwt-ish"}}"#)
                .unwrap();
        assert_eq!(token, "jwt-ish");
    }

    #[test]
    fn test_parse_participant_response_malformed() {
        let result = parse_participant_response("[]");
        assert!(matches!(result, Err(MediaError::Malformed(_))));
    }
}
