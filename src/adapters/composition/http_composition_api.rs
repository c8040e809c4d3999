//! HTTP adapter for the composition backend.
//!
//! Routes (relative to `base_url`):
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get/update/delete track | `GET`/`PATCH`/`DELETE /api/tracks/{id}` |
//! | create track | `POST /api/tracks` |
//! | mute / solo | `PUT /api/tracks/{id}/mute` `{muted}` / `PUT /api/tracks/{id}/solo` `{soloed}` |
//! | tempo | `GET`/`PUT /api/transport/tempo` `{bpm}` |
//! | clips | `GET`/`DELETE /api/clips/{id}`, `POST /api/clips` |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::composition::{Clip, NewClip, NewTrack, Tempo, Track, TrackPatch};
use crate::domain::foundation::{ClipId, TrackId};
use crate::ports::{ApiError, CompositionApi};

/// Configuration for the HTTP composition client.
#[derive(Debug, Clone)]
pub struct HttpCompositionConfig {
    /// Base URL of the backend (default: http://localhost:8000).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for HttpCompositionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl HttpCompositionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct MuteBody {
    muted: bool,
}

#[derive(Serialize)]
struct SoloBody {
    soloed: bool,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

#[derive(Serialize, Deserialize)]
struct TempoBody {
    bpm: Tempo,
}

/// Composition backend reached over HTTP/JSON.
pub struct HttpCompositionApi {
    config: HttpCompositionConfig,
    client: Client,
}

impl HttpCompositionApi {
    pub fn new(config: HttpCompositionConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Request(format!(
                    "timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else if e.is_connect() {
                ApiError::Request(format!("Connection failed: {e}"))
            } else {
                ApiError::Request(e.to_string())
            }
        })
    }

    /// Maps non-success statuses to errors.
    async fn check_status(
        response: Response,
        entity: &'static str,
        id: &str,
    ) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                entity,
                id: id.to_string(),
            });
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        entity: &'static str,
        id: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let response = Self::check_status(response, entity, id).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn empty(
        &self,
        request: RequestBuilder,
        entity: &'static str,
        id: &str,
    ) -> Result<(), ApiError> {
        let response = self.send(request).await?;
        Self::check_status(response, entity, id).await?;
        Ok(())
    }
}

#[async_trait]
impl CompositionApi for HttpCompositionApi {
    async fn get_track(&self, id: &TrackId) -> Result<Track, ApiError> {
        let url = self.url(&format!("/api/tracks/{id}"));
        self.json(self.client.get(url), "track", id.as_str()).await
    }

    async fn create_track(&self, track: &NewTrack) -> Result<Track, ApiError> {
        let url = self.url("/api/tracks");
        self.json(self.client.post(url).json(track), "track", &track.name)
            .await
    }

    async fn update_track(&self, id: &TrackId, patch: &TrackPatch) -> Result<Track, ApiError> {
        let url = self.url(&format!("/api/tracks/{id}"));
        self.json(self.client.patch(url).json(patch), "track", id.as_str())
            .await
    }

    async fn delete_track(&self, id: &TrackId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/tracks/{id}"));
        self.empty(self.client.delete(url), "track", id.as_str()).await
    }

    async fn rename_track(&self, id: &TrackId, name: &str) -> Result<Track, ApiError> {
        let url = self.url(&format!("/api/tracks/{id}"));
        self.json(
            self.client.patch(url).json(&RenameBody { name }),
            "track",
            id.as_str(),
        )
        .await
    }

    async fn set_track_mute(&self, id: &TrackId, muted: bool) -> Result<Track, ApiError> {
        let url = self.url(&format!("/api/tracks/{id}/mute"));
        self.json(
            self.client.put(url).json(&MuteBody { muted }),
            "track",
            id.as_str(),
        )
        .await
    }

    async fn set_track_solo(&self, id: &TrackId, soloed: bool) -> Result<Track, ApiError> {
        let url = self.url(&format!("/api/tracks/{id}/solo"));
        self.json(
            self.client.put(url).json(&SoloBody { soloed }),
            "track",
            id.as_str(),
        )
        .await
    }

    async fn get_tempo(&self) -> Result<Tempo, ApiError> {
        let url = self.url("/api/transport/tempo");
        let body: TempoBody = self.json(self.client.get(url), "tempo", "project").await?;
        Ok(body.bpm)
    }

    async fn set_tempo(&self, tempo: Tempo) -> Result<Tempo, ApiError> {
        let url = self.url("/api/transport/tempo");
        let body: TempoBody = self
            .json(
                self.client.put(url).json(&TempoBody { bpm: tempo }),
                "tempo",
                "project",
            )
            .await?;
        Ok(body.bpm)
    }

    async fn get_clip(&self, id: &ClipId) -> Result<Clip, ApiError> {
        let url = self.url(&format!("/api/clips/{id}"));
        self.json(self.client.get(url), "clip", id.as_str()).await
    }

    async fn list_clips(&self, track_id: &TrackId) -> Result<Vec<Clip>, ApiError> {
        let url = self.url(&format!("/api/tracks/{track_id}/clips"));
        self.json(self.client.get(url), "track", track_id.as_str())
            .await
    }

    async fn create_clip(&self, clip: &NewClip) -> Result<Clip, ApiError> {
        let url = self.url("/api/clips");
        self.json(self.client.post(url).json(clip), "clip", &clip.name)
            .await
    }

    async fn delete_clip(&self, id: &ClipId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/clips/{id}"));
        self.empty(self.client.delete(url), "clip", id.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api(server: &MockServer) -> HttpCompositionApi {
        HttpCompositionApi::new(
            HttpCompositionConfig::new(server.uri()).with_timeout(Duration::from_secs(2)),
        )
        .unwrap()
    }

    fn track_json(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "volumeDb": -6.0,
            "pan": 0.0,
            "muted": false,
            "soloed": false
        })
    }

    #[tokio::test]
    async fn get_track_decodes_camel_case() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tracks/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_json("t1", "Drums")))
            .mount(&server)
            .await;

        let track = api(&server)
            .await
            .get_track(&TrackId::new("t1").unwrap())
            .await
            .unwrap();

        assert_eq!(track.name, "Drums");
        assert_eq!(track.volume_db, -6.0);
    }

    #[tokio::test]
    async fn missing_track_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/tracks/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = api(&server)
            .await
            .delete_track(&TrackId::new("ghost").unwrap())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::NotFound {
                entity: "track",
                id: "ghost".into()
            }
        );
    }

    #[tokio::test]
    async fn mute_sends_flag_body() {
        let server = MockServer::start().await;
        let mut muted = track_json("t1", "Drums");
        muted["muted"] = json!(true);
        Mock::given(method("PUT"))
            .and(path("/api/tracks/t1/mute"))
            .and(body_json(json!({"muted": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(muted))
            .expect(1)
            .mount(&server)
            .await;

        let track = api(&server)
            .await
            .set_track_mute(&TrackId::new("t1").unwrap(), true)
            .await
            .unwrap();
        assert!(track.muted);
    }

    #[tokio::test]
    async fn set_tempo_round_trips_bpm() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/transport/tempo"))
            .and(body_json(json!({"bpm": 128.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bpm": 128.0})))
            .mount(&server)
            .await;

        let tempo = api(&server)
            .await
            .set_tempo(Tempo::new(128.0).unwrap())
            .await
            .unwrap();
        assert_eq!(tempo.bpm(), 128.0);
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/clips"))
            .respond_with(ResponseTemplate::new(503).set_body_string("engine offline"))
            .mount(&server)
            .await;

        let clip = NewClip {
            track_id: TrackId::new("t1").unwrap(),
            name: "Verse".into(),
            start_beats: 0.0,
            length_beats: 4.0,
        };
        let err = api(&server).await.create_clip(&clip).await.unwrap_err();

        assert_eq!(
            err,
            ApiError::Status {
                status: 503,
                message: "engine offline".into()
            }
        );
    }

    #[tokio::test]
    async fn list_clips_decodes_track_clips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tracks/t1/clips"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "c1", "trackId": "t1", "name": "Intro", "startBeats": 0.0, "lengthBeats": 8.0},
                {"id": "c2", "trackId": "t1", "name": "Verse", "startBeats": 8.0, "lengthBeats": 16.0}
            ])))
            .mount(&server)
            .await;

        let clips = api(&server)
            .await
            .list_clips(&TrackId::new("t1").unwrap())
            .await
            .unwrap();

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1].name, "Verse");
        assert_eq!(clips[1].length_beats, 16.0);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clips/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = api(&server)
            .await
            .get_clip(&ClipId::new("c1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
