//! # YouTube Resumable Transport
//!
//! Implementazione di `ChunkTransport` sul protocollo resumable della
//! YouTube Data API v3.
//!
//! ## Protocollo:
//! 1. **Inizializzazione**: `POST /upload/youtube/v3/videos?uploadType=resumable&part=snippet,status`
//!    con il corpo JSON e gli header `X-Upload-Content-Type` / `X-Upload-Content-Length`.
//!    L'header `Location` della risposta è l'URI di sessione.
//! 2. **Chunk**: `PUT <session uri>` con `Content-Range: bytes start-end/total`.
//!    - `308 Resume Incomplete` + `Range: bytes=0-N` → riprendere da `N + 1`
//!    - `200` / `201` → risorsa video creata, il campo `id` è il risultato
//!    - qualunque altro stato → errore di trasferimento
//!
//! ## Risorse:
//! Il file viene aperto al primo chunk e chiuso quando il trasporto viene
//! rilasciato. Il client HTTP deve avere i redirect disabilitati, altrimenti
//! il `308` verrebbe seguito invece di essere restituito.

use crate::error::UploadError;
use crate::file_manager::FileManager;
use crate::upload::request::UploadRequestBody;
use crate::upload::session::{ChunkStatus, ChunkTransport};
use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, LOCATION, RANGE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// HTTP client suitable for the resumable protocol
pub fn build_client() -> Result<Client, UploadError> {
    Ok(Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Uploads one video file through a resumable session
pub struct YouTubeTransport {
    client: Client,
    access_token: String,
    endpoint: String,
    video: PathBuf,
    body: UploadRequestBody,
    chunk_size: usize,
    file: Option<File>,
    total: u64,
    offset: u64,
    session_uri: Option<String>,
}

impl YouTubeTransport {
    pub fn new(
        client: Client,
        access_token: impl Into<String>,
        video: &Path,
        body: UploadRequestBody,
        chunk_size: usize,
    ) -> Self {
        Self {
            client,
            access_token: access_token.into(),
            endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            video: video.to_path_buf(),
            body,
            chunk_size,
            file: None,
            total: 0,
            offset: 0,
            session_uri: None,
        }
    }

    /// Point the transport at another upload endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Open the file and obtain the session URI
    async fn initiate(&mut self) -> Result<String, UploadError> {
        let file = File::open(&self.video).await?;
        self.total = file.metadata().await?.len();
        self.file = Some(file);

        debug!(
            "Initiating resumable upload of {} ({})",
            self.video.display(),
            FileManager::format_size(self.total)
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", FileManager::video_mime_type(&self.video))
            .header("X-Upload-Content-Length", self.total.to_string())
            .json(&self.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UploadError::Transfer(format!("session initiation failed (HTTP {}): {}", status, text)));
        }

        let uri = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| UploadError::Transfer("no Location header in session initiation response".to_string()))?;

        self.session_uri = Some(uri.clone());
        Ok(uri)
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, UploadError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| UploadError::Transfer("video file not open".to_string()))?;

        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::with_capacity(self.chunk_size.min(self.total as usize));
        (&mut *file).take(self.chunk_size as u64).read_to_end(&mut buf).await?;
        Ok(buf)
    }

    fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.offset as f64 / self.total as f64
        }
    }
}

/// Next byte offset from a `Range: bytes=0-N` header
fn confirmed_offset(range: Option<&str>) -> Result<u64, UploadError> {
    let Some(range) = range else {
        return Ok(0);
    };
    range
        .trim()
        .strip_prefix("bytes=")
        .and_then(|r| r.split('-').nth(1))
        .and_then(|end| end.trim().parse::<u64>().ok())
        .map(|end| end + 1)
        .ok_or_else(|| UploadError::Transfer(format!("malformed Range header '{}'", range)))
}

#[async_trait]
impl ChunkTransport for YouTubeTransport {
    async fn next_chunk(&mut self) -> Result<ChunkStatus, UploadError> {
        let uri = match self.session_uri.clone() {
            Some(uri) => uri,
            None => self.initiate().await?,
        };

        let chunk = self.read_chunk().await?;
        let content_range = if chunk.is_empty() {
            format!("bytes */{}", self.total)
        } else {
            format!("bytes {}-{}/{}", self.offset, self.offset + chunk.len() as u64 - 1, self.total)
        };

        let response = self
            .client
            .put(&uri)
            .bearer_auth(&self.access_token)
            .header(CONTENT_RANGE, content_range)
            .body(chunk)
            .send()
            .await?;

        match response.status() {
            StatusCode::PERMANENT_REDIRECT => {
                let range = response.headers().get(RANGE).and_then(|v| v.to_str().ok());
                self.offset = confirmed_offset(range)?;
                Ok(ChunkStatus::Pending(Some(self.fraction())))
            }
            StatusCode::OK | StatusCode::CREATED => {
                let resource: VideoResource = response.json().await?;
                Ok(ChunkStatus::Complete { video_id: resource.id })
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(UploadError::Transfer(format!("HTTP {}: {}", status, text)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::metadata::VideoMetadata;
    use crate::schedule::PublishSlot;
    use crate::upload::session::ResumableUploadSession;
    use mockito::Matcher;
    use tempfile::TempDir;

    const CHUNK: usize = 256 * 1024;

    fn body() -> UploadRequestBody {
        let metadata = VideoMetadata {
            title: "Robot".to_string(),
            description: String::new(),
            tags: vec!["ai".to_string()],
        };
        UploadRequestBody::build(&metadata, &PublishSlot::Immediate, &Config::default())
    }

    fn video_file(dir: &TempDir, size: usize) -> PathBuf {
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![7u8; size]).unwrap();
        path
    }

    #[test]
    fn test_confirmed_offset() {
        assert_eq!(confirmed_offset(None).unwrap(), 0);
        assert_eq!(confirmed_offset(Some("bytes=0-262143")).unwrap(), 262144);
        assert!(confirmed_offset(Some("garbage")).is_err());
    }

    #[tokio::test]
    async fn test_two_chunk_upload() {
        let temp_dir = TempDir::new().unwrap();
        let video = video_file(&temp_dir, 300_000);
        let mut server = mockito::Server::new_async().await;

        let init = server
            .mock("POST", "/upload/youtube/v3/videos")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("uploadType".into(), "resumable".into()),
                Matcher::UrlEncoded("part".into(), "snippet,status".into()),
            ]))
            .match_header("authorization", "Bearer token-123")
            .match_header("x-upload-content-length", "300000")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "status": {"privacyStatus": "public"}
            })))
            .with_status(200)
            .with_header("location", &format!("{}/session/abc", server.url()))
            .create_async()
            .await;
        let first = server
            .mock("PUT", "/session/abc")
            .match_header("content-range", "bytes 0-262143/300000")
            .with_status(308)
            .with_header("range", "bytes=0-262143")
            .create_async()
            .await;
        let last = server
            .mock("PUT", "/session/abc")
            .match_header("content-range", "bytes 262144-299999/300000")
            .with_status(200)
            .with_body(r#"{"kind": "youtube#video", "id": "vid123"}"#)
            .create_async()
            .await;

        let transport = YouTubeTransport::new(build_client().unwrap(), "token-123", &video, body(), CHUNK)
            .with_endpoint(format!("{}/upload/youtube/v3/videos", server.url()));
        let mut session = ResumableUploadSession::new(transport, 0.05);

        let mut seen = Vec::new();
        let id = session.run(&mut |p: f64| seen.push(p)).await.unwrap();

        assert_eq!(id, "vid123");
        assert_eq!(seen.len(), 1);
        assert!((seen[0] - 262_144.0 / 300_000.0).abs() < 1e-9);
        init.assert_async().await;
        first.assert_async().await;
        last.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_fails_session() {
        let temp_dir = TempDir::new().unwrap();
        let video = video_file(&temp_dir, 1000);
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/upload/youtube/v3/videos")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"message": "quotaExceeded"}}"#)
            .create_async()
            .await;

        let transport = YouTubeTransport::new(build_client().unwrap(), "token", &video, body(), CHUNK)
            .with_endpoint(format!("{}/upload/youtube/v3/videos", server.url()));
        let mut session = ResumableUploadSession::new(transport, 0.05);

        let err = session.run(&mut |_: f64| {}).await.unwrap_err();
        assert!(matches!(err, UploadError::Transfer(ref msg) if msg.contains("403") && msg.contains("quotaExceeded")));
    }

    #[tokio::test]
    async fn test_server_error_on_chunk() {
        let temp_dir = TempDir::new().unwrap();
        let video = video_file(&temp_dir, 1000);
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/upload/youtube/v3/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("location", &format!("{}/session/xyz", server.url()))
            .create_async()
            .await;
        let chunk = server
            .mock("PUT", "/session/xyz")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let transport = YouTubeTransport::new(build_client().unwrap(), "token", &video, body(), CHUNK)
            .with_endpoint(format!("{}/upload/youtube/v3/videos", server.url()));
        let mut session = ResumableUploadSession::new(transport, 0.05);

        assert!(session.run(&mut |_: f64| {}).await.is_err());
        chunk.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_video_file() {
        let temp_dir = TempDir::new().unwrap();
        let transport = YouTubeTransport::new(
            build_client().unwrap(),
            "token",
            &temp_dir.path().join("absent.mp4"),
            body(),
            CHUNK,
        );
        let mut session = ResumableUploadSession::new(transport, 0.05);
        assert!(matches!(session.run(&mut |_: f64| {}).await, Err(UploadError::Io(_))));
    }
}
