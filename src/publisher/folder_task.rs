//! # Folder Task Module
//!
//! Worker per l'upload di una singola cartella.
//! Separato dall'orchestratore per maggiore modularità.
//!
//! ## Pipeline per cartella:
//! 1. Risolve di nuovo video + `metadata.json` (la cartella può essere cambiata)
//! 2. Costruisce il corpo della richiesta (tag ridotti + slot di pubblicazione)
//! 3. Crea il trasporto e porta la sessione resumable a uno stato terminale

use crate::{
    config::Config,
    credentials::CredentialProvider,
    error::UploadError,
    file_manager::{FileManager, FolderCandidate},
    metadata::VideoMetadata,
    schedule::PublishSlot,
    upload::{ChunkTransport, ProgressObserver, ResumableUploadSession, UploadRequestBody, YouTubeTransport},
};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tracing::debug;

/// Creates one transport per upload
#[async_trait]
pub trait TransportFactory: Send + Sync {
    type Transport: ChunkTransport;

    async fn create(&self, video: &Path, body: UploadRequestBody) -> Result<Self::Transport, UploadError>;
}

/// Transports talking to the YouTube Data API, each with a token that is
/// valid when its upload starts
pub struct YouTubeTransportFactory {
    client: Client,
    credentials: CredentialProvider,
    chunk_size: usize,
    endpoint: Option<String>,
}

impl YouTubeTransportFactory {
    pub fn new(client: Client, credentials: CredentialProvider, chunk_size: usize) -> Self {
        Self {
            client,
            credentials,
            chunk_size,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[async_trait]
impl TransportFactory for YouTubeTransportFactory {
    type Transport = YouTubeTransport;

    async fn create(&self, video: &Path, body: UploadRequestBody) -> Result<YouTubeTransport, UploadError> {
        let access_token = self.credentials.current_token().await?;
        let transport = YouTubeTransport::new(self.client.clone(), access_token, video, body, self.chunk_size);
        Ok(match &self.endpoint {
            Some(endpoint) => transport.with_endpoint(endpoint.clone()),
            None => transport,
        })
    }
}

/// Upload of one selected folder
pub struct FolderTask<'a> {
    pub candidate: &'a FolderCandidate,
    pub slot: PublishSlot,
}

impl<'a> FolderTask<'a> {
    pub fn new(candidate: &'a FolderCandidate, slot: PublishSlot) -> Self {
        Self { candidate, slot }
    }

    /// Resolve assets and build the request body
    pub async fn prepare(&self, config: &Config) -> Result<(FolderCandidate, UploadRequestBody), UploadError> {
        let resolved = FileManager::find_video_meta(&self.candidate.path)?;
        let metadata = VideoMetadata::load(&resolved.metadata, &resolved.video).await?;
        let body = UploadRequestBody::build(&metadata, &self.slot, config);

        if body.snippet.tags.len() < metadata.tags.len() {
            debug!(
                "{}: kept {} of {} tags within the {} budget",
                resolved.name,
                body.snippet.tags.len(),
                metadata.tags.len(),
                config.tag_budget
            );
        }

        Ok((resolved, body))
    }

    /// Prepare and upload, returning the remote video id
    pub async fn run<F, O>(&self, config: &Config, factory: &F, observer: &mut O) -> Result<String, UploadError>
    where
        F: TransportFactory,
        O: ProgressObserver,
    {
        let (resolved, body) = self.prepare(config).await?;
        let transport = factory.create(&resolved.video, body).await?;
        let mut session = ResumableUploadSession::new(transport, config.progress_step);
        session.run(observer).await
    }
}
