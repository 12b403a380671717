//! # OAuth Credentials Module
//!
//! Fornisce un access token con scope `youtube.upload`.
//!
//! ## Responsabilità:
//! - Verifica la presenza di `client_secret.json` (credenziali OAuth desktop)
//! - Riutilizza `token.json` finché non è scaduto
//! - Rinnova il token con il refresh token quando scade
//! - Altrimenti avvia il consenso manuale: stampa l'URL, legge il codice
//!   (o l'URL di redirect incollato) e lo scambia con un token
//! - Persiste il token ottenuto in `token.json`
//!
//! ## Errori:
//! Qualunque problema qui è un `UploadError::Credential`, fatale per il run
//! e segnalato prima di qualsiasi upload.

use crate::error::UploadError;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Tokens expiring sooner than this are refreshed
const EXPIRY_SKEW_SECONDS: i64 = 60;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client as downloaded from Google Cloud Console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn from_json(content: &str) -> Result<Self, UploadError> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| UploadError::Credential(format!("malformed client secret: {}", e)))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| UploadError::Credential("client secret has no 'installed' section".to_string()))
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris.first().map(String::as_str).unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// URL the user opens to grant upload access
    pub fn consent_url(&self) -> Result<Url, UploadError> {
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("response_type", "code"),
                ("scope", UPLOAD_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| UploadError::Credential(format!("invalid auth uri '{}': {}", self.auth_uri, e)))
    }
}

/// Cached token, persisted as `token.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Tokens without an expiry are assumed valid
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry > now + Duration::seconds(EXPIRY_SKEW_SECONDS),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Extract the authorization code from a pasted code or redirect URL
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

/// Resolves an access token from the credential files
pub struct CredentialProvider {
    client: Client,
    client_secret_path: PathBuf,
    token_path: PathBuf,
}

impl CredentialProvider {
    pub fn new(client: Client, client_secret_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            client_secret_path: client_secret_path.into(),
            token_path: token_path.into(),
        }
    }

    pub async fn load_client_secret(&self) -> Result<ClientSecret, UploadError> {
        if !self.client_secret_path.exists() {
            return Err(UploadError::Credential(format!(
                "{} missing: download the OAuth desktop credentials from Google Cloud Console",
                self.client_secret_path.display()
            )));
        }
        let content = fs::read_to_string(&self.client_secret_path)
            .await
            .map_err(|e| UploadError::Credential(format!("cannot read {}: {}", self.client_secret_path.display(), e)))?;
        ClientSecret::from_json(&content)
    }

    async fn load_token(&self) -> Option<StoredToken> {
        let content = fs::read_to_string(&self.token_path).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", self.token_path.display(), e);
                None
            }
        }
    }

    async fn save_token(&self, token: &StoredToken) -> Result<(), UploadError> {
        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.token_path, content)
            .await
            .map_err(|e| UploadError::Credential(format!("cannot write {}: {}", self.token_path.display(), e)))
    }

    /// Valid access token; `ask` receives the consent URL and returns what
    /// the user pasted back
    pub async fn access_token<F>(&self, ask: F) -> Result<String, UploadError>
    where
        F: FnOnce(&Url) -> Result<String, UploadError>,
    {
        let secret = self.load_client_secret().await?;
        if let Some(token) = self.cached_or_refreshed(&secret).await? {
            return Ok(token);
        }

        let url = secret.consent_url()?;
        let pasted = ask(&url)?;
        let code = extract_code(&pasted)
            .ok_or_else(|| UploadError::Credential("no authorization code provided".to_string()))?;
        let token = self.exchange_code(&secret, &code).await?;
        self.save_token(&token).await?;
        info!("Access token saved to {}", self.token_path.display());
        Ok(token.token)
    }

    /// Valid access token without user interaction, refreshed when the
    /// cached one is about to expire. Used between uploads of a batch.
    pub async fn current_token(&self) -> Result<String, UploadError> {
        let secret = self.load_client_secret().await?;
        self.cached_or_refreshed(&secret).await?.ok_or_else(|| {
            UploadError::Credential(format!(
                "{} holds no usable token, authorization required",
                self.token_path.display()
            ))
        })
    }

    async fn cached_or_refreshed(&self, secret: &ClientSecret) -> Result<Option<String>, UploadError> {
        let cached = self.load_token().await;
        if let Some(token) = &cached {
            if token.is_valid(Utc::now()) {
                debug!("Using cached token from {}", self.token_path.display());
                return Ok(Some(token.token.clone()));
            }
        }

        if let Some(refresh_token) = cached.and_then(|t| t.refresh_token) {
            match self.refresh(secret, &refresh_token).await {
                Ok(token) => {
                    self.save_token(&token).await?;
                    info!("Access token refreshed");
                    return Ok(Some(token.token));
                }
                Err(e) => warn!("Token refresh failed: {}", e),
            }
        }

        Ok(None)
    }

    async fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> Result<StoredToken, UploadError> {
        let response = self
            .request_token(
                secret,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", secret.client_id.as_str()),
                    ("client_secret", secret.client_secret.as_str()),
                ],
            )
            .await?;
        Ok(Self::stored(response, Some(refresh_token.to_string())))
    }

    async fn exchange_code(&self, secret: &ClientSecret, code: &str) -> Result<StoredToken, UploadError> {
        let response = self
            .request_token(
                secret,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", secret.client_id.as_str()),
                    ("client_secret", secret.client_secret.as_str()),
                    ("redirect_uri", secret.redirect_uri()),
                ],
            )
            .await?;
        Ok(Self::stored(response, None))
    }

    async fn request_token(&self, secret: &ClientSecret, form: &[(&str, &str)]) -> Result<TokenResponse, UploadError> {
        let response = self
            .client
            .post(&secret.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| UploadError::Credential(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UploadError::Credential(format!("token endpoint returned HTTP {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| UploadError::Credential(format!("malformed token response: {}", e)))
    }

    fn stored(response: TokenResponse, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expiry: response.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

/// Credential files live next to the working directory by default
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
