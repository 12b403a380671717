//! # Resumable Upload Session
//!
//! Macchina a stati che porta un upload a chunk fino a uno stato terminale.
//!
//! ## Stati:
//! ```text
//! Init ──run()──▶ Transferring ──chunk finale──▶ Done { video_id }
//!                      │
//!                      └──errore su un chunk──▶ Failed { error }
//! ```
//!
//! ## Regole:
//! - `Done` e `Failed` sono assorbenti: una sessione non riparte
//! - Nessun retry: il primo errore di trasporto è fatale per la sessione
//! - Il trasporto (file + sessione HTTP) viene rilasciato una sola volta,
//!   su qualunque transizione terminale
//! - Il progresso viene notificato solo se avanza di almeno `step`

use crate::error::UploadError;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Absorbs float noise when comparing progress deltas with the step
const PROGRESS_EPSILON: f64 = 1e-9;

/// Result of one chunk request
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkStatus {
    /// More chunks are needed; fraction of the file confirmed so far, if known
    Pending(Option<f64>),
    /// The platform created the video
    Complete { video_id: String },
}

/// Sends a file chunk by chunk. Dropping the transport releases its file
/// handle and HTTP session.
#[async_trait]
pub trait ChunkTransport: Send {
    async fn next_chunk(&mut self) -> Result<ChunkStatus, UploadError>;
}

/// Receives gated progress fractions
pub trait ProgressObserver {
    fn on_progress(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressObserver for F {
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Lets a fraction through only when it advanced by at least `step`
#[derive(Debug, Clone)]
pub struct ProgressGate {
    step: f64,
    last_shown: f64,
}

impl ProgressGate {
    pub fn new(step: f64) -> Self {
        Self { step, last_shown: 0.0 }
    }

    pub fn offer(&mut self, fraction: f64) -> Option<f64> {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction - self.last_shown >= self.step - PROGRESS_EPSILON {
            self.last_shown = fraction;
            Some(fraction)
        } else {
            None
        }
    }

    pub fn last_shown(&self) -> f64 {
        self.last_shown
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Transferring,
    Done { video_id: String },
    Failed { error: String },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done { .. } | SessionState::Failed { .. })
    }
}

/// Drives one transport from `Init` to a terminal state
pub struct ResumableUploadSession<T: ChunkTransport> {
    transport: Option<T>,
    state: SessionState,
    gate: ProgressGate,
    chunks_sent: usize,
    history: Vec<SessionState>,
}

impl<T: ChunkTransport> ResumableUploadSession<T> {
    pub fn new(transport: T, progress_step: f64) -> Self {
        Self {
            transport: Some(transport),
            state: SessionState::Init,
            gate: ProgressGate::new(progress_step),
            chunks_sent: 0,
            history: vec![SessionState::Init],
        }
    }

    fn transition(&mut self, next: SessionState) {
        self.history.push(next.clone());
        self.state = next;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Every state visited, oldest first
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// Successful chunk requests so far
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Run the transfer to completion, returning the remote video id
    pub async fn run<O: ProgressObserver>(&mut self, observer: &mut O) -> Result<String, UploadError> {
        if self.state != SessionState::Init {
            return Err(UploadError::Transfer(format!("session already started ({:?})", self.state)));
        }
        let mut transport = self
            .transport
            .take()
            .ok_or_else(|| UploadError::Transfer("transport already released".to_string()))?;

        self.transition(SessionState::Transferring);

        loop {
            match transport.next_chunk().await {
                Ok(ChunkStatus::Pending(progress)) => {
                    self.chunks_sent += 1;
                    if let Some(shown) = progress.and_then(|p| self.gate.offer(p)) {
                        observer.on_progress(shown);
                    }
                }
                Ok(ChunkStatus::Complete { video_id }) => {
                    self.chunks_sent += 1;
                    drop(transport);
                    debug!("Upload complete after {} chunks", self.chunks_sent);
                    self.transition(SessionState::Done { video_id: video_id.clone() });
                    return Ok(video_id);
                }
                Err(e) => {
                    drop(transport);
                    warn!("Upload failed after {} chunks: {}", self.chunks_sent, e);
                    self.transition(SessionState::Failed { error: e.to_string() });
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replays scripted chunk results and counts releases
    struct ScriptedTransport {
        script: VecDeque<Result<ChunkStatus, UploadError>>,
        calls: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<ChunkStatus, UploadError>>) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let releases = Arc::new(AtomicUsize::new(0));
            let transport = Self {
                script: script.into(),
                calls: calls.clone(),
                releases: releases.clone(),
            };
            (transport, calls, releases)
        }
    }

    #[async_trait]
    impl ChunkTransport for ScriptedTransport {
        async fn next_chunk(&mut self) -> Result<ChunkStatus, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(UploadError::Transfer("script exhausted".to_string())))
        }
    }

    impl Drop for ScriptedTransport {
        fn drop(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pending(p: f64) -> Result<ChunkStatus, UploadError> {
        Ok(ChunkStatus::Pending(Some(p)))
    }

    fn complete(id: &str) -> Result<ChunkStatus, UploadError> {
        Ok(ChunkStatus::Complete { video_id: id.to_string() })
    }

    #[tokio::test]
    async fn test_complete_on_first_chunk() {
        let (transport, calls, releases) = ScriptedTransport::new(vec![complete("abc123")]);
        let mut session = ResumableUploadSession::new(transport, 0.05);
        assert_eq!(session.state(), &SessionState::Init);

        let mut seen = Vec::new();
        let id = session.run(&mut |p: f64| seen.push(p)).await.unwrap();

        assert_eq!(id, "abc123");
        assert_eq!(
            session.history(),
            &[
                SessionState::Init,
                SessionState::Transferring,
                SessionState::Done { video_id: "abc123".to_string() },
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_first_chunk_releases_once() {
        let (transport, calls, releases) =
            ScriptedTransport::new(vec![Err(UploadError::Transfer("HTTP 403: quotaExceeded".to_string())), complete("never")]);
        let mut session = ResumableUploadSession::new(transport, 0.05);

        let err = session.run(&mut |_: f64| {}).await.unwrap_err();
        assert!(matches!(err, UploadError::Transfer(ref msg) if msg.contains("quotaExceeded")));
        assert!(matches!(session.state(), SessionState::Failed { error } if error.contains("quotaExceeded")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(session.history().len(), 3);
        assert!(session.state().is_terminal());

        drop(session);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_transfer_stops_calls() {
        let (transport, calls, releases) = ScriptedTransport::new(vec![
            pending(0.2),
            pending(0.4),
            Err(UploadError::Transfer("connection reset".to_string())),
            pending(0.6),
        ]);
        let mut session = ResumableUploadSession::new(transport, 0.05);

        assert!(session.run(&mut |_: f64| {}).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.chunks_sent(), 2);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_terminal_state_is_absorbing() {
        let (transport, calls, _) = ScriptedTransport::new(vec![complete("abc"), complete("def")]);
        let mut session = ResumableUploadSession::new(transport, 0.05);
        tokio_test::assert_ok!(tokio_test::block_on(session.run(&mut |_: f64| {})));

        tokio_test::assert_err!(tokio_test::block_on(session.run(&mut |_: f64| {})));
        assert_eq!(session.state(), &SessionState::Done { video_id: "abc".to_string() });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_progress_is_gated() {
        let (transport, _, _) = ScriptedTransport::new(vec![
            pending(0.02),
            pending(0.06),
            pending(0.08),
            Ok(ChunkStatus::Pending(None)),
            pending(0.11),
            pending(0.20),
            pending(0.21),
            complete("xyz"),
        ]);
        let mut session = ResumableUploadSession::new(transport, 0.05);

        let mut seen = Vec::new();
        session.run(&mut |p: f64| seen.push(p)).await.unwrap();

        assert_eq!(seen, vec![0.06, 0.11, 0.20]);
        for pair in seen.windows(2) {
            assert!(pair[1] >= pair[0]);
            assert!(pair[1] - pair[0] >= 0.05 - PROGRESS_EPSILON);
        }
    }

    #[test]
    fn test_gate_rejects_small_advance() {
        let mut gate = ProgressGate::new(0.05);
        assert_eq!(gate.offer(0.06), Some(0.06));
        assert_eq!(gate.offer(0.08), None);
        assert_eq!(gate.last_shown(), 0.06);
        assert_eq!(gate.offer(1.0), Some(1.0));
        assert_eq!(gate.offer(1.0), None);
    }
}
