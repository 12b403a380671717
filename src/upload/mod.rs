//! # Upload Module
//!
//! Tutto ciò che riguarda il trasferimento di un singolo video:
//! - `request`: Corpo JSON di `videos.insert`
//! - `session`: Macchina a stati dell'upload resumable
//! - `youtube`: Trasporto HTTP sul protocollo resumable di YouTube

pub mod request;
pub mod session;
pub mod youtube;

pub use request::UploadRequestBody;
pub use session::{ChunkStatus, ChunkTransport, ProgressObserver, ResumableUploadSession, SessionState};
pub use youtube::YouTubeTransport;
