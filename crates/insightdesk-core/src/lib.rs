//! insightdesk core library
//!
//! This crate provides the domain models, error types, configuration and the
//! authoring workflow (composer) shared by the insightdesk API client and CLI.
//! Network access is expressed through the collaborator traits in [`gateway`];
//! nothing in this crate performs I/O on its own.

pub mod composer;
pub mod config;
pub mod error;
pub mod gateway;
pub mod markup;
pub mod media;
pub mod models;

// Re-export commonly used types
pub use composer::{
    Composer, ComposerDraft, ComposerError, ComposerMode, ComposerPhase, PendingFile,
    SubmitOutcome, TeamMemberForm, VideoSource,
};
pub use config::ClientConfig;
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use gateway::{ProgressFn, RecordRepository, TeamMemberRepository, UploadGateway};
pub use markup::{MarkupBuffer, Selection};
pub use media::{MediaPreview, MediaUrlResolver, PreviewKind};
