//! Insight composer
//!
//! Owns the authoring form state and runs the submit sequence:
//! validate, upload each pending file in order, compose the record, then
//! create or update it. Failures leave every field as entered.
//!
//! ```text
//! Editing -> Validating -> Uploading(n) -> Persisting -> Succeeded
//!    ^            |              |              |
//!    +------------+--- Failed ---+--------------+
//! ```
//!
//! The composer is shared by reference (`&self`), so a second `submit` while
//! one is in flight is observed and ignored instead of being prevented by the
//! borrow checker.

mod draft;
mod team;
mod validation;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::AppError;
use crate::gateway::{RecordRepository, UploadGateway};
use crate::media::{MediaPreview, MediaUrlResolver};
use crate::models::{ArticleSection, Insight, RecordId, VideoSection};

pub use crate::models::PendingFile;
pub use draft::{ComposerDraft, ComposerMode, VideoSource};
pub use team::TeamMemberForm;
pub use validation::{parse_reading_time, MediaSlot, DEFAULT_READING_TIME};

use validation::{References, SubmissionPlan};

/// User-facing failures. Each carries the single message shown in the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposerError {
    /// Local pre-flight check failed; nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// The upload endpoint rejected or lost a file.
    #[error("{0}")]
    Upload(String),
    /// The record could not be saved.
    #[error("{0}")]
    Persist(String),
    #[error("{0}")]
    Unknown(String),
    #[error("This form is read-only")]
    ReadOnly,
    #[error("A submission is already in progress")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerPhase {
    Editing,
    Validating,
    /// `current` is the 1-based index of the file being sent.
    Uploading {
        current: usize,
        total: usize,
    },
    Persisting,
    Succeeded,
    /// Editable like `Editing`; keeps the last error for display.
    Failed {
        message: String,
    },
}

impl ComposerPhase {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ComposerPhase::Validating | ComposerPhase::Uploading { .. } | ComposerPhase::Persisting
        )
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, ComposerPhase::Editing | ComposerPhase::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Insight),
    Updated(Insight),
    /// Another submission was already running; nothing was done.
    Ignored,
}

/// Progress of the file currently being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub slot: MediaSlot,
    pub current: usize,
    pub total: usize,
    pub percent: u8,
}

type Callback = Box<dyn Fn() + Send + Sync>;
type ProgressObserver = Box<dyn Fn(UploadProgress) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Composer {
    gateway: Arc<dyn UploadGateway>,
    repository: Arc<dyn RecordRepository>,
    mode: ComposerMode,
    original: Option<Insight>,
    draft: Mutex<ComposerDraft>,
    phase: Mutex<ComposerPhase>,
    progress: AtomicU8,
    on_success: Option<Callback>,
    on_cancel: Option<Callback>,
    on_progress: Option<ProgressObserver>,
}

impl Composer {
    /// Empty draft for a new insight.
    pub fn new(gateway: Arc<dyn UploadGateway>, repository: Arc<dyn RecordRepository>) -> Self {
        Self {
            gateway,
            repository,
            mode: ComposerMode::Add,
            original: None,
            draft: Mutex::new(ComposerDraft::default()),
            phase: Mutex::new(ComposerPhase::Editing),
            progress: AtomicU8::new(0),
            on_success: None,
            on_cancel: None,
            on_progress: None,
        }
    }

    /// Draft pre-populated from `insight`, in edit or view mode.
    pub fn for_insight(
        gateway: Arc<dyn UploadGateway>,
        repository: Arc<dyn RecordRepository>,
        insight: Insight,
        mode: ComposerMode,
    ) -> Self {
        let mut composer = Self::new(gateway, repository);
        composer.draft = Mutex::new(ComposerDraft::from_insight(&insight));
        composer.original = Some(insight);
        composer.mode = mode;
        composer
    }

    /// Called after a successful save; the host refreshes its listing.
    pub fn on_success(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Called when the draft is discarded through [`Composer::cancel`].
    pub fn on_cancel(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cancel = Some(Box::new(callback));
        self
    }

    pub fn on_progress(mut self, observer: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(observer));
        self
    }

    pub fn mode(&self) -> ComposerMode {
        self.mode
    }

    pub fn original(&self) -> Option<&Insight> {
        self.original.as_ref()
    }

    pub fn phase(&self) -> ComposerPhase {
        lock(&self.phase).clone()
    }

    /// Percentage of the file currently uploading; 0 outside uploads.
    pub fn upload_progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn error_message(&self) -> Option<String> {
        match &*lock(&self.phase) {
            ComposerPhase::Failed { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Snapshot of the current field values.
    pub fn draft(&self) -> ComposerDraft {
        lock(&self.draft).clone()
    }

    /// Mutate the draft. Refused in view mode, after success and while a
    /// submission is running.
    pub fn edit<T>(&self, f: impl FnOnce(&mut ComposerDraft) -> T) -> Result<T, ComposerError> {
        if self.mode == ComposerMode::View {
            return Err(ComposerError::ReadOnly);
        }
        let phase = lock(&self.phase);
        if phase.is_busy() {
            return Err(ComposerError::Busy);
        }
        if !phase.is_editable() {
            return Err(ComposerError::ReadOnly);
        }
        // Holding the phase lock keeps a concurrent submit from snapshotting mid-edit.
        let mut draft = lock(&self.draft);
        Ok(f(&mut draft))
    }

    pub fn video_preview(&self, resolver: &MediaUrlResolver) -> Option<MediaPreview> {
        lock(&self.draft).video_preview(self.original.as_ref(), resolver)
    }

    pub fn video_thumbnail_preview(&self, resolver: &MediaUrlResolver) -> Option<MediaPreview> {
        lock(&self.draft).video_thumbnail_preview(self.original.as_ref(), resolver)
    }

    pub fn article_thumbnail_preview(&self, resolver: &MediaUrlResolver) -> Option<MediaPreview> {
        lock(&self.draft).article_thumbnail_preview(self.original.as_ref(), resolver)
    }

    /// Discard the draft without persisting anything. Not possible once a
    /// submission has started.
    pub fn cancel(&self) -> Result<(), ComposerError> {
        let mut phase = lock(&self.phase);
        if phase.is_busy() {
            return Err(ComposerError::Busy);
        }
        *lock(&self.draft) = match &self.original {
            Some(insight) => ComposerDraft::from_insight(insight),
            None => ComposerDraft::default(),
        };
        *phase = ComposerPhase::Editing;
        drop(phase);

        if let Some(callback) = &self.on_cancel {
            callback();
        }
        Ok(())
    }

    fn set_phase(&self, next: ComposerPhase) {
        *lock(&self.phase) = next;
    }

    fn is_update(&self) -> bool {
        self.original.as_ref().and_then(|i| i.id.as_ref()).is_some()
    }

    fn fallback_message(&self) -> &'static str {
        if self.is_update() {
            "Failed to update insight"
        } else {
            "Failed to create insight"
        }
    }

    /// Run the submit sequence once. Returns `Ignored` when a submission is
    /// already in flight.
    pub async fn submit(&self) -> Result<SubmitOutcome, ComposerError> {
        if self.mode == ComposerMode::View {
            return Err(ComposerError::ReadOnly);
        }

        let draft = {
            let mut phase = lock(&self.phase);
            if !phase.is_editable() {
                tracing::debug!(phase = ?*phase, "Ignoring submit; composer is not editable");
                return Ok(SubmitOutcome::Ignored);
            }
            *phase = ComposerPhase::Validating;
            lock(&self.draft).clone()
        };
        self.progress.store(0, Ordering::SeqCst);

        let result = self.run(&draft).await;
        self.progress.store(0, Ordering::SeqCst);

        match result {
            Ok(outcome) => {
                self.set_phase(ComposerPhase::Succeeded);
                if let Some(callback) = &self.on_success {
                    callback();
                }
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Insight submission failed");
                self.set_phase(ComposerPhase::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run(&self, draft: &ComposerDraft) -> Result<SubmitOutcome, ComposerError> {
        let plan = validation::validate(draft, self.original.as_ref())?;
        let SubmissionPlan {
            uploads,
            mut references,
            reading_time,
        } = plan;

        let total = uploads.len();
        for (index, (slot, file)) in uploads.iter().enumerate() {
            let current = index + 1;
            self.set_phase(ComposerPhase::Uploading { current, total });
            self.progress.store(0, Ordering::SeqCst);

            let observe = |percent: u8| {
                self.progress.store(percent.min(100), Ordering::SeqCst);
                if let Some(observer) = &self.on_progress {
                    observer(UploadProgress {
                        slot: *slot,
                        current,
                        total,
                        percent,
                    });
                }
            };
            let report: &(dyn Fn(u8) + Send + Sync) = &observe;

            tracing::info!(
                slot = slot.label(),
                file = %file.file_name,
                size_bytes = file.size(),
                current,
                total,
                "Uploading file"
            );

            let receipt = self
                .gateway
                .upload_file(file, Some(report))
                .await
                .map_err(|e| self.upload_error(e))?;

            if receipt.is_duplicate {
                tracing::info!(
                    file = %file.file_name,
                    reference = %receipt.reference,
                    "File already uploaded; reusing stored reference"
                );
            }
            references.set(*slot, receipt.reference);
        }

        let record = compose_record(draft, &references, reading_time);

        self.set_phase(ComposerPhase::Persisting);
        match self.original.as_ref().and_then(|i| i.id.clone()) {
            Some(id) => {
                let saved = self.persist_update(&id, &record).await?;
                tracing::info!(id = %id, "Insight updated");
                Ok(SubmitOutcome::Updated(saved))
            }
            None => {
                let saved = self
                    .repository
                    .create_insight(&record)
                    .await
                    .map_err(|e| self.persist_error(e))?;
                tracing::info!(id = ?saved.id, "Insight created");
                Ok(SubmitOutcome::Created(saved))
            }
        }
    }

    async fn persist_update(&self, id: &RecordId, record: &Insight) -> Result<Insight, ComposerError> {
        self.repository
            .update_insight(id, record)
            .await
            .map_err(|e| self.persist_error(e))
    }

    fn upload_error(&self, err: AppError) -> ComposerError {
        match classify(err, "Failed to upload file") {
            Classified::Known(msg) => ComposerError::Upload(msg),
            Classified::Unknown => ComposerError::Unknown(self.fallback_message().to_string()),
        }
    }

    fn persist_error(&self, err: AppError) -> ComposerError {
        match classify(err, self.fallback_message()) {
            Classified::Known(msg) => ComposerError::Persist(msg),
            Classified::Unknown => ComposerError::Unknown(self.fallback_message().to_string()),
        }
    }
}

enum Classified {
    Known(String),
    Unknown,
}

/// Prefer the collaborator's message; internal failures get the generic one.
fn classify(err: AppError, fallback: &str) -> Classified {
    use crate::error::ErrorMetadata;

    match err {
        AppError::Internal(_) => Classified::Unknown,
        other => {
            let message = other.client_message();
            if message.trim().is_empty() {
                Classified::Known(fallback.to_string())
            } else {
                Classified::Known(message)
            }
        }
    }
}

/// Build the record; a section is present only when its title is.
fn compose_record(draft: &ComposerDraft, references: &References, reading_time: u32) -> Insight {
    let video = draft.has_video().then(|| VideoSection {
        title: draft.video_title.trim().to_string(),
        thumbnail: references.video_thumbnail.clone(),
        url: references.video_url.clone(),
        is_external: draft.is_external(),
    });

    let article = draft.has_article().then(|| ArticleSection {
        title: draft.article_title.trim().to_string(),
        description: draft.article_description.clone(),
        thumbnail: references.article_thumbnail.clone(),
        content: draft.article_content.content().to_string(),
        time: reading_time,
    });

    Insight {
        id: None,
        category: draft.category,
        video,
        article,
        created_at: None,
    }
}
