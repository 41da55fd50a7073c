//! Collaborator traits
//!
//! The composer and the CLI talk to the backend only through these traits.
//! `insightdesk-api-client` provides the HTTP implementation; tests provide
//! in-memory fakes.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Insight, Page, PendingFile, RecordId, TeamMember, UploadReceipt};

/// Upload progress callback, called with whole percentages in `0..=100`.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Remote upload endpoint.
///
/// Implementations must reject payloads over their size ceiling with
/// `AppError::PayloadTooLarge` and report other transport failures as
/// `AppError::Transfer`. Progress, when requested, never decreases.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    async fn upload_file(
        &self,
        file: &PendingFile,
        on_progress: Option<ProgressFn<'_>>,
    ) -> AppResult<UploadReceipt>;
}

/// Persistence for insights.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn create_insight(&self, insight: &Insight) -> AppResult<Insight>;

    async fn update_insight(&self, id: &RecordId, insight: &Insight) -> AppResult<Insight>;

    async fn delete_insight(&self, id: &RecordId) -> AppResult<()>;

    /// `page` is 1-based.
    async fn list_insights(&self, page: u32, page_size: u32) -> AppResult<Page<Insight>>;
}

/// Persistence for team members.
#[async_trait]
pub trait TeamMemberRepository: Send + Sync {
    async fn list_team_members(&self) -> AppResult<Vec<TeamMember>>;

    async fn create_team_member(&self, member: &TeamMember) -> AppResult<TeamMember>;

    async fn update_team_member(&self, id: i64, member: &TeamMember) -> AppResult<TeamMember>;

    async fn delete_team_member(&self, id: i64) -> AppResult<()>;
}
