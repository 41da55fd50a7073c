use crate::gateway::{TeamMemberRepository, UploadGateway};
use crate::models::{PendingFile, TeamMember};

use super::{classify, Classified, ComposerError};

/// Form for adding or editing a team member. The portrait is optional; on
/// edit the stored one is kept unless a new file is chosen.
#[derive(Debug, Clone, Default)]
pub struct TeamMemberForm {
    original: Option<TeamMember>,
    pub name: String,
    pub position: String,
    pub bio: String,
    pub image_file: Option<PendingFile>,
}

impl TeamMemberForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_member(member: TeamMember) -> Self {
        Self {
            name: member.name.clone(),
            position: member.position.clone(),
            bio: member.bio.clone().unwrap_or_default(),
            image_file: None,
            original: Some(member),
        }
    }

    fn is_update(&self) -> bool {
        self.original.as_ref().and_then(|m| m.id).is_some()
    }

    fn fallback_message(&self) -> &'static str {
        if self.is_update() {
            "Failed to update team member"
        } else {
            "Failed to create team member"
        }
    }

    pub fn validate(&self) -> Result<(), ComposerError> {
        if self.name.trim().is_empty() {
            return Err(ComposerError::Validation("Name is required".to_string()));
        }
        if self.position.trim().is_empty() {
            return Err(ComposerError::Validation("Position is required".to_string()));
        }
        Ok(())
    }

    /// Upload the portrait (if one was chosen), then create or update.
    pub async fn submit(
        &self,
        gateway: &dyn UploadGateway,
        repository: &dyn TeamMemberRepository,
    ) -> Result<TeamMember, ComposerError> {
        self.validate()?;

        let mut image_path = self
            .original
            .as_ref()
            .map(|m| m.image_path.clone())
            .unwrap_or_default();

        if let Some(file) = &self.image_file {
            let receipt = gateway
                .upload_file(file, None)
                .await
                .map_err(|e| match classify(e, "Failed to upload image") {
                    Classified::Known(msg) => ComposerError::Upload(msg),
                    Classified::Unknown => {
                        ComposerError::Unknown(self.fallback_message().to_string())
                    }
                })?;
            image_path = receipt.reference;
        }

        let bio = self.bio.trim();
        let member = TeamMember {
            id: None,
            name: self.name.trim().to_string(),
            position: self.position.trim().to_string(),
            image_path,
            bio: (!bio.is_empty()).then(|| bio.to_string()),
        };

        let persist_error = |e| match classify(e, self.fallback_message()) {
            Classified::Known(msg) => ComposerError::Persist(msg),
            Classified::Unknown => ComposerError::Unknown(self.fallback_message().to_string()),
        };

        let saved = match self.original.as_ref().and_then(|m| m.id) {
            Some(id) => repository
                .update_team_member(id, &member)
                .await
                .map_err(persist_error)?,
            None => repository
                .create_team_member(&member)
                .await
                .map_err(persist_error)?,
        };

        tracing::info!(id = ?saved.id, name = %saved.name, "Team member saved");
        Ok(saved)
    }
}
