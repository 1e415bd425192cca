//! Project membership roster and roles.

use super::{ParseMemberRoleError, ProjectId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Role a user holds within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Full control over project configuration and both work queues.
    Admin,
    /// May claim and annotate tasks.
    Annotator,
    /// May claim and finalize reviews.
    Reviewer,
}

impl MemberRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Annotator => "annotator",
            Self::Reviewer => "reviewer",
        }
    }

    /// Returns whether the role grants access to the annotation queue.
    #[must_use]
    pub const fn can_annotate(self) -> bool {
        matches!(self, Self::Admin | Self::Annotator)
    }

    /// Returns whether the role grants access to the review queue.
    #[must_use]
    pub const fn can_review(self) -> bool {
        matches!(self, Self::Admin | Self::Reviewer)
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = ParseMemberRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "admin" => Ok(Self::Admin),
            "annotator" => Ok(Self::Annotator),
            "reviewer" => Ok(Self::Reviewer),
            _ => Err(ParseMemberRoleError(value.to_owned())),
        }
    }
}

/// One user's membership in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    /// Project the membership belongs to.
    pub project_id: ProjectId,
    /// Member user.
    pub user_id: UserId,
    /// Granted role.
    pub role: MemberRole,
    /// Whether the membership is currently active; inactive members cannot
    /// claim work.
    pub active: bool,
    /// Timestamp the membership was granted.
    pub created_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Creates an active membership.
    #[must_use]
    pub fn new(project_id: ProjectId, user_id: UserId, role: MemberRole, clock: &impl Clock) -> Self {
        Self {
            project_id,
            user_id,
            role,
            active: true,
            created_at: clock.utc(),
        }
    }

    /// Marks the membership inactive.
    pub const fn deactivate(&mut self) {
        self.active = false;
    }
}
