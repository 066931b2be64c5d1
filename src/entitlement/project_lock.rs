//! Project Lock
//!
//! A capacity plan is sold as enough generations for one book project. The
//! lock binds the plan to the first project it is used on: a fingerprint
//! of the normalized project attributes is stored on first use, and every
//! later capacity consumption must present the same fingerprint. Casing,
//! whitespace, and punctuation differences do not count as a different
//! project.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use super::identity::Identity;
use super::store::{LockOutcome, QuotaStore, StoreError};

/// Identifying attributes of a book project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// What the book is about
    pub topic: String,

    /// Who the book is for
    pub audience: String,

    /// The reader's main blocker
    pub blocker: String,
}

impl ProjectContext {
    /// Build a context from its three attributes
    pub fn new(
        topic: impl Into<String>,
        audience: impl Into<String>,
        blocker: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            audience: audience.into(),
            blocker: blocker.into(),
        }
    }

    /// Deterministic fingerprint of the normalized attributes
    pub fn fingerprint(&self, max_field_len: usize) -> ProjectFingerprint {
        let base = format!(
            "topic:{}|aud:{}|blocker:{}",
            normalize(&self.topic, max_field_len),
            normalize(&self.audience, max_field_len),
            normalize(&self.blocker, max_field_len),
        );

        let mut hasher = Sha256::new();
        hasher.update(base.as_bytes());
        ProjectFingerprint(hex::encode(hasher.finalize()))
    }
}

/// Hex SHA-256 of a normalized project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectFingerprint(String);

impl ProjectFingerprint {
    /// The hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize one project attribute: lowercase, strip punctuation, collapse
/// whitespace runs to single spaces, trim, truncate to `max_len` chars.
pub(crate) fn normalize(value: &str, max_len: usize) -> String {
    let lowered = value.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_len).collect();
    // Truncation can cut at a word boundary and leave a dangling space.
    truncated.trim_end().to_string()
}

/// Result of a lock check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheck {
    /// Unset-and-now-bound, or already bound to this same project
    Ok,
    /// Bound to a different project; the consumption must be rejected
    Conflict,
}

/// Enforces that a capacity plan stays bound to exactly one project
#[derive(Clone)]
pub struct ProjectLockManager {
    store: Arc<dyn QuotaStore>,
    max_field_len: usize,
}

impl ProjectLockManager {
    /// Manager writing through the given store
    pub fn new(store: Arc<dyn QuotaStore>, max_field_len: usize) -> Self {
        Self {
            store,
            max_field_len,
        }
    }

    /// Validate or establish the project binding for a caller.
    ///
    /// First use atomically stores the fingerprint (lock-on-first-use);
    /// a matching fingerprint passes; a different one is a conflict
    /// regardless of remaining capacity.
    pub async fn check_or_lock(
        &self,
        identity: &Identity,
        project: &ProjectContext,
    ) -> Result<LockCheck, StoreError> {
        let fingerprint = project.fingerprint(self.max_field_len);

        match self
            .store
            .check_or_lock_project(identity, fingerprint)
            .await?
        {
            LockOutcome::Acquired => {
                tracing::info!("Project lock established for {}", identity.key());
                Ok(LockCheck::Ok)
            }
            LockOutcome::Held => Ok(LockCheck::Ok),
            LockOutcome::Conflict => {
                tracing::debug!(
                    "Capacity plan for {} is bound to a different project",
                    identity.key()
                );
                Ok(LockCheck::Conflict)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::MemoryQuotaStore;
    use super::*;

    const MAX_LEN: usize = 500;

    #[test]
    fn test_normalize_lowercases_and_collapses() {
        assert_eq!(normalize("  Beat   PROCRASTINATION  ", MAX_LEN), "beat procrastination");
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("time-management, fast!", MAX_LEN), "timemanagement fast");
    }

    #[test]
    fn test_normalize_truncates() {
        let long = "a".repeat(600);
        assert_eq!(normalize(&long, MAX_LEN).len(), MAX_LEN);
    }

    #[test]
    fn test_fingerprint_ignores_case_and_whitespace() {
        let a = ProjectContext::new("Leadership", "managers", "time");
        let b = ProjectContext::new("  LEADERSHIP ", "Managers", "time");
        assert_eq!(a.fingerprint(MAX_LEN), b.fingerprint(MAX_LEN));
    }

    #[test]
    fn test_fingerprint_distinguishes_projects() {
        let a = ProjectContext::new("Leadership", "managers", "time");
        let b = ProjectContext::new("Cooking", "managers", "time");
        assert_ne!(a.fingerprint(MAX_LEN), b.fingerprint(MAX_LEN));
    }

    #[test]
    fn test_fingerprint_fields_do_not_bleed() {
        // The same words distributed differently across fields are
        // different projects.
        let a = ProjectContext::new("leadership managers", "", "time");
        let b = ProjectContext::new("leadership", "managers", "time");
        assert_ne!(a.fingerprint(MAX_LEN), b.fingerprint(MAX_LEN));
    }

    #[tokio::test]
    async fn test_lock_on_first_use_then_held() {
        let store = Arc::new(MemoryQuotaStore::new());
        let manager = ProjectLockManager::new(store, MAX_LEN);
        let identity = Identity::Authenticated {
            user_id: "user-1".to_string(),
        };
        let project = ProjectContext::new("Leadership", "managers", "time");

        assert_eq!(
            manager.check_or_lock(&identity, &project).await.unwrap(),
            LockCheck::Ok
        );
        assert_eq!(
            manager.check_or_lock(&identity, &project).await.unwrap(),
            LockCheck::Ok
        );
    }

    #[tokio::test]
    async fn test_different_project_conflicts() {
        let store = Arc::new(MemoryQuotaStore::new());
        let manager = ProjectLockManager::new(store, MAX_LEN);
        let identity = Identity::Authenticated {
            user_id: "user-1".to_string(),
        };

        let first = ProjectContext::new("Leadership", "managers", "time");
        let other = ProjectContext::new("Cooking", "home cooks", "confidence");

        assert_eq!(
            manager.check_or_lock(&identity, &first).await.unwrap(),
            LockCheck::Ok
        );
        assert_eq!(
            manager.check_or_lock(&identity, &other).await.unwrap(),
            LockCheck::Conflict
        );
    }

    #[tokio::test]
    async fn test_variant_spelling_is_same_project() {
        let store = Arc::new(MemoryQuotaStore::new());
        let manager = ProjectLockManager::new(store, MAX_LEN);
        let identity = Identity::Authenticated {
            user_id: "user-1".to_string(),
        };

        let first = ProjectContext::new("Leadership", "managers", "time");
        let variant = ProjectContext::new("  LEADERSHIP ", "Managers", "time");

        assert_eq!(
            manager.check_or_lock(&identity, &first).await.unwrap(),
            LockCheck::Ok
        );
        assert_eq!(
            manager.check_or_lock(&identity, &variant).await.unwrap(),
            LockCheck::Ok
        );
    }
}
