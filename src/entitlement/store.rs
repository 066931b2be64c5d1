//! Usage Ledger Store
//!
//! Durable, per-identity usage records with atomic check-and-increment
//! semantics. The store owns daily-bucket rollover, and every conditional
//! update runs as one critical section: two concurrent requests for the
//! same identity can never both take the last admission slot, and no
//! admitted increment is lost.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::identity::Identity;
use super::plan::{CapRule, Limit, Period, Plan, ResourceKind};
use super::project_lock::ProjectFingerprint;

/// Source of "today" for daily buckets. Injected so callers (and tests)
/// control date rollover.
pub trait Clock: Send + Sync {
    /// Current UTC calendar date
    fn today(&self) -> NaiveDate;
}

/// Wall-clock UTC dates
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Consumption state for one (identity, resource) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Units consumed in the current period
    pub used: u32,

    /// Day the counter belongs to; only meaningful for daily rules
    pub period_anchor: Option<NaiveDate>,
}

impl Counter {
    /// Usage effective for `today`. A stale daily anchor counts as zero:
    /// rollover happens before any cap check runs.
    pub fn effective_used(&self, period: Period, today: NaiveDate) -> u32 {
        match period {
            Period::Total => self.used,
            Period::Daily if self.period_anchor == Some(today) => self.used,
            Period::Daily => 0,
        }
    }
}

/// The durable row per identity: plan, per-resource counters, and the
/// optional project binding. Created lazily on first consumption attempt
/// and never deleted; it is the permanent ledger for that identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Identity key this row belongs to
    pub identity_key: String,

    /// Plan currently associated with the identity
    pub plan: Plan,

    /// Per-resource counters
    pub counters: HashMap<ResourceKind, Counter>,

    /// Project binding for capacity plans
    pub project_fingerprint: Option<ProjectFingerprint>,

    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl UsageRecord {
    fn new(identity_key: String) -> Self {
        Self {
            identity_key,
            plan: Plan::Free,
            counters: HashMap::new(),
            project_fingerprint: None,
            updated_at: Utc::now(),
        }
    }

    /// Counter for a resource; zeroed when never consumed
    pub fn counter(&self, resource: ResourceKind) -> Counter {
        self.counters.get(&resource).copied().unwrap_or_default()
    }
}

/// Outcome of an atomic consume attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// One unit was reserved; `remaining` is None for unbounded rules
    Admitted {
        /// Units left under the cap after this admission
        remaining: Option<u32>,
    },
    /// The cap is exhausted; no state was mutated
    Rejected,
}

/// Outcome of a project lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The fingerprint was unset and is now bound
    Acquired,
    /// The stored fingerprint matches
    Held,
    /// The stored fingerprint differs
    Conflict,
}

/// Store backend faults. These are system errors, never policy outcomes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or refusing writes
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// Persisted row does not match the expected shape
    #[error("usage record for {0} is corrupt: {1}")]
    Corrupt(String, String),
}

/// Durable store seam for usage records.
///
/// Every operation must be atomic with respect to concurrent callers for
/// the same identity. In particular `consume` may not be implemented as a
/// read followed by a separate write unless the backend wraps the pair in
/// serializable isolation.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Plan associated with the identity; `Free` when no record exists yet
    async fn plan_of(&self, identity: &Identity) -> Result<Plan, StoreError>;

    /// Atomically roll the daily bucket if stale, check the cap, and
    /// reserve one unit. Unbounded rules always admit and still count.
    async fn consume(
        &self,
        identity: &Identity,
        resource: ResourceKind,
        rule: CapRule,
        today: NaiveDate,
    ) -> Result<ConsumeOutcome, StoreError>;

    /// Atomically bind the project fingerprint on first use, or compare
    /// the candidate against the stored one.
    async fn check_or_lock_project(
        &self,
        identity: &Identity,
        fingerprint: ProjectFingerprint,
    ) -> Result<LockOutcome, StoreError>;

    /// External plan-upgrade write. Relaxes caps going forward; recorded
    /// usage is kept.
    async fn set_plan(&self, identity: &Identity, plan: Plan) -> Result<(), StoreError>;

    /// Administrative unlock. Returns whether a binding was cleared.
    async fn reset_project_lock(&self, identity: &Identity) -> Result<bool, StoreError>;

    /// Read-only copy of the ledger row, if one exists
    async fn snapshot(&self, identity: &Identity) -> Result<Option<UsageRecord>, StoreError>;
}

/// In-memory quota store.
///
/// The write lock spans each whole conditional update, which makes every
/// operation the in-process equivalent of a single conditional
/// `UPDATE .. SET used = used + 1 WHERE used < cap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuotaStore {
    records: Arc<RwLock<HashMap<String, UsageRecord>>>,
}

impl MemoryQuotaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledger rows
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn plan_of(&self, identity: &Identity) -> Result<Plan, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&identity.key())
            .map(|record| record.plan)
            .unwrap_or(Plan::Free))
    }

    async fn consume(
        &self,
        identity: &Identity,
        resource: ResourceKind,
        rule: CapRule,
        today: NaiveDate,
    ) -> Result<ConsumeOutcome, StoreError> {
        let key = identity.key();
        let mut records = self.records.write().await;
        let record = records
            .entry(key.clone())
            .or_insert_with(|| UsageRecord::new(key));

        let counter = record.counter(resource);
        let effective = counter.effective_used(rule.period, today);

        if let Limit::Bounded(cap) = rule.limit {
            if effective >= cap {
                return Ok(ConsumeOutcome::Rejected);
            }
        }

        let next = effective + 1;
        record.counters.insert(
            resource,
            Counter {
                used: next,
                period_anchor: match rule.period {
                    Period::Daily => Some(today),
                    Period::Total => counter.period_anchor,
                },
            },
        );
        record.updated_at = Utc::now();

        let remaining = match rule.limit {
            Limit::Bounded(cap) => Some(cap - next),
            Limit::Unbounded => None,
        };
        Ok(ConsumeOutcome::Admitted { remaining })
    }

    async fn check_or_lock_project(
        &self,
        identity: &Identity,
        fingerprint: ProjectFingerprint,
    ) -> Result<LockOutcome, StoreError> {
        let key = identity.key();
        let mut records = self.records.write().await;
        let record = records
            .entry(key.clone())
            .or_insert_with(|| UsageRecord::new(key));

        match &record.project_fingerprint {
            None => {
                record.project_fingerprint = Some(fingerprint);
                record.updated_at = Utc::now();
                Ok(LockOutcome::Acquired)
            }
            Some(stored) if *stored == fingerprint => Ok(LockOutcome::Held),
            Some(_) => Ok(LockOutcome::Conflict),
        }
    }

    async fn set_plan(&self, identity: &Identity, plan: Plan) -> Result<(), StoreError> {
        let key = identity.key();
        let mut records = self.records.write().await;
        let record = records
            .entry(key.clone())
            .or_insert_with(|| UsageRecord::new(key));

        record.plan = plan;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn reset_project_lock(&self, identity: &Identity) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&identity.key()) {
            if record.project_fingerprint.take().is_some() {
                record.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn snapshot(&self, identity: &Identity) -> Result<Option<UsageRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(&identity.key()).cloned())
    }
}
