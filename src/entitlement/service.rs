//! Entitlement Service
//!
//! The single consume-decision API used by every generation endpoint. The
//! service resolves the caller's plan, applies the cap policy, checks the
//! project lock before any capacity is spent, and asks the store for an
//! atomic check-and-increment. Policy denials come back as values; only
//! store faults are errors, so callers can tell "you're capped" apart
//! from "something broke".

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::config::EntitlementConfig;
use super::dashboard::{self, UsageOverview};
use super::identity::Identity;
use super::plan::{Period, Plan, PlanPolicy, ResourceKind};
use super::project_lock::{LockCheck, ProjectContext, ProjectLockManager};
use super::store::{Clock, ConsumeOutcome, QuotaStore, StoreError, SystemClock};

/// Why a consumption was denied. Expected business outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// The total cap for this resource is exhausted
    #[serde(rename = "limit_reached")]
    LimitReached,

    /// Today's cap is exhausted; try again after UTC midnight
    #[serde(rename = "limit_reached_today")]
    DailyLimitReached,

    /// The capacity plan is bound to a different project
    #[serde(rename = "project_locked")]
    ProjectLocked,

    /// The resource demands a real account and the caller is a guest
    #[serde(rename = "not_authenticated")]
    IdentityUnresolved,
}

impl DenyReason {
    /// Name used in API payloads
    pub fn wire_name(&self) -> &'static str {
        match self {
            DenyReason::LimitReached => "limit_reached",
            DenyReason::DailyLimitReached => "limit_reached_today",
            DenyReason::ProjectLocked => "project_locked",
            DenyReason::IdentityUnresolved => "not_authenticated",
        }
    }
}

/// The result of a consume call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    /// The operation may proceed; one unit has been reserved
    Allowed {
        /// Units left under the cap; None when unbounded
        remaining: Option<u32>,
    },
    /// The operation must not proceed; nothing was consumed
    Denied {
        /// Why the caller was turned away
        reason: DenyReason,
    },
}

impl Decision {
    /// Whether the caller may perform the operation
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Faults from the entitlement engine. Distinct from any [`Decision`]:
/// an error aborts the caller's generation attempt entirely.
#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    /// Only paid plans can be activated
    #[error("plan '{0}' cannot be activated")]
    InvalidPlan(&'static str),

    /// Plan activation demands a real account
    #[error("not authenticated")]
    NotAuthenticated,

    /// The durable store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates policy, project locking, and the quota store into one
/// consume decision. The store handle is injected at construction; there
/// is no process-wide singleton.
#[derive(Clone)]
pub struct EntitlementService {
    policy: PlanPolicy,
    store: Arc<dyn QuotaStore>,
    locks: ProjectLockManager,
    clock: Arc<dyn Clock>,
}

impl EntitlementService {
    /// Service over the given store, using wall-clock UTC dates
    pub fn new(config: EntitlementConfig, store: Arc<dyn QuotaStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Service with an injected clock (tests drive date rollover with this)
    pub fn with_clock(
        config: EntitlementConfig,
        store: Arc<dyn QuotaStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let locks = ProjectLockManager::new(store.clone(), config.fingerprint_max_len);
        Self {
            policy: PlanPolicy::new(config),
            store,
            locks,
            clock,
        }
    }

    /// Decide whether one unit of `resource` may be consumed by `identity`,
    /// and durably record the consumption if so.
    ///
    /// The decision is final and synchronous: an `Allowed` unit is spent on
    /// the attempt, whether or not the downstream generation succeeds.
    pub async fn consume(
        &self,
        identity: &Identity,
        resource: ResourceKind,
        project: Option<&ProjectContext>,
    ) -> Result<Decision, EntitlementError> {
        if !self.policy.config().enabled {
            return Ok(Decision::Allowed { remaining: None });
        }

        if self.policy.requires_account(resource) && identity.is_guest() {
            tracing::debug!(
                "Denying {} for unresolved identity {}",
                resource.wire_name(),
                identity.key()
            );
            return Ok(Decision::Denied {
                reason: DenyReason::IdentityUnresolved,
            });
        }

        let plan = self.store.plan_of(identity).await?;
        let rule = self.policy.cap_for(plan, resource);

        // Lock check runs before any capacity is spent.
        if self.policy.requires_project_lock(plan) {
            if let Some(project) = project {
                if self.locks.check_or_lock(identity, project).await? == LockCheck::Conflict {
                    return Ok(Decision::Denied {
                        reason: DenyReason::ProjectLocked,
                    });
                }
            }
        }

        match self
            .store
            .consume(identity, resource, rule, self.clock.today())
            .await?
        {
            ConsumeOutcome::Admitted { remaining } => Ok(Decision::Allowed { remaining }),
            ConsumeOutcome::Rejected => {
                let reason = match rule.period {
                    Period::Daily => DenyReason::DailyLimitReached,
                    Period::Total => DenyReason::LimitReached,
                };
                tracing::debug!(
                    "Denying {} for {}: {}",
                    resource.wire_name(),
                    identity.key(),
                    reason.wire_name()
                );
                Ok(Decision::Denied { reason })
            }
        }
    }

    /// Record a completed payment capture: associate a paid plan with the
    /// identity. Caps are relaxed going forward; prior usage is kept.
    /// Guests cannot hold a paid plan; purchase flows sign the buyer in
    /// before capturing payment.
    pub async fn activate_plan(
        &self,
        identity: &Identity,
        plan: Plan,
    ) -> Result<(), EntitlementError> {
        if !plan.is_paid() {
            return Err(EntitlementError::InvalidPlan(plan.wire_name()));
        }
        if identity.is_guest() {
            return Err(EntitlementError::NotAuthenticated);
        }

        self.store.set_plan(identity, plan).await?;
        tracing::info!(
            "Activated plan '{}' for {}",
            plan.wire_name(),
            identity.key()
        );
        Ok(())
    }

    /// Administrative reset of a capacity plan's project binding.
    /// Returns whether a binding was cleared.
    pub async fn reset_project_lock(
        &self,
        identity: &Identity,
    ) -> Result<bool, EntitlementError> {
        let cleared = self.store.reset_project_lock(identity).await?;
        if cleared {
            tracing::info!("Cleared project lock for {}", identity.key());
        }
        Ok(cleared)
    }

    /// Usage overview for account display
    pub async fn overview(&self, identity: &Identity) -> Result<UsageOverview, EntitlementError> {
        let record = self.store.snapshot(identity).await?;
        Ok(dashboard::build_overview(
            identity,
            record.as_ref(),
            &self.policy,
            self.clock.today(),
        ))
    }
}
