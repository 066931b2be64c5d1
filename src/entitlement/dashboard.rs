//! Account Usage Overview
//!
//! Read-only usage data for the account page and admin monitoring: how
//! much of each resource an identity has consumed, against which cap.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;
use super::plan::{Limit, Period, Plan, PlanPolicy, ResourceKind};
use super::store::UsageRecord;

/// Usage of a single resource against its current cap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// The metered resource
    pub resource: ResourceKind,

    /// Units used in the current period
    pub used: u32,

    /// Cap under the current plan; None when unbounded
    pub cap: Option<u32>,

    /// Accounting window of the cap
    pub period: Period,

    /// Units left; None when unbounded
    pub remaining: Option<u32>,
}

/// Per-identity usage summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageOverview {
    /// Identity the overview belongs to
    pub identity_key: String,

    /// Current plan
    pub plan: Plan,

    /// Whether a capacity plan is bound to a project
    pub project_locked: bool,

    /// Usage per resource, in display order
    pub resources: Vec<ResourceUsage>,

    /// When this overview was generated
    pub generated_at: DateTime<Utc>,
}

/// Build an overview from a ledger row (or its absence) and the policy.
pub fn build_overview(
    identity: &Identity,
    record: Option<&UsageRecord>,
    policy: &PlanPolicy,
    today: NaiveDate,
) -> UsageOverview {
    let plan = record.map(|r| r.plan).unwrap_or(Plan::Free);

    let resources = ResourceKind::ALL
        .iter()
        .map(|&resource| {
            let rule = policy.cap_for(plan, resource);
            let counter = record.map(|r| r.counter(resource)).unwrap_or_default();
            let used = counter.effective_used(rule.period, today);

            let (cap, remaining) = match rule.limit {
                Limit::Bounded(cap) => (Some(cap), Some(cap.saturating_sub(used))),
                Limit::Unbounded => (None, None),
            };

            ResourceUsage {
                resource,
                used,
                cap,
                period: rule.period,
                remaining,
            }
        })
        .collect();

    UsageOverview {
        identity_key: identity.key(),
        plan,
        project_locked: record
            .map(|r| r.project_fingerprint.is_some())
            .unwrap_or(false),
        resources,
        generated_at: Utc::now(),
    }
}
