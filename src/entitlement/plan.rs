//! Plans, Resources, and the Cap Policy Table
//!
//! Closed enums for subscription plans and metered resource kinds, and the
//! static policy mapping a (plan, resource) pair to its cap rule. Adding a
//! plan or resource is a compile-time-checked change: every match below is
//! exhaustive.

use serde::{Deserialize, Serialize};

use super::config::EntitlementConfig;

/// Subscription tier governing caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plan {
    /// Free tier with small daily/total caps
    #[serde(rename = "free")]
    Free,
    /// Paid allotment scoped to a single book project ("project" on the wire)
    #[serde(rename = "project")]
    Capacity,
    /// Paid, no caps ("lifetime" on the wire)
    #[serde(rename = "lifetime")]
    Unlimited,
}

impl Plan {
    /// Name used in persisted rows and API payloads
    pub fn wire_name(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Capacity => "project",
            Plan::Unlimited => "lifetime",
        }
    }

    /// Parse a wire name, case-insensitively
    pub fn parse(value: &str) -> Option<Plan> {
        match value.trim().to_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "project" => Some(Plan::Capacity),
            "lifetime" => Some(Plan::Unlimited),
            _ => None,
        }
    }

    /// Whether this plan is the product of a payment capture
    pub fn is_paid(&self) -> bool {
        matches!(self, Plan::Capacity | Plan::Unlimited)
    }
}

/// A metered generation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Book outline generation
    Outline,
    /// Title suggestions
    Title,
    /// Book introduction draft
    Introduction,
    /// Chapter-level expansion
    Expansion,
}

impl ResourceKind {
    /// All metered resources, in display order
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Outline,
        ResourceKind::Title,
        ResourceKind::Introduction,
        ResourceKind::Expansion,
    ];

    /// Name used in persisted rows and API payloads
    pub fn wire_name(&self) -> &'static str {
        match self {
            ResourceKind::Outline => "outline",
            ResourceKind::Title => "title",
            ResourceKind::Introduction => "introduction",
            ResourceKind::Expansion => "expansion",
        }
    }
}

/// Cap on a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    /// Hard cap; `used` never exceeds it
    Bounded(u32),
    /// No cap; usage is tracked for analytics only
    Unbounded,
}

impl Limit {
    /// Whether this limit never rejects
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Limit::Unbounded)
    }
}

/// Accounting window for a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Counts for the lifetime of the record
    Total,
    /// Counts within one UTC calendar day, reset on rollover
    Daily,
}

/// The cap and window applied to one (plan, resource) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapRule {
    /// Admission cap
    pub limit: Limit,
    /// Accounting window
    pub period: Period,
}

impl CapRule {
    /// A lifetime-total cap
    pub fn total(cap: u32) -> Self {
        Self {
            limit: Limit::Bounded(cap),
            period: Period::Total,
        }
    }

    /// A per-UTC-day cap
    pub fn daily(cap: u32) -> Self {
        Self {
            limit: Limit::Bounded(cap),
            period: Period::Daily,
        }
    }

    /// No cap; tracked only
    pub fn unbounded() -> Self {
        Self {
            limit: Limit::Unbounded,
            period: Period::Total,
        }
    }
}

/// Static (plan, resource) → cap table, backed by configuration data
#[derive(Debug, Clone)]
pub struct PlanPolicy {
    config: EntitlementConfig,
}

impl PlanPolicy {
    /// Build the policy from configuration
    pub fn new(config: EntitlementConfig) -> Self {
        Self { config }
    }

    /// Cap rule for one plan and resource
    pub fn cap_for(&self, plan: Plan, resource: ResourceKind) -> CapRule {
        match plan {
            Plan::Free => match resource {
                ResourceKind::Outline => CapRule::daily(self.config.free_outlines_per_day),
                ResourceKind::Title => CapRule::total(self.config.free_titles_total),
                ResourceKind::Introduction => CapRule::total(self.config.free_introductions_total),
                ResourceKind::Expansion => CapRule::daily(self.config.free_expansions_per_day),
            },
            Plan::Capacity => match resource {
                ResourceKind::Outline => CapRule::total(self.config.capacity_outlines_total),
                ResourceKind::Title => CapRule::total(self.config.capacity_titles_total),
                ResourceKind::Introduction => {
                    CapRule::total(self.config.capacity_introductions_total)
                }
                ResourceKind::Expansion => CapRule::total(self.config.capacity_expansions_total),
            },
            Plan::Unlimited => CapRule::unbounded(),
        }
    }

    /// Whether a resource demands a real (non-guest) identity
    pub fn requires_account(&self, resource: ResourceKind) -> bool {
        match resource {
            ResourceKind::Outline => false,
            ResourceKind::Title | ResourceKind::Introduction | ResourceKind::Expansion => true,
        }
    }

    /// Whether a plan's capacity is bound to a single project
    pub fn requires_project_lock(&self, plan: Plan) -> bool {
        matches!(plan, Plan::Capacity)
    }

    /// Underlying configuration
    pub fn config(&self) -> &EntitlementConfig {
        &self.config
    }
}
