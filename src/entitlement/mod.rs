//! Entitlement and Usage-Quota Engine
//!
//! Decides, for a caller identity, resource kind, and plan, whether a
//! metered generation operation may proceed, and durably records the
//! consumption. Caps are never double-spent or under-enforced, including
//! under concurrent requests from the same caller.
//!
//! # Features
//!
//! - Per-identity, per-resource counters with total and per-UTC-day caps
//! - Atomic check-and-increment against the usage ledger
//! - Capacity plans bound to a single project via fingerprint locking
//! - Data-driven cap policy with environment overrides
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Entitlement Service                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Identity   │  │ Plan Policy │  │    Project Lock     │  │
//! │  │  Resolver   │  │ (caps data) │  │ (fingerprint bind)  │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │   Quota Store (atomic check-and-increment ledger)   │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dashboard;
pub mod identity;
pub mod plan;
pub mod project_lock;
pub mod service;
pub mod store;

// Property-based tests module
#[cfg(test)]
mod proptests;

pub use config::EntitlementConfig;
pub use dashboard::{ResourceUsage, UsageOverview};
pub use identity::{
    GuestFingerprinter, Identity, IdentityResolver, RequestCredentials, SignalFingerprinter,
};
pub use plan::{CapRule, Limit, Period, Plan, PlanPolicy, ResourceKind};
pub use project_lock::{LockCheck, ProjectContext, ProjectFingerprint, ProjectLockManager};
pub use service::{Decision, DenyReason, EntitlementError, EntitlementService};
pub use store::{
    Clock, ConsumeOutcome, Counter, LockOutcome, MemoryQuotaStore, QuotaStore, StoreError,
    SystemClock, UsageRecord,
};
