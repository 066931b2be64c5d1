//! Authored Entitlements Library
//!
//! This library provides the entitlement and usage-quota engine behind the
//! Authored book-writing product: identity resolution, plan cap policy,
//! project locking, and the atomic usage ledger consulted by every metered
//! generation endpoint.

pub mod entitlement;

pub use entitlement::{
    Decision, DenyReason, EntitlementConfig, EntitlementError, EntitlementService, Identity,
    IdentityResolver, MemoryQuotaStore, Plan, ProjectContext, QuotaStore, RequestCredentials,
    ResourceKind,
};
