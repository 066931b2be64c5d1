//! Identity Resolution
//!
//! Turns an inbound request's credentials into a stable caller identity.
//! Authenticated callers keep their user id; everyone else degrades to a
//! guest fingerprint derived from low-entropy request signals. Resolution
//! never fails: downstream policy, not identity resolution, decides
//! whether guests may act.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Stable, opaque key for a caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    /// Caller with a verified account
    Authenticated {
        /// User id issued by the auth provider
        user_id: String,
    },
    /// Caller known only by request signals
    Guest {
        /// Fingerprint hash of the available signals
        fingerprint: String,
    },
}

impl Identity {
    /// Storage key for this identity
    pub fn key(&self) -> String {
        match self {
            Identity::Authenticated { user_id } => format!("user:{}", user_id),
            Identity::Guest { fingerprint } => format!("guest:{}", fingerprint),
        }
    }

    /// Whether this caller has no real account behind it
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }
}

/// Credentials and signals extracted from an inbound request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestCredentials {
    /// Verified user id, when the auth provider resolved one
    pub user_id: Option<String>,

    /// Remote network address
    pub remote_addr: Option<String>,

    /// Client signature, e.g. the user-agent string
    pub client_signature: Option<String>,
}

impl RequestCredentials {
    /// Credentials for an authenticated caller
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Credentials carrying only request signals
    pub fn anonymous(
        remote_addr: impl Into<String>,
        client_signature: impl Into<String>,
    ) -> Self {
        Self {
            user_id: None,
            remote_addr: Some(remote_addr.into()),
            client_signature: Some(client_signature.into()),
        }
    }
}

/// Strategy for deriving a guest fingerprint from request signals.
///
/// The default signal-based fingerprint is weak and spoofable. Swapping in
/// a stronger mechanism (e.g. a signed anonymous session token) replaces
/// this implementation without touching the rest of the engine.
pub trait GuestFingerprinter: Send + Sync {
    /// Derive a stable fingerprint from whatever signals are present
    fn fingerprint(&self, credentials: &RequestCredentials) -> String;
}

/// Default fingerprinter: SHA-256 over the joined request signals
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalFingerprinter;

impl GuestFingerprinter for SignalFingerprinter {
    fn fingerprint(&self, credentials: &RequestCredentials) -> String {
        let addr = credentials.remote_addr.as_deref().unwrap_or("").trim();
        let signature = credentials.client_signature.as_deref().unwrap_or("").trim();

        let mut hasher = Sha256::new();
        hasher.update(addr.as_bytes());
        hasher.update(b"|");
        hasher.update(signature.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Resolves request credentials into an [`Identity`]
#[derive(Clone)]
pub struct IdentityResolver {
    fingerprinter: Arc<dyn GuestFingerprinter>,
}

impl IdentityResolver {
    /// Resolver with the default signal fingerprinter
    pub fn new() -> Self {
        Self::with_fingerprinter(Arc::new(SignalFingerprinter))
    }

    /// Resolver with a custom guest-fingerprint strategy
    pub fn with_fingerprinter(fingerprinter: Arc<dyn GuestFingerprinter>) -> Self {
        Self { fingerprinter }
    }

    /// Resolve credentials to an identity. Pure; never fails.
    pub fn resolve(&self, credentials: &RequestCredentials) -> Identity {
        if let Some(user_id) = credentials.user_id.as_deref() {
            let user_id = user_id.trim();
            if !user_id.is_empty() {
                return Identity::Authenticated {
                    user_id: user_id.to_string(),
                };
            }
        }

        Identity::Guest {
            fingerprint: self.fingerprinter.fingerprint(credentials),
        }
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}
