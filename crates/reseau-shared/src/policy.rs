//! Engine policy knobs loaded from environment variables.
//!
//! All settings have sensible defaults so the engines can run with zero
//! configuration; hosts that embed them can also deserialize the structs
//! from their own config files.

use serde::{Deserialize, Serialize};

/// Hard ceiling on graph exploration depth.  Policy values above this are
/// clamped so no traversal ever walks further than three hops.
pub const HOP_CEILING: u32 = 3;

/// Policy for the connection graph engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPolicy {
    /// A requester below this accepted-degree may contact anyone.
    /// Env: `RESEAU_DEGREE_THRESHOLD`
    /// Default: `4`
    pub degree_threshold: u32,

    /// At or above the threshold, the target must be reachable within this
    /// many hops over accepted edges.
    /// Env: `RESEAU_ELIGIBILITY_HOPS`
    /// Default: `3`
    pub eligibility_hops: u32,

    /// Maximum hops accepted by friends-of-friends traversal.
    /// Env: `RESEAU_TRAVERSAL_HOPS`
    /// Default: `3` (never effectively above [`HOP_CEILING`])
    pub max_traversal_hops: u32,

    /// Whether a rejected pair may be re-requested.  When false, rejection
    /// is terminal for that pair.
    /// Env: `RESEAU_ALLOW_REREQUEST` (true/false)
    /// Default: `true`
    pub allow_rerequest: bool,
}

impl Default for GraphPolicy {
    fn default() -> Self {
        Self {
            degree_threshold: 4,
            eligibility_hops: 3,
            max_traversal_hops: 3,
            allow_rerequest: true,
        }
    }
}

impl GraphPolicy {
    /// Load policy from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut policy = Self::default();

        if let Ok(val) = std::env::var("RESEAU_DEGREE_THRESHOLD") {
            match val.parse::<u32>() {
                Ok(n) => policy.degree_threshold = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid RESEAU_DEGREE_THRESHOLD, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("RESEAU_ELIGIBILITY_HOPS") {
            match val.parse::<u32>() {
                Ok(n) => policy.eligibility_hops = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid RESEAU_ELIGIBILITY_HOPS, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("RESEAU_TRAVERSAL_HOPS") {
            match val.parse::<u32>() {
                Ok(n) => policy.max_traversal_hops = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid RESEAU_TRAVERSAL_HOPS, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("RESEAU_ALLOW_REREQUEST") {
            policy.allow_rerequest = val != "false" && val != "0";
        }

        policy
    }
}

/// Policy for the messaging engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePolicy {
    /// Require an accepted connection between sender and receiver before a
    /// message may be sent.  Off by default: anyone may message anyone,
    /// matching the historical behaviour; turning this on is the hardened
    /// variant.
    /// Env: `RESEAU_REQUIRE_FRIENDSHIP` (true/false)
    /// Default: `false`
    pub require_friendship: bool,
}

impl Default for MessagePolicy {
    fn default() -> Self {
        Self {
            require_friendship: false,
        }
    }
}

impl MessagePolicy {
    /// Load policy from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut policy = Self::default();

        if let Ok(val) = std::env::var("RESEAU_REQUIRE_FRIENDSHIP") {
            policy.require_friendship = val == "true" || val == "1";
        }

        policy
    }
}
