//! Single-flight tenant flag cache.
//!
//! Every (tenant, key) pair moves through a small state machine:
//!
//! ```text
//! Absent --claim--> Fetching --success--> Loaded (terminal)
//!                   Fetching --failure/panic--> Absent
//! ```
//!
//! Exactly one caller owns a pair while it is `Fetching`; everyone else
//! asking for that pair blocks until the owner publishes or abandons it.
//! The owner runs the backend fetch without holding the table lock.

mod fetch_guard;
pub mod state;
pub mod stats;
pub mod tenant_flags;

pub use state::EntryState;
pub use stats::CacheStats;
pub use tenant_flags::TenantFlagCache;
