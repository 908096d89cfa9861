//! PayTR notification verification gate.
//!
//! Every notification passes through [`Gate::evaluate`], which yields one of
//! three verdicts:
//! - `Admit` - first valid delivery, hand the [`VerifiedEvent`] downstream
//! - `Duplicate` - valid signature, already handled
//! - `Reject` - missing or bad signature, or missing secrets
//!
//! ## Flow
//!
//! ```text
//! fields + salt → canonical string → HMAC-SHA256 → compare → order id → fingerprint → verdict
//! ```

pub mod canonical;
pub mod clock;
pub mod signature;
pub mod store;
pub mod tracker;
pub mod types;
pub mod verifier;

pub use canonical::build_canonical_string;
pub use clock::{Clock, SystemClock};
pub use signature::{safe_equals, sign, SignatureError};
pub use store::{InMemorySeenStore, SeenStore};
pub use tracker::{fingerprint, DuplicateTracker, REPLAY_WINDOW};
pub use types::{DuplicateReason, IncomingEvent, RejectReason, Verdict, VerifiedEvent};
pub use verifier::{Gate, MerchantSecrets};
