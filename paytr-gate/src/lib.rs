//! PayTR webhook gate - signature verification and duplicate suppression.
//!
//! This library provides the pieces used by the `paytr-gate-web` binary:
//! - `gate`: canonical string, HMAC check, order id and replay tracking
//! - `web`: axum middleware and handlers around the gate
//! - `config`: environment configuration
//!
//! ## Architecture
//!
//! ```text
//! PayTR → POST /webhooks/paytr → verify_paytr (Gate) → paytr_webhook
//! ```

pub mod config;
pub mod gate;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use gate::{Gate, IncomingEvent, Verdict, VerifiedEvent};
pub use web::{router, AppState};
