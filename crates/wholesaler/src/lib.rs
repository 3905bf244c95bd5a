//! Client for the Buchbutler/Moluna wholesaler API.
//!
//! Three remote surfaces: CONTENT (descriptive product data), MOVEMENT
//! (stock and price), and ORDER (submission). The enrichment side fails
//! closed: whatever goes wrong upstream, the caller gets `None` and renders
//! with defaults. The export side builds the exact payload shape the ORDER
//! endpoint expects and is gated behind a sandbox flag that defaults to on.

pub mod availability;
pub mod client;
pub mod content;
pub mod error;
pub mod export;

pub use availability::Availability;
pub use client::{DEFAULT_BASE_URL, WholesalerClient, WholesalerConfig};
pub use content::ProductContent;
pub use error::{Result, WholesalerError};
pub use export::{OrderSubmission, build_payload};
