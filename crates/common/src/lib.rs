//! Shared plumbing for the bidding and auction services.

/// Error visibility classes and the accumulating reporter.
pub mod error;

/// Per-request logging context and consented-debug gating.
pub mod context;

/// Decrypt/encrypt scaffolding for the encrypted unary services.
pub mod gateway;

/// Private-key cache and refresh loop.
pub mod keys;

/// Buyer/seller key-value clients.
pub mod kv;

/// Debug-reporting URL pipeline.
pub mod reporting;

/// Metrics helpers.
pub mod metrics;

/// Logger initialization.
pub mod logger;

pub use context::RequestContext;
pub use error::{ErrorAccumulator, ErrorCode, ErrorVisibility};
