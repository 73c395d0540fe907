//! Effects error type.

use thiserror::Error;

/// Failure inside an effects sink.
///
/// Sinks live at the application edge (stores, navigation, toasts), so
/// their failures are opaque strings to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Effects sink failed: {0}")]
pub struct EffectsError(pub String);
