//! Inline asset reference markers.
//!
//! Block content carries one `[[ASSET:<id>]]` token per anchored asset so the
//! rendering stage can put each asset back next to its text. Injection is
//! idempotent and fail-closed: a document whose references do not check out
//! is rejected as a whole.

mod inject;
mod token;
mod validate;

pub use inject::inject_markers;
pub use token::{find_markers, is_valid_asset_id, strip_markers, token_for, MarkerRef, TOKEN_OPEN};
pub use validate::{collect_violations, validate_markers, MarkerInjectionError, MarkerViolation};
