//! Storage-facing error types.

use miette::Diagnostic;

/// Errors surfaced by the persistence and file-storage services.
///
/// Ownership checks are deliberately folded into a single variant: callers
/// can't distinguish "no such record" from "not yours", so neither can an
/// attacker probing for record ids.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum StoreError {
    /// The record does not exist, or the acting user is not its owner.
    #[error("record not found or actor is not the owner")]
    NotFoundOrUnauthorized,

    /// The backing service could not be reached or misbehaved.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
