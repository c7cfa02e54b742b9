//! Shared error classification.

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for errors surfaced in logs.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
