//! Machine-readable error codes shared by every ward crate.
//!
//! Each error enum in the workspace implements [`ErrorCode`] so that
//! callers (the CLI, an embedding service) can branch on a stable code
//! instead of parsing display strings.

/// Stable error code plus a recoverability hint.
///
/// Codes are UPPER_SNAKE_CASE and carry a crate prefix
/// (`AUTH_`, `WARD_`, `STORE_`, `POOL_`, `CONFIG_`, `SNAPSHOT_`).
///
/// # Example
///
/// ```
/// use ward_types::ErrorCode;
///
/// enum LookupError {
///     Missing,
///     Corrupt,
/// }
///
/// impl ErrorCode for LookupError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::Missing => "LOOKUP_MISSING",
///             Self::Corrupt => "LOOKUP_CORRUPT",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::Missing)
///     }
/// }
///
/// assert_eq!(LookupError::Missing.code(), "LOOKUP_MISSING");
/// assert!(!LookupError::Corrupt.is_recoverable());
/// ```
pub trait ErrorCode {
    /// Returns the stable code for this error.
    fn code(&self) -> &'static str;

    /// Returns `true` if the caller can reasonably report and continue
    /// (retry later, fix input) rather than treat the error as a bug.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error's code is well formed and carries `expected_prefix`.
///
/// # Panics
///
/// Panics if the code is empty, lacks the prefix, or is not UPPER_SNAKE_CASE.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();
    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Runs [`assert_error_code`] over every error in `errors`.
///
/// # Panics
///
/// Panics on the first malformed code.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && !s.ends_with('_')
        && !s.contains("__")
        && s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
