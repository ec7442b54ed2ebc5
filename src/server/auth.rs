//! Admin authorization

use subtle::ConstantTimeEq;

/// Check a caller-supplied token against the configured secret.
///
/// Constant-time comparison; always false when no secret is configured
/// or no token was supplied. Failure is a denial value, not an error.
pub fn is_authorized(token: Option<&str>, secret: Option<&str>) -> bool {
    match (token, secret) {
        (Some(token), Some(secret)) => token.as_bytes().ct_eq(secret.as_bytes()).into(),
        _ => false,
    }
}
