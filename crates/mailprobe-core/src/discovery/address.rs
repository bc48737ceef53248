//! Email address handling.

use crate::{Error, Result};

/// Splits an address into local part and domain at the last `@`.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if there is no `@` or either side is
/// empty.
pub fn split_address(email: &str) -> Result<(&str, &str)> {
    match email.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok((local, domain)),
        _ => Err(Error::InvalidAddress(email.to_string())),
    }
}
