//! Zeroizing wrapper for sensitive string material.
//!
//! Candidate credential values live in memory between the CreateSecret and
//! FinishSecret phases; wrapping them in [`SecretString`] guarantees the
//! buffer is wiped when the value is dropped or replaced.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// An owned string that zeroizes its contents on drop.
///
/// `Debug` and `Display` never print the inner value, so a `SecretString`
/// can appear in tracing fields without leaking the credential.
///
/// # Example
///
/// ```
/// use credsync::utils::SecretString;
///
/// let secret = SecretString::new("s3cr3t-value");
/// assert_eq!(secret.expose(), "s3cr3t-value");
/// assert_eq!(format!("{secret:?}"), "SecretString(***)");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a sensitive value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the inner value.
    ///
    /// Callers should avoid cloning the returned slice into long-lived
    /// buffers; the whole point of this type is bounding the value's
    /// lifetime.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length of the inner value in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the inner value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}
