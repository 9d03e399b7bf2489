use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// User/password pair, used both for the download-service contract and for
/// the tax portal account being queried.
///
/// The password is wiped from memory when the value is dropped and never
/// printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both halves are present and not blank.
    pub fn is_complete(&self) -> bool {
        !self.user.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_password() {
        let creds = Credentials::new("AAA010101AAA", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AAA010101AAA"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn blank_halves_are_incomplete() {
        assert!(Credentials::new("AAA010101AAA", "pw").is_complete());
        assert!(!Credentials::new("  ", "pw").is_complete());
        assert!(!Credentials::new("AAA010101AAA", "").is_complete());
    }
}
