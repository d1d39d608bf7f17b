//! Admin sign-in.

use std::fmt;

use subtle::ConstantTimeEq;

/// Credentials the admin area accepts.
#[derive(Clone)]
pub struct AdminCredentials {
    email: String,
    password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AdminCredentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Whether `email` and `password` both match.
    ///
    /// Both comparisons always run so timing does not reveal which one
    /// failed.
    #[must_use]
    pub fn verify(&self, email: &str, password: &str) -> bool {
        let email_ok = self.email.as_bytes().ct_eq(email.as_bytes());
        let password_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (email_ok & password_ok).into()
    }
}
