//! New password value object
//!
//! Only used when the user chooses a password (sign-up, reset). Sign-in
//! passes the raw input straight to the identity provider.

use kernel::error::app_error::{AppError, AppResult};

/// Provider default minimum length
pub const PASSWORD_MIN_CHARS: usize = 6;

/// bcrypt ignores everything past 72 bytes
pub const PASSWORD_MAX_BYTES: usize = 72;

#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(String);

impl NewPassword {
    pub fn new(password: impl Into<String>) -> AppResult<Self> {
        let password = password.into();

        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AppError::bad_request(format!(
                "Password must be at least {} characters",
                PASSWORD_MIN_CHARS
            )));
        }

        if password.len() > PASSWORD_MAX_BYTES {
            return Err(AppError::bad_request(format!(
                "Password must be at most {} bytes",
                PASSWORD_MAX_BYTES
            )));
        }

        Ok(Self(password))
    }

    /// Validate `password` and require `confirmation` to match it exactly
    pub fn with_confirmation(password: impl Into<String>, confirmation: &str) -> AppResult<Self> {
        let password = Self::new(password)?;
        if password.0 != confirmation {
            return Err(AppError::bad_request("Passwords do not match"));
        }
        Ok(password)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NewPassword(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        assert!(NewPassword::new("12345").is_err());
        assert!(NewPassword::new("123456").is_ok());
        assert!(NewPassword::new("a".repeat(72)).is_ok());
        assert!(NewPassword::new("a".repeat(73)).is_err());
    }

    #[test]
    fn test_multibyte_counts_chars_for_minimum() {
        // 6 characters, 18 bytes
        assert!(NewPassword::new("ああああああ").is_ok());
        // 25 characters, 75 bytes
        assert!(NewPassword::new("あ".repeat(25)).is_err());
    }

    #[test]
    fn test_confirmation_must_match() {
        assert!(NewPassword::with_confirmation("secret1", "secret1").is_ok());
        let err = NewPassword::with_confirmation("secret1", "secret2").unwrap_err();
        assert_eq!(err.message(), "Passwords do not match");
    }

    #[test]
    fn test_debug_redacts() {
        let password = NewPassword::new("hunter22").unwrap();
        assert!(!format!("{:?}", password).contains("hunter22"));
    }
}
