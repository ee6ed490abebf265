//! Nick validation.
//!
//! Nicks start with an ASCII letter or underscore and continue with ASCII
//! letters, digits, `_` or `-`. Validation never touches storage, so a
//! malformed nick is rejected before any cache or repository lookup.

use crate::domain::error::DomainError;

pub const MAX_NICK_LEN: usize = 40;

/// Validate a nick, returning it unchanged when well formed.
pub fn validate_nick(nick: &str) -> Result<&str, DomainError> {
    let mut chars = nick.chars();
    let Some(first) = chars.next() else {
        return Err(DomainError::validation("nick", "must not be empty"));
    };

    if nick.len() > MAX_NICK_LEN {
        return Err(DomainError::validation(
            "nick",
            format!("must be at most {MAX_NICK_LEN} characters"),
        ));
    }

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(DomainError::validation(
            "nick",
            "must start with a letter or underscore",
        ));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-')) {
        return Err(DomainError::validation(
            "nick",
            format!("contains unsupported character `{bad}`"),
        ));
    }

    Ok(nick)
}
