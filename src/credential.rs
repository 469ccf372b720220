//! API key capture for direct mode
//!
//! The key only ever lives in memory. `ApiKey` has no `Serialize` impl, a
//! redacted `Debug`, and its buffer is wiped when dropped.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` when the input is blank.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Password-style input plus the captured key
#[derive(Default)]
pub struct CredentialGate {
    pub input: String,
    pub cursor: usize,
    key: Option<ApiKey>,
}

impl CredentialGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.key.is_some()
    }

    pub fn key(&self) -> Option<&ApiKey> {
        self.key.as_ref()
    }

    /// Confirm the typed key. Blank input leaves the gate untouched.
    pub fn confirm(&mut self) -> bool {
        match ApiKey::new(&self.input) {
            Some(key) => {
                self.key = Some(key);
                self.input.zeroize();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    /// Masked rendering of the input: asterisks, then the last four characters
    pub fn masked_input(&self) -> String {
        let char_count = self.input.chars().count();
        if char_count == 0 {
            String::new()
        } else if char_count <= 4 {
            "*".repeat(char_count)
        } else {
            let masked_len = char_count - 4;
            let last_four: String = self.input.chars().skip(masked_len).collect();
            format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
        }
    }
}
