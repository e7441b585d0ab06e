//! Initial Login Credentials

use rand::{CryptoRng, Rng, rngs::OsRng};
use serde::Serialize;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

/// Number of characters sampled from [`ALPHABET`]
pub const RANDOM_LENGTH: usize = 16;

/// Appended to every password so each character class is present
pub const CLASS_SUFFIX: &str = "Aa1!";

/// Symbols that may appear in a generated password
pub const SYMBOLS: &str = "!@#$%^&*";

/// Generated root password for a new instance.
///
/// `Debug` is redacted so the value never leaks through tracing fields.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InitialPassword(String);

impl InitialPassword {
    /// Generate from the operating system's CSPRNG
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generate from a caller-supplied cryptographic RNG
    pub fn generate_with<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut password: String = (0..RANDOM_LENGTH)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        password.push_str(CLASS_SUFFIX);
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for InitialPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InitialPassword([redacted])")
    }
}
