//! Random password generator.

use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{NspmError, Result};

/// Digits, ASCII letters and ASCII punctuation: all 94 printable,
/// non-space ASCII characters.
const CHARSET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Generate a password of `length` characters drawn uniformly from
/// `CHARSET`.
pub fn generate(length: usize) -> Result<Zeroizing<String>> {
    if length == 0 {
        return Err(NspmError::ConfigError(
            "generated password length must be at least 1".into(),
        ));
    }

    let mut rng = rand::rng();
    let password: String = (0..length)
        .map(|_| char::from(CHARSET[rng.random_range(0..CHARSET.len())]))
        .collect();

    Ok(Zeroizing::new(password))
}
