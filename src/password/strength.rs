//! Advisory strength check for new passwords.
//!
//! Nothing here blocks a password from being stored; the CLI prints
//! whatever criteria a password misses and carries on.

use std::collections::HashSet;
use std::fmt;

/// Minimum length for a password to count as strong.
pub const STRONG_LENGTH: usize = 14;
const MIN_UPPERCASE: usize = 3;
const MIN_SPECIAL: usize = 2;
const MIN_UNIQUE: usize = 6;
const MIN_DIGITS: usize = 3;

/// A strength criterion a password failed to meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Length,
    Uppercase,
    Special,
    Unique,
    Digits,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length => write!(f, "should be at least {STRONG_LENGTH} characters long"),
            Self::Uppercase => write!(f, "should have at least {MIN_UPPERCASE} uppercase letters"),
            Self::Special => write!(f, "should have at least {MIN_SPECIAL} special characters"),
            Self::Unique => write!(f, "should have at least {MIN_UNIQUE} unique characters"),
            Self::Digits => write!(f, "should have at least {MIN_DIGITS} digits"),
        }
    }
}

/// Every criterion `password` misses, in a fixed order.  Empty means strong.
pub fn evaluate(password: &str) -> Vec<Criterion> {
    let count = |pred: fn(char) -> bool| password.chars().filter(|&c| pred(c)).count();

    let mut missed = Vec::new();
    if password.chars().count() < STRONG_LENGTH {
        missed.push(Criterion::Length);
    }
    if count(char::is_uppercase) < MIN_UPPERCASE {
        missed.push(Criterion::Uppercase);
    }
    if count(|c| c.is_ascii_punctuation()) < MIN_SPECIAL {
        missed.push(Criterion::Special);
    }
    if password.chars().collect::<HashSet<_>>().len() < MIN_UNIQUE {
        missed.push(Criterion::Unique);
    }
    if count(char::is_numeric) < MIN_DIGITS {
        missed.push(Criterion::Digits);
    }
    missed
}
