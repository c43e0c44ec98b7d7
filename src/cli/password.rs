//! Password generation and the pass/fail strength check.
//!
//! These are collaborator helpers: the vault core stores whatever it is
//! given, and the CLI decides whether a password is acceptable.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::{PassVaultError, Result};

/// Minimum length accepted by `check_strength`.
pub const MIN_PASSWORD_LEN: usize = 8;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Generate a random password of `length` characters drawn from ASCII
/// letters, digits, and punctuation.
///
/// When `length >= 4` the result contains at least one character of each
/// class, so any generated password of 8 or more characters passes
/// `check_strength`.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    let classes = [LOWER, UPPER, DIGITS, PUNCTUATION];
    let all: Vec<u8> = classes.concat();

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    if length >= classes.len() {
        for class in classes {
            chars.push(class[rng.random_range(0..class.len())]);
        }
    }
    while chars.len() < length {
        chars.push(all[rng.random_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

/// Check that `password` is at least 8 characters and mixes digits,
/// uppercase, lowercase, and punctuation.
pub fn check_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PassVaultError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PassVaultError::WeakPassword(
            "must include at least one number".into(),
        ));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(PassVaultError::WeakPassword(
            "must include at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(PassVaultError::WeakPassword(
            "must include at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_punctuation()) {
        return Err(PassVaultError::WeakPassword(
            "must include at least one special character".into(),
        ));
    }
    Ok(())
}
