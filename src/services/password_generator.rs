//! Random password generation under compositional constraints.
//!
//! A password is assembled from the required minimum of each character class,
//! topped up from the combined alphabet, then shuffled so the mandated
//! characters do not sit at predictable positions.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &[u8] = b"0123456789";
pub const SPECIAL: &[u8] = b"!@#$%^&*()-_=+[]{}<>?";

/// Union of every class above; used for the unconstrained positions.
const COMBINED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
abcdefghijklmnopqrstuvwxyz\
0123456789\
!@#$%^&*()-_=+[]{}<>?";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error(
        "constraints exceed requested length: {required} mandatory characters for length {length}"
    )]
    InfeasibleConstraints { length: usize, required: usize },
}

/// Checks that the class minimums fit into `length`.
///
/// # Errors
///
/// Returns [`PasswordError::InfeasibleConstraints`] when the minimums add up
/// to more than `length` (or overflow).
pub fn check_constraints(
    length: usize,
    min_upper: usize,
    min_digits: usize,
    min_special: usize,
) -> Result<usize, PasswordError> {
    let required = min_upper
        .checked_add(min_digits)
        .and_then(|sum| sum.checked_add(min_special))
        .unwrap_or(usize::MAX);

    if required > length {
        return Err(PasswordError::InfeasibleConstraints { length, required });
    }

    Ok(required)
}

/// Source of generated passwords, injected into the user service.
pub trait PasswordGenerator: Send + Sync {
    /// Returns a password of exactly `length` characters holding at least
    /// `min_upper` uppercase letters, `min_digits` digits and `min_special`
    /// special characters.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::InfeasibleConstraints`] if the minimums do not
    /// fit into `length`.
    fn generate(
        &self,
        length: usize,
        min_upper: usize,
        min_digits: usize,
        min_special: usize,
    ) -> Result<String, PasswordError>;
}

/// Generator backed by the thread-local CSPRNG (ChaCha, reseeded from the OS).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPasswordGenerator;

impl RandomPasswordGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PasswordGenerator for RandomPasswordGenerator {
    fn generate(
        &self,
        length: usize,
        min_upper: usize,
        min_digits: usize,
        min_special: usize,
    ) -> Result<String, PasswordError> {
        let mut rng = rand::rng();
        generate_with(&mut rng, length, min_upper, min_digits, min_special)
    }
}

/// Generates a password from an explicit random source.
///
/// The output is fully determined by the state of `rng`, which makes seeded
/// generators usable in tests.
///
/// # Errors
///
/// Returns [`PasswordError::InfeasibleConstraints`] if the minimums do not
/// fit into `length`.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    length: usize,
    min_upper: usize,
    min_digits: usize,
    min_special: usize,
) -> Result<String, PasswordError> {
    let required = check_constraints(length, min_upper, min_digits, min_special)?;

    let mut chars = Vec::with_capacity(length);
    draw(rng, UPPERCASE, min_upper, &mut chars);
    draw(rng, DIGITS, min_digits, &mut chars);
    draw(rng, SPECIAL, min_special, &mut chars);
    draw(rng, COMBINED, length - required, &mut chars);

    chars.shuffle(rng);

    Ok(chars.into_iter().map(char::from).collect())
}

fn draw<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], count: usize, out: &mut Vec<u8>) {
    out.extend((0..count).map(|_| alphabet[rng.random_range(0..alphabet.len())]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn counts(password: &str) -> (usize, usize, usize) {
        let upper = password.chars().filter(char::is_ascii_uppercase).count();
        let digits = password.chars().filter(char::is_ascii_digit).count();
        let special = password.bytes().filter(|b| SPECIAL.contains(b)).count();
        (upper, digits, special)
    }

    #[test]
    fn combined_alphabet_is_union_of_classes() {
        let union: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SPECIAL].concat();
        assert_eq!(COMBINED, union.as_slice());
    }

    #[test]
    fn default_policy_shape() {
        let generator = RandomPasswordGenerator::new();
        for _ in 0..200 {
            let password = generator.generate(12, 2, 8, 2).unwrap();
            assert_eq!(password.len(), 12);

            let (upper, digits, special) = counts(&password);
            assert!(upper >= 2, "{password}");
            assert!(digits >= 8, "{password}");
            assert!(special >= 2, "{password}");
        }
    }

    #[test]
    fn every_feasible_combination_meets_minimums() {
        let mut rng = StdRng::seed_from_u64(7);
        for length in 0..=20 {
            for min_upper in 0..=length {
                for min_digits in 0..=(length - min_upper) {
                    let min_special = rng.random_range(0..=(length - min_upper - min_digits));
                    let password =
                        generate_with(&mut rng, length, min_upper, min_digits, min_special)
                            .unwrap();

                    assert_eq!(password.chars().count(), length);
                    let (upper, digits, special) = counts(&password);
                    assert!(upper >= min_upper);
                    assert!(digits >= min_digits);
                    assert!(special >= min_special);
                    assert!(password.bytes().all(|b| COMBINED.contains(&b)));
                }
            }
        }
    }

    #[test]
    fn infeasible_constraints_are_rejected() {
        let generator = RandomPasswordGenerator::new();
        assert_eq!(
            generator.generate(5, 3, 3, 0).unwrap_err(),
            PasswordError::InfeasibleConstraints {
                length: 5,
                required: 6
            }
        );
    }

    #[test]
    fn overflowing_constraints_are_rejected() {
        let err = check_constraints(10, usize::MAX, 1, 0).unwrap_err();
        assert!(err.to_string().contains("constraints exceed requested length"));
    }

    #[test]
    fn zero_length_yields_empty_password() {
        assert_eq!(RandomPasswordGenerator.generate(0, 0, 0, 0).unwrap(), "");
    }

    #[test]
    fn repeated_calls_produce_distinct_passwords() {
        let generator = RandomPasswordGenerator::new();
        let seen: HashSet<String> = (0..500)
            .map(|_| generator.generate(12, 2, 8, 2).unwrap())
            .collect();
        assert_eq!(seen.len(), 500);
    }

    #[test]
    fn same_seed_reproduces_password() {
        let a = generate_with(&mut StdRng::seed_from_u64(42), 16, 2, 2, 2).unwrap();
        let b = generate_with(&mut StdRng::seed_from_u64(42), 16, 2, 2, 2).unwrap();
        let c = generate_with(&mut StdRng::seed_from_u64(43), 16, 2, 2, 2).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mandated_characters_are_not_front_loaded() {
        // Only digits are mandated; without the shuffle the first four
        // characters would always be digits.
        let mut rng = StdRng::seed_from_u64(1);
        let front_all_digits = (0..200)
            .map(|_| generate_with(&mut rng, 12, 0, 4, 0).unwrap())
            .filter(|p| p.chars().take(4).all(|c| c.is_ascii_digit()))
            .count();
        assert!(front_all_digits < 50, "{front_all_digits} of 200 front-loaded");
    }
}
