//! Candidate credential generation.

use rand::Rng;

use crate::core::{EngineError, EngineResult, SecretString};

const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";
const DEFAULT_LENGTH: usize = 32;

/// Alphabet and length for generated candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub alphabet: String,
    pub length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            length: DEFAULT_LENGTH,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.alphabet.is_empty() {
            return Err(EngineError::InvalidConfig {
                reason: "generator alphabet must not be empty".to_string(),
            });
        }
        if self.length == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "generator length must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Draws uniformly from the configured alphabet. Not a password-policy
/// engine: no composition constraints beyond alphabet membership.
#[derive(Debug, Clone)]
pub struct CredentialGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl CredentialGenerator {
    pub fn new(config: GeneratorConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            alphabet: config.alphabet.chars().collect(),
            length: config.length,
        })
    }

    /// Generate one candidate value.
    pub fn generate(&self) -> SecretString {
        let mut rng = rand::rng();
        let value: String = (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect();
        SecretString::new(value)
    }
}

impl Default for CredentialGenerator {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            length: DEFAULT_LENGTH,
        }
    }
}
