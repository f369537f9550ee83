//! Random display names for generated rows
//!
//! Every generated item and subitem gets a name made of 16 random bytes,
//! hex-encoded into a 32 character string.
//!
//! # Example
//!
//! ```rust
//! use rowfarm::names::{NameSource, RandomNames, SeededNames};
//!
//! let mut names = RandomNames::new();
//! assert_eq!(names.next_name().len(), 32);
//!
//! // Reproducible sequence for a fixed seed
//! let a = SeededNames::new(7).next_name();
//! let b = SeededNames::new(7).next_name();
//! assert_eq!(a, b);
//! ```

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Number of random bytes behind each name
pub const NAME_BYTES: usize = 16;

/// Source of display names for generated rows
pub trait NameSource: Send {
    /// Produce the next name
    fn next_name(&mut self) -> String;
}

/// Names drawn from the thread-local CSPRNG
#[derive(Debug, Clone, Default)]
pub struct RandomNames;

impl RandomNames {
    /// Create a new random name source
    pub fn new() -> Self {
        Self
    }
}

impl NameSource for RandomNames {
    fn next_name(&mut self) -> String {
        let mut bytes = [0u8; NAME_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Names drawn from a seeded generator, for reproducible runs
#[derive(Debug, Clone)]
pub struct SeededNames {
    rng: StdRng,
}

impl SeededNames {
    /// Create a seeded name source
    ///
    /// # Arguments
    /// * `seed` - Seed for the underlying generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NameSource for SeededNames {
    fn next_name(&mut self) -> String {
        let mut bytes = [0u8; NAME_BYTES];
        self.rng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Name source picked at runtime from an optional seed
#[derive(Debug, Clone)]
pub enum Names {
    /// Thread-local CSPRNG
    Random(RandomNames),
    /// Seeded generator
    Seeded(SeededNames),
}

impl Names {
    /// Seeded names when `seed` is set, random names otherwise
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Names::Seeded(SeededNames::new(seed)),
            None => Names::Random(RandomNames::new()),
        }
    }
}

impl NameSource for Names {
    fn next_name(&mut self) -> String {
        match self {
            Names::Random(names) => names.next_name(),
            Names::Seeded(names) => names.next_name(),
        }
    }
}
