//! Short ids for working branch names.

use rand::distr::Alphanumeric;
use rand::Rng;

pub const DEFAULT_ID_LEN: usize = 8;

pub trait BranchIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Lower-case alphanumeric ids from the thread-local RNG.
#[derive(Debug, Clone, Copy)]
pub struct RandomIds {
    len: usize,
}

impl RandomIds {
    pub fn new(len: usize) -> Self {
        Self { len: len.max(1) }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LEN)
    }
}

impl BranchIdGenerator for RandomIds {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.len)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect()
    }
}
