use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const SESSION_ID_PREFIX: &str = "demo-";
const SESSION_ID_RANDOM_LEN: usize = 8;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque per-attempt token handed to the stitcher. Not globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct SessionIdGenerator {
    rng: StdRng,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> SessionId {
        let mut token = String::with_capacity(SESSION_ID_PREFIX.len() + SESSION_ID_RANDOM_LEN);
        token.push_str(SESSION_ID_PREFIX);
        for _ in 0..SESSION_ID_RANDOM_LEN {
            let idx = self.rng.gen_range(0..BASE36.len());
            token.push(BASE36[idx] as char);
        }
        SessionId(token)
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdGenerator").finish_non_exhaustive()
    }
}
