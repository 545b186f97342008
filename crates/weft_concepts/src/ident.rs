//! Deterministic identifier minting.
//!
//! Every concept mints its identifiers from one shared seeded generator, so
//! a fixed seed reproduces the exact same IDs across runs. IDs are opaque
//! strings; nothing anywhere parses them back apart.

use std::sync::{Arc, Mutex};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A seeded identifier generator.
#[derive(Debug)]
pub struct IdMinter {
    rng: ChaCha8Rng,
}

impl IdMinter {
    /// Creates a minter from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Mints a fresh identifier with the given prefix, e.g. `user-1c9e02ab`.
    pub fn mint(&mut self, prefix: &str) -> Arc<str> {
        Arc::from(format!("{prefix}-{:08x}", self.rng.next_u32()))
    }
}

/// The minter handle concepts share.
pub type SharedMinter = Arc<Mutex<IdMinter>>;

/// Creates a shared minter from a seed.
#[must_use]
pub fn shared_minter(seed: u64) -> SharedMinter {
    Arc::new(Mutex::new(IdMinter::new(seed)))
}
