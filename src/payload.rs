// src/payload.rs
//
// Random identifiers, payloads, and indices for object synthesis.

use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{IDENTIFIER_CHARSET, PAYLOAD_KEY_LEN, PAYLOAD_VALUE_LEN};
use crate::store::Payload;

/// Source of randomness for names, payloads, and slot selection
///
/// Shared by every worker and mutator task, so implementations must be
/// thread-safe.
pub trait RandomPayloadSource: Send + Sync {
    /// Uniform index in `[0, n)`, or `None` when `n == 0`
    fn index(&self, n: usize) -> Option<usize>;

    /// Lowercase alphanumeric string of exactly `len` characters
    fn identifier(&self, len: usize) -> String {
        (0..len)
            .map(|_| {
                // IDENTIFIER_CHARSET is non-empty, so this always yields a slot
                let i = self.index(IDENTIFIER_CHARSET.len()).unwrap_or(0);
                IDENTIFIER_CHARSET[i] as char
            })
            .collect()
    }

    /// Single-entry payload: random key -> base64 of random text, as raw bytes
    fn payload(&self) -> Payload {
        let key = self.identifier(PAYLOAD_KEY_LEN);
        let value = self.identifier(PAYLOAD_VALUE_LEN);
        let mut data = Payload::new();
        data.insert(key, STANDARD.encode(value.as_bytes()).into_bytes());
        data
    }
}

/// Process-wide thread RNG; the default for real runs
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomPayloadSource for ThreadRngSource {
    fn index(&self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        Some(rand::rng().random_range(0..n))
    }
}

/// Reproducible source driven by a fixed seed
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomPayloadSource for SeededSource {
    fn index(&self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        // A poisoned lock only means another task panicked mid-draw; the RNG state is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Some(rng.random_range(0..n))
    }
}
