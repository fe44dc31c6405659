// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record key generation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generates unique record keys
pub trait KeyGen: Clone + Send + Sync {
    fn next(&self) -> String;
}

const TID_ALPHABET: &[u8; 32] = b"234567abcdefghijklmnopqrstuvwxyz";

/// Time-sortable 13 character keys: 53 bits of microseconds since the epoch
/// followed by a 10 bit clock identifier, base32-sortable encoded.
#[derive(Clone)]
pub struct TidGen {
    clock_id: u64,
    last_micros: Arc<AtomicU64>,
}

impl TidGen {
    pub fn new(clock_id: u16) -> Self {
        Self {
            clock_id: u64::from(clock_id) & 0x3ff,
            last_micros: Arc::new(AtomicU64::new(0)),
        }
    }

    fn now_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }

    /// Encode a timestamp and clock id
    pub fn encode(micros: u64, clock_id: u64) -> String {
        let value = ((micros & ((1 << 53) - 1)) << 10) | (clock_id & 0x3ff);
        (0..13)
            .rev()
            .map(|i| TID_ALPHABET[((value >> (i * 5)) & 0x1f) as usize] as char)
            .collect()
    }
}

impl Default for TidGen {
    fn default() -> Self {
        Self::new((std::process::id() % 1024) as u16)
    }
}

impl KeyGen for TidGen {
    fn next(&self) -> String {
        let now = Self::now_micros();
        let mut last = self.last_micros.load(Ordering::SeqCst);
        let micros = loop {
            let candidate = now.max(last + 1);
            match self.last_micros.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break candidate,
                Err(current) => last = current,
            }
        };
        Self::encode(micros, self.clock_id)
    }
}

/// Sequential key generator for testing
#[derive(Clone)]
pub struct SequentialKeyGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialKeyGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialKeyGen {
    fn default() -> Self {
        Self::new("key")
    }
}

impl KeyGen for SequentialKeyGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
