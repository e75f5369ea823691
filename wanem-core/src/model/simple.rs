use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    Arc,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::ImpairmentModel;
use crate::queue::DeliveryQueue;

/// Live-tunable parameters of the [`SimpleModel`].
///
/// The profile is a cloneable handle over one shared cell: every clone
/// observes (and may change) the same parameters, including while
/// emulation is running. Reads and writes are Relaxed atomics per scalar;
/// a tuning thread racing the reactor may observe one parameter update
/// before another, which is harmless for an emulator.
#[derive(Debug, Clone)]
pub struct LinkProfile {
    inner: Arc<Params>,
}

#[derive(Debug)]
struct Params {
    /// Loss fraction as `f32` bits.
    loss: AtomicU32,
    /// Duplication fraction as `f32` bits.
    duplication: AtomicU32,
    delay_ms: AtomicU64,
    jitter_ms: AtomicU64,
}

impl LinkProfile {
    /// Creates a profile with explicit parameters.
    pub fn new(loss: f32, duplication: f32, delay_ms: u64, jitter_ms: u64) -> Self {
        Self {
            inner: Arc::new(Params {
                loss: AtomicU32::new(loss.to_bits()),
                duplication: AtomicU32::new(duplication.to_bits()),
                delay_ms: AtomicU64::new(delay_ms),
                jitter_ms: AtomicU64::new(jitter_ms),
            }),
        }
    }

    /// A profile with no impairment at all: every datagram is relayed
    /// exactly once, immediately.
    pub fn pristine() -> Self {
        Self::new(0.0, 0.0, 0, 0)
    }

    /// The chance of a datagram being lost. `0.0` relays everything,
    /// `1.0` drops everything.
    pub fn loss(&self) -> f32 {
        f32::from_bits(self.inner.loss.load(Ordering::Relaxed))
    }

    pub fn set_loss(&self, loss: f32) {
        self.inner.loss.store(loss.to_bits(), Ordering::Relaxed);
    }

    /// The chance of a datagram being duplicated. Each duplicate rolls
    /// again, so duplication is geometric; a value `>= 1.0` (with loss
    /// `< 1.0`) never stops duplicating and is a caller error.
    pub fn duplication(&self) -> f32 {
        f32::from_bits(self.inner.duplication.load(Ordering::Relaxed))
    }

    pub fn set_duplication(&self, duplication: f32) {
        self.inner.duplication.store(duplication.to_bits(), Ordering::Relaxed);
    }

    /// Base one-way delay in milliseconds. The effective delay varies
    /// within `delay_ms ± jitter_ms`.
    pub fn delay_ms(&self) -> u64 {
        self.inner.delay_ms.load(Ordering::Relaxed)
    }

    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.inner.delay_ms.store(delay_ms, Ordering::Relaxed);
    }

    /// Delay jitter in milliseconds.
    pub fn jitter_ms(&self) -> u64 {
        self.inner.jitter_ms.load(Ordering::Relaxed)
    }

    pub fn set_jitter_ms(&self, jitter_ms: u64) {
        self.inner.jitter_ms.store(jitter_ms, Ordering::Relaxed);
    }
}

impl Default for LinkProfile {
    /// Defaults to 10% loss, 3% duplication, 175 ms delay, ±75 ms jitter.
    fn default() -> Self {
        Self::new(0.10, 0.03, 175, 75)
    }
}

/// The reference impairment model: loss, geometric duplication and uniform
/// jitter around a base delay.
pub struct SimpleModel {
    profile: LinkProfile,
    rng: StdRng,
}

impl SimpleModel {
    /// Creates a model driven by the given profile, seeded from entropy.
    pub fn new(profile: LinkProfile) -> Self {
        Self { profile, rng: StdRng::from_entropy() }
    }

    /// Creates a deterministic model for reproducible runs.
    pub fn with_seed(profile: LinkProfile, seed: u64) -> Self {
        Self { profile, rng: StdRng::seed_from_u64(seed) }
    }

    /// A handle to the model's live parameters.
    pub fn profile(&self) -> LinkProfile {
        self.profile.clone()
    }
}

impl Default for SimpleModel {
    fn default() -> Self {
        Self::new(LinkProfile::default())
    }
}

impl ImpairmentModel for SimpleModel {
    fn compute(&mut self, now_ms: u64, _pending: &DeliveryQueue, deadlines: &mut Vec<u64>) {
        // Parameters are re-read on every roll so live tuning takes effect
        // mid-burst, matching their Relaxed single-scalar semantics.
        loop {
            if self.rng.gen::<f32>() >= self.profile.loss() {
                let delay = self.profile.delay_ms();
                let jitter = self.profile.jitter_ms();
                let spread = self.rng.gen_range(0..=jitter.saturating_mul(2));
                deadlines
                    .push(now_ms.saturating_add(delay).saturating_add(spread).saturating_sub(jitter));
            }
            if self.rng.gen::<f32>() >= self.profile.duplication() {
                break;
            }
        }
    }
}
