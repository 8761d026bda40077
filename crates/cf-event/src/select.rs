//! Weighted Random Selection
//!
//! Cumulative-sum scan over a variant group. Groups hold tens of variants
//! at most, so no alias table or prefix-sum cache is kept.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pick one candidate with probability proportional to its weight
///
/// `roll` must yield values in `[0, 1)`; it is called at most once.
///
/// - Empty input: `None`.
/// - Total weight zero (or negative/NaN weights only): the first candidate.
/// - Otherwise: the first candidate whose cumulative weight exceeds
///   `roll() * total`. Zero-weight candidates are never chosen.
pub fn select_weighted<'a, T, W, R>(candidates: &'a [T], weight: W, roll: &mut R) -> Option<&'a T>
where
    W: Fn(&T) -> f32,
    R: FnMut() -> f32,
{
    let weight_of = |c: &T| {
        let w = weight(c);
        if w.is_nan() { 0.0 } else { w.max(0.0) }
    };

    let first = candidates.first()?;
    let total: f32 = candidates.iter().map(&weight_of).sum();
    if total <= 0.0 || !total.is_finite() {
        return Some(first);
    }

    let target = roll().clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    for candidate in candidates {
        cumulative += weight_of(candidate);
        if cumulative > target {
            return Some(candidate);
        }
    }

    // Rounding left the target at or past the final sum
    candidates
        .iter()
        .rev()
        .find(|&c| weight_of(c) > 0.0)
        .or(Some(first))
}

/// Seedable source of selection rolls
///
/// ChaCha8 keeps sequences identical across platforms for a given seed.
#[derive(Debug, Clone)]
pub struct SelectionRng {
    rng: ChaCha8Rng,
}

impl SelectionRng {
    /// Seed from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    /// Reproducible sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Next roll in `[0, 1)`
    #[inline]
    pub fn roll(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

impl Default for SelectionRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
