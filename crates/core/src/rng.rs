//! RNG module - 7-bag random piece generation
//!
//! The bag starts with one of each piece (I, J, L, O, S, T, Z). Every draw
//! takes a uniformly random piece out of the bag; once the bag is empty it is
//! refilled to all seven before the next draw. A kind therefore never waits
//! more than 12 draws between appearances, and any window of 14 draws
//! spanning at most one refill contains each kind at most twice.
//!
//! The bag is generic over any [`rand::Rng`]. [`SpawnBag::new`] seeds from the
//! OS; [`SpawnBag::with_seed`] gives a reproducible sequence for tests.

use arrayvec::ArrayVec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::PieceKind;

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct SpawnBag<R = StdRng> {
    /// Kinds not yet drawn from the current bag
    remaining: ArrayVec<PieceKind, 7>,
    rng: R,
}

impl SpawnBag<StdRng> {
    /// Create a bag seeded from the operating system
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create a bag with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SpawnBag<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            remaining: ArrayVec::from(PieceKind::ALL),
            rng,
        }
    }

    /// Draw the next piece, refilling the bag first if it is empty
    pub fn draw(&mut self) -> PieceKind {
        if self.remaining.is_empty() {
            self.refill();
        }

        let index = self.rng.random_range(0..self.remaining.len());
        self.remaining.remove(index)
    }

    /// Put every kind back into the bag
    pub fn reset(&mut self) {
        self.refill();
    }

    fn refill(&mut self) {
        self.remaining = ArrayVec::from(PieceKind::ALL);
    }

    /// Kinds still in the current bag
    pub fn remaining(&self) -> &[PieceKind] {
        &self.remaining
    }
}

impl Default for SpawnBag<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}
