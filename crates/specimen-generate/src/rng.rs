use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seedable random source behind every generation call.
///
/// With a pinned seed, `reset` rewinds the stream so the next call repeats
/// the previous one. Without one, `reset` draws fresh entropy.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: Option<u64>,
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            rng: seeded(seed),
        }
    }

    /// Pins (or unpins) the seed and restarts the stream.
    pub fn seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.rng = seeded(self.seed);
    }

    pub fn pinned_seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new(None)
    }
}

fn seeded(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}
