use rand::{rngs::StdRng, Rng, SeedableRng};

/// Where the simulation draws its randomness from.
pub trait RandomSource {
    /// A uniform integer in `[min, max]`.
    fn uniform(&mut self, min: u32, max: u32) -> u32;

    /// Whether a running process asks for I/O this tick, with a `percent` chance.
    fn trigger_io(&mut self, percent: u32) -> bool;
}

/// `StdRng` backed source. A seed of 0 means "seed from the OS".
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(seed)
        };
        Self { rng }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..=max)
    }

    fn trigger_io(&mut self, percent: u32) -> bool {
        self.rng.gen_range(0..100) < percent
    }
}

/// Replays a fixed script of draws. Once a script runs out, `uniform`
/// answers `min` and `trigger_io` answers false.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    uniforms: std::collections::VecDeque<u32>,
    triggers: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(uniforms: &[u32], triggers: &[bool]) -> Self {
        Self {
            uniforms: uniforms.iter().copied().collect(),
            triggers: triggers.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, min: u32, max: u32) -> u32 {
        let value = self.uniforms.pop_front().unwrap_or(min);
        assert!(
            (min..=max).contains(&value),
            "scripted draw {value} outside {min}..={max}"
        );
        value
    }

    fn trigger_io(&mut self, _percent: u32) -> bool {
        self.triggers.pop_front().unwrap_or(false)
    }
}
