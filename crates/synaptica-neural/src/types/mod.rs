// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions

pub mod error;
pub mod ids;

pub use error::{Result, SynapticaError};
pub use ids::{IdAllocator, NeuronId, RegionId, SynapseId};

/// Lower bound for synaptic weights after any update.
pub const WEIGHT_MIN: f32 = -2.0;

/// Upper bound for synaptic weights after any update.
pub const WEIGHT_MAX: f32 = 2.0;

/// STDP time constant in milliseconds.
pub const STDP_TAU_MS: f64 = 20.0;

/// Box-Muller draw from Normal(mu, sigma). Shared by every weight
/// sampler in the workspace so the transform cannot drift between
/// call sites.
pub fn sample_normal(rng: &mut impl rand::Rng, mu: f32, sigma: f32) -> f32 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mu + sigma * z as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_normal_zero_sigma_returns_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..16 {
            assert_eq!(sample_normal(&mut rng, 0.4, 0.0), 0.4);
        }
    }

    #[test]
    fn test_sample_normal_is_seed_deterministic() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        for _ in 0..16 {
            assert_eq!(sample_normal(&mut a, 0.0, 1.0), sample_normal(&mut b, 0.0, 1.0));
        }
    }
}
