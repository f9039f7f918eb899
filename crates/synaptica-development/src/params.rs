// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connectivity parameters: pattern, distance distribution, and the
//! per-call knobs. Validation is loud and happens before any neuron is
//! touched.

use serde::{Deserialize, Serialize};
use synaptica_neural::{PlasticityRule, Result, SynapseType, SynapticaError};

/// Macro-scale wiring motif between (or within) regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityPattern {
    /// Layered forward only.
    Feedforward,
    /// Layered backward; weaker by convention.
    Feedback,
    /// Short-range within a level. Self-connections forbidden.
    Lateral,
    /// Bidirectional pairs, second direction inlined in the same pass.
    Reciprocal,
    /// Sampled long-range.
    Global,
    Sparse,
    Dense,
    /// Dense intra-module, weak inter-module.
    Modular,
}

/// Connection probability as a function of inter-neuron distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceDistribution {
    Uniform,
    Gaussian,
    Exponential,
    PowerLaw,
    SmallWorld,
}

/// Distance below which SmallWorld keeps full local connectivity.
const SMALL_WORLD_LOCAL_RADIUS: f32 = 2.0;

impl DistanceDistribution {
    /// Probability multiplier at distance `d` with spread `sigma`.
    pub fn probability(&self, d: f32, sigma: f32) -> f32 {
        let sigma = sigma.max(f32::EPSILON);
        match self {
            DistanceDistribution::Uniform => 1.0,
            DistanceDistribution::Gaussian => (-(d * d) / (2.0 * sigma * sigma)).exp(),
            DistanceDistribution::Exponential => (-d / sigma).exp(),
            DistanceDistribution::PowerLaw => (d + 1.0).powf(-sigma),
            DistanceDistribution::SmallWorld => {
                if d <= SMALL_WORLD_LOCAL_RADIUS {
                    1.0
                } else {
                    (-(d - SMALL_WORLD_LOCAL_RADIUS) / sigma).exp()
                }
            }
        }
    }
}

/// Everything one `connect_regions` call needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub pattern: ConnectivityPattern,
    pub distribution: DistanceDistribution,
    /// Base probability before the distance multiplier.
    pub base_probability: f32,
    /// Spread parameter of the distance distribution.
    pub sigma: f32,
    /// Mean of the Normal weight distribution.
    pub weight_mean: f32,
    /// Standard deviation of the Normal weight distribution.
    pub weight_std: f32,
    pub synapse_type: SynapseType,
    pub plasticity_rule: PlasticityRule,
    pub learning_rate: f32,
    /// Per-source fan-out cap. 0 = unbounded.
    pub max_per_neuron: usize,
    /// On non-Reciprocal patterns, run a second pass with source and
    /// target swapped. Recursion is disabled on the second pass.
    pub bidirectional: bool,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            pattern: ConnectivityPattern::Sparse,
            distribution: DistanceDistribution::Uniform,
            base_probability: 0.1,
            sigma: 5.0,
            weight_mean: 0.5,
            weight_std: 0.1,
            synapse_type: SynapseType::Excitatory,
            plasticity_rule: PlasticityRule::Hebbian,
            learning_rate: 0.01,
            max_per_neuron: 0,
            bidirectional: false,
        }
    }
}

impl ConnectionParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.base_probability) {
            return Err(SynapticaError::InvalidArgument(format!(
                "base_probability {} outside [0, 1]",
                self.base_probability
            )));
        }
        if self.weight_std < 0.0 || !self.weight_std.is_finite() {
            return Err(SynapticaError::InvalidArgument(format!(
                "weight_std {} must be finite and non-negative",
                self.weight_std
            )));
        }
        if !self.weight_mean.is_finite() {
            return Err(SynapticaError::InvalidArgument(format!(
                "weight_mean {} must be finite",
                self.weight_mean
            )));
        }
        if self.sigma <= 0.0 || !self.sigma.is_finite() {
            return Err(SynapticaError::InvalidArgument(format!(
                "sigma {} must be finite and positive",
                self.sigma
            )));
        }
        if self.learning_rate < 0.0 {
            return Err(SynapticaError::InvalidArgument(format!(
                "learning_rate {} must be non-negative",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        ConnectionParams::default().validate().unwrap();
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let params = ConnectionParams {
            base_probability: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_std_rejected() {
        let params = ConnectionParams {
            weight_std: -0.1,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_distributions_decay_with_distance() {
        for dist in [
            DistanceDistribution::Gaussian,
            DistanceDistribution::Exponential,
            DistanceDistribution::PowerLaw,
        ] {
            let near = dist.probability(1.0, 2.0);
            let far = dist.probability(10.0, 2.0);
            assert!(near > far, "{:?}: {} vs {}", dist, near, far);
        }
        assert_eq!(DistanceDistribution::Uniform.probability(100.0, 2.0), 1.0);
    }

    #[test]
    fn test_small_world_keeps_local_neighborhood() {
        let dist = DistanceDistribution::SmallWorld;
        assert_eq!(dist.probability(1.0, 2.0), 1.0);
        assert_eq!(dist.probability(2.0, 2.0), 1.0);
        assert!(dist.probability(5.0, 2.0) < 1.0);
    }
}
