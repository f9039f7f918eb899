// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reward shaping.
//!
//! Combines task reward with a novelty bonus measured against running
//! means of the observation vector and of per-region activations. The
//! means update *after* the novelty deltas are computed, so a repeated
//! stimulus loses its bonus gradually.

use crate::config::LearningConfig;

#[derive(Debug, Clone, Default)]
pub struct RewardShaper {
    mean_obs: Vec<f32>,
    mean_region_acts: Vec<f32>,
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn novelty_against(mean: &[f32], sample: &[f32]) -> f32 {
    let len = mean.len().max(sample.len());
    let mut delta = Vec::with_capacity(len);
    for i in 0..len {
        let m = mean.get(i).copied().unwrap_or(0.0);
        let s = sample.get(i).copied().unwrap_or(0.0);
        delta.push(s - m);
    }
    l2_norm(&delta) / (1.0 + l2_norm(mean))
}

fn ema_update(mean: &mut Vec<f32>, sample: &[f32], rate: f32) {
    mean.resize(mean.len().max(sample.len()), 0.0);
    for (i, m) in mean.iter_mut().enumerate() {
        let s = sample.get(i).copied().unwrap_or(0.0);
        *m = (1.0 - rate) * *m + rate * s;
    }
}

impl RewardShaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// shaped = gamma · task_reward + alpha · novelty. Returns
    /// (shaped, novelty).
    pub fn shape(
        &mut self,
        obs: &[f32],
        region_acts: &[f32],
        task_reward: f32,
        config: &LearningConfig,
    ) -> (f32, f32) {
        let novelty_obs = novelty_against(&self.mean_obs, obs);
        let novelty_regions = novelty_against(&self.mean_region_acts, region_acts);
        let novelty = config.novelty_obs_weight * novelty_obs
            + config.novelty_substrate_weight * novelty_regions;

        ema_update(&mut self.mean_obs, obs, config.novelty_ema_rate);
        ema_update(&mut self.mean_region_acts, region_acts, config.novelty_ema_rate);

        (config.gamma * task_reward + config.alpha * novelty, novelty)
    }
}
