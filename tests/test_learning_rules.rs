// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end learning-rule behavior through the public Brain API.

use synaptica::prelude::*;

fn running_brain(config: LearningConfig) -> Brain {
    let mut brain = Brain::with_seed(config, 1234).unwrap();
    brain.initialize().unwrap();
    brain.start().unwrap();
    brain
}

#[test]
fn two_neuron_hebbian_potentiation() {
    let mut brain = running_brain(LearningConfig::default());
    let region = brain
        .create_region("cortex", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 2).unwrap();
    let sid = brain
        .connect_neurons(
            region,
            ids[0],
            ids[1],
            0.1,
            SynapseType::Excitatory,
            PlasticityRule::Hebbian,
            0.05,
        )
        .unwrap();

    for &id in &ids {
        brain
            .region_mut(region)
            .unwrap()
            .neuron_mut(id)
            .unwrap()
            .set_activation(1.0);
    }

    let committed = brain.apply_hebbian_learning(region, 0.05).unwrap();
    assert_eq!(committed, 1);

    let w = brain.region(region).unwrap().synapse(sid).unwrap().weight();
    assert!((w - 0.15).abs() < 1e-6, "w = {}", w);

    let stats = brain.learning_statistics();
    assert_eq!(stats.hebbian_updates, 1);
    assert_eq!(
        stats.total_updates,
        stats.hebbian_updates + stats.stdp_updates + stats.reward_updates
            + stats.decay_updates
            + stats.homeostasis_updates
    );
}

#[test]
fn stdp_ltp_ltd_pair() {
    let config = LearningConfig {
        stdp_rate: 0.05,
        stdp_rate_multiplier: 1.0,
        hebbian_rate: 0.0,
        ..Default::default()
    };
    let mut brain = running_brain(config);
    let region = brain
        .create_region("cortex", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 4).unwrap();
    let ltp = brain
        .connect_neurons(region, ids[0], ids[1], 0.5, SynapseType::Excitatory, PlasticityRule::Stdp, 0.05)
        .unwrap();
    let ltd = brain
        .connect_neurons(region, ids[2], ids[3], 0.5, SynapseType::Excitatory, PlasticityRule::Stdp, 0.05)
        .unwrap();

    // Pre-before-post on the LTP pair, post-before-pre on the LTD pair.
    brain.record_spike(ids[0], 100.0);
    brain.record_spike(ids[1], 110.0);
    brain.record_spike(ids[2], 110.0);
    brain.record_spike(ids[3], 100.0);
    brain.apply_stdp(region).unwrap();

    let w_ltp = brain.region(region).unwrap().synapse(ltp).unwrap().weight();
    let w_ltd = brain.region(region).unwrap().synapse(ltd).unwrap().weight();
    let magnitude = 0.05 * (-0.5f64).exp() as f32; // ~= 0.0303

    assert!(w_ltp > w_ltd);
    assert!((w_ltp - (0.5 + magnitude)).abs() < 1e-5, "ltp = {}", w_ltp);
    assert!((w_ltd - (0.5 - magnitude)).abs() < 1e-5, "ltd = {}", w_ltd);
}

#[test]
fn stdp_magnitude_scales_with_rate_and_multiplier() {
    let weights: Vec<f32> = [(0.05f32, 1.0f32), (0.10, 1.0), (0.05, 2.0)]
        .iter()
        .map(|&(rate, multiplier)| {
            let config = LearningConfig {
                stdp_rate: rate,
                stdp_rate_multiplier: multiplier,
                hebbian_rate: 0.0,
                ..Default::default()
            };
            let mut brain = running_brain(config);
            let region = brain
                .create_region("r", RegionKind::Cortical, ActivationPattern::Synchronous)
                .unwrap();
            let ids = brain.create_neurons(region, 2).unwrap();
            let sid = brain
                .connect_neurons(region, ids[0], ids[1], 0.5, SynapseType::Excitatory, PlasticityRule::Stdp, rate)
                .unwrap();
            brain.record_spike(ids[0], 100.0);
            brain.record_spike(ids[1], 110.0);
            brain.apply_stdp(region).unwrap();
            brain.region(region).unwrap().synapse(sid).unwrap().weight()
        })
        .collect();

    let base_delta = weights[0] - 0.5;
    // Doubling the rate or the multiplier doubles the delta.
    assert!(((weights[1] - 0.5) - 2.0 * base_delta).abs() < 0.05 * base_delta);
    assert!(((weights[2] - 0.5) - 2.0 * base_delta).abs() < 0.05 * base_delta);
}

#[test]
fn spike_pair_drives_stdp_exactly_once() {
    let config = LearningConfig {
        stdp_rate: 0.05,
        hebbian_rate: 0.0,
        decay_rate: 0.0,
        ..Default::default()
    };
    let mut brain = running_brain(config);
    let region = brain
        .create_region("r", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 2).unwrap();
    let sid = brain
        .connect_neurons(region, ids[0], ids[1], 0.5, SynapseType::Excitatory, PlasticityRule::Stdp, 0.05)
        .unwrap();

    brain.record_spike(ids[0], 100.0);
    brain.record_spike(ids[1], 110.0);
    brain.process_step(0.01);
    let w_after_pair = brain.region(region).unwrap().synapse(sid).unwrap().weight();
    assert!(w_after_pair > 0.5);

    // Activity-free ticks must not re-apply the spent pair.
    for _ in 0..100 {
        brain.process_step(0.01);
    }
    let w_final = brain.region(region).unwrap().synapse(sid).unwrap().weight();
    assert_eq!(w_final, w_after_pair);
    assert_eq!(brain.learning_statistics().stdp_updates, 1);
}

#[test]
fn reward_distribution_with_eligibility() {
    let config = LearningConfig {
        kappa: 0.2,
        lambda: 0.9,
        eta_elig: 1.0,
        global_learning_rate: 0.01,
        hebbian_rate: 0.0,
        stdp_rate: 0.0,
        decay_rate: 0.0,
        ..Default::default()
    };
    let mut brain = running_brain(config);
    let region = brain
        .create_region("r", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 2).unwrap();
    let sid = brain
        .connect_neurons(
            region,
            ids[0],
            ids[1],
            0.5,
            SynapseType::Excitatory,
            PlasticityRule::RewardModulated,
            0.0,
        )
        .unwrap();

    brain.note_pre_post(region, sid, 1.0, 1.0).unwrap();
    brain.deliver_reward(0.5, "phase_a", "{}");
    brain.process_step(0.01);

    // dw = kappa * R * e * global_learning_rate = 0.2 * 0.5 * 1.0 * 0.01.
    let w = brain.region(region).unwrap().synapse(sid).unwrap().weight();
    assert!((w - 0.501).abs() < 1e-6, "w = {}", w);
}

#[test]
fn reward_deltas_are_proportional_to_eligibility() {
    let config = LearningConfig {
        kappa: 0.2,
        lambda: 0.9,
        eta_elig: 1.0,
        global_learning_rate: 0.01,
        hebbian_rate: 0.0,
        stdp_rate: 0.0,
        ..Default::default()
    };
    let mut brain = running_brain(config);
    let region = brain
        .create_region("r", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 4).unwrap();
    let s1 = brain
        .connect_neurons(region, ids[0], ids[1], 0.5, SynapseType::Excitatory, PlasticityRule::RewardModulated, 0.0)
        .unwrap();
    let s2 = brain
        .connect_neurons(region, ids[2], ids[3], 0.5, SynapseType::Excitatory, PlasticityRule::RewardModulated, 0.0)
        .unwrap();

    brain.note_pre_post(region, s1, 0.5, 1.0).unwrap(); // e1 = 0.5
    brain.note_pre_post(region, s2, 1.0, 1.0).unwrap(); // e2 = 1.0
    brain.deliver_reward(1.0, "task", "");
    brain.process_step(0.01);

    let d1 = brain.region(region).unwrap().synapse(s1).unwrap().weight() - 0.5;
    let d2 = brain.region(region).unwrap().synapse(s2).unwrap().weight() - 0.5;
    assert!((d1 / d2 - 0.5).abs() < 1e-4, "d1 = {}, d2 = {}", d1, d2);
}

#[test]
fn weights_stay_clamped_through_plasticity() {
    let mut brain = running_brain(LearningConfig::default());
    let region = brain
        .create_region("r", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 2).unwrap();
    let sid = brain
        .connect_neurons(region, ids[0], ids[1], 1.95, SynapseType::Excitatory, PlasticityRule::Hebbian, 1.0)
        .unwrap();
    for &id in &ids {
        brain
            .region_mut(region)
            .unwrap()
            .neuron_mut(id)
            .unwrap()
            .set_activation(1.0);
    }

    brain.apply_hebbian_learning(region, 1.0).unwrap();
    let w = brain.region(region).unwrap().synapse(sid).unwrap().weight();
    assert_eq!(w, 2.0);
}

#[test]
fn counters_never_decrease_across_ticks() {
    let mut brain = running_brain(LearningConfig::default());
    let region = brain
        .create_region("r", RegionKind::Cortical, ActivationPattern::Synchronous)
        .unwrap();
    let ids = brain.create_neurons(region, 4).unwrap();
    for pair in ids.windows(2) {
        brain
            .connect_neurons(region, pair[0], pair[1], 0.3, SynapseType::Excitatory, PlasticityRule::Hebbian, 0.01)
            .unwrap();
    }

    let mut last_total = 0;
    for i in 0..10 {
        brain.feed_pattern(Modality::Visual, &[0.5]); // Unbound: counted no-op.
        brain
            .region_mut(region)
            .unwrap()
            .neuron_mut(ids[0])
            .unwrap()
            .set_activation(0.5 + 0.05 * i as f32);
        brain.process_step(0.01);
        let total = brain.learning_statistics().total_updates;
        assert!(total >= last_total);
        last_total = total;
    }
}
