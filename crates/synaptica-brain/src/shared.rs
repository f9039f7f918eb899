// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Thread-safe outer API.
//!
//! One coarse lock protects the whole brain. External callers may feed
//! patterns, deliver rewards and read statistics from any thread; each
//! call holds the lock briefly. A tick runs to completion under the
//! lock, so there are no suspension points inside it.

use crate::brain::{Brain, BrainState};
use crate::modality::Modality;
use crate::stats::GlobalStatistics;
use parking_lot::Mutex;
use std::sync::Arc;
use synaptica_neural::Result;
use synaptica_plasticity::LearningStats;

#[derive(Clone)]
pub struct SharedBrain {
    inner: Arc<Mutex<Brain>>,
}

impl SharedBrain {
    pub fn new(brain: Brain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(brain)),
        }
    }

    /// Run a closure with exclusive access, for anything the convenience
    /// wrappers below do not cover.
    pub fn with<R>(&self, f: impl FnOnce(&mut Brain) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn state(&self) -> BrainState {
        self.inner.lock().state()
    }

    pub fn initialize(&self) -> Result<()> {
        self.inner.lock().initialize()
    }

    pub fn start(&self) -> Result<()> {
        self.inner.lock().start()
    }

    pub fn stop(&self) -> Result<()> {
        self.inner.lock().stop()
    }

    pub fn shutdown(&self) {
        self.inner.lock().shutdown()
    }

    pub fn feed_pattern(&self, modality: Modality, pattern: &[f32]) {
        self.inner.lock().feed_pattern(modality, pattern)
    }

    pub fn deliver_reward(&self, value: f32, source: &str, context: &str) {
        self.inner.lock().deliver_reward(value, source, context)
    }

    pub fn process_step(&self, dt: f64) {
        self.inner.lock().process_step(dt)
    }

    pub fn learning_statistics(&self) -> LearningStats {
        self.inner.lock().learning_statistics().clone()
    }

    pub fn global_statistics(&self) -> GlobalStatistics {
        self.inner.lock().global_statistics()
    }
}
