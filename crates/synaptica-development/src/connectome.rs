// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connectome export/import.
//!
//! The export is the substrate's only bit-level interoperability surface:
//! a JSON-shaped structure of regions plus per-(source, target)-pair
//! aggregate connections. Import rebuilds a bookkeeping-equivalent state:
//! region count, per-pair connection and synapse counts, average strength
//! and the plasticity tag/rate all round-trip exactly. Individual neuron
//! identities and per-synapse weights are not part of the contract; the
//! importer synthesizes endpoints and assigns every rebuilt synapse the
//! pair's aggregate strength.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use synaptica_neural::{
    ActivationPattern, IdAllocator, PlasticityRule, Region, RegionId, RegionKind, Result, Synapse,
    SynapseId, SynapseType, SynapticaError,
};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionExport {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: RegionKind,
}

/// Aggregate of every synapse from one region to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionExport {
    pub source: u32,
    pub target: u32,
    /// Mean synapse weight over the pair.
    pub strength: f32,
    /// Synapse count over the pair.
    pub synapses: usize,
    pub plasticity_rate: f32,
    pub plasticity_rule: PlasticityRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectomeExport {
    pub regions: Vec<RegionExport>,
    pub connections: Vec<ConnectionExport>,
}

impl ConnectomeExport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SynapticaError::InvalidArgument(format!("connectome serialization: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SynapticaError::InvalidArgument(format!("connectome parse: {}", e)))
    }
}

/// Snapshot the substrate's region and connection structure.
pub fn export_connectome(regions: &AHashMap<RegionId, Region>) -> ConnectomeExport {
    let mut region_exports: Vec<RegionExport> = regions
        .values()
        .map(|r| RegionExport {
            id: r.id().0,
            kind: r.kind(),
        })
        .collect();
    region_exports.sort_by_key(|r| r.id);

    struct PairAccum {
        weight_sum: f64,
        count: usize,
        rate: f32,
        rule: PlasticityRule,
    }
    let mut pairs: AHashMap<(RegionId, RegionId), PairAccum> = AHashMap::new();

    for region in regions.values() {
        // Resolve each arena synapse's target region: resident target
        // means internal, otherwise the outgoing bookkeeping names it.
        let mut outgoing: AHashMap<SynapseId, RegionId> = AHashMap::new();
        for (&target_region, ids) in region.output_connections() {
            for &sid in ids {
                outgoing.insert(sid, target_region);
            }
        }

        for synapse in region.synapses() {
            let target_region = if region.contains_neuron(synapse.target()) {
                region.id()
            } else {
                match outgoing.get(&synapse.id()) {
                    Some(&r) => r,
                    None => continue, // Untracked orphan; not exportable.
                }
            };
            let accum = pairs
                .entry((region.id(), target_region))
                .or_insert_with(|| PairAccum {
                    weight_sum: 0.0,
                    count: 0,
                    rate: synapse.learning_rate(),
                    rule: synapse.rule(),
                });
            accum.weight_sum += synapse.weight() as f64;
            accum.count += 1;
        }
    }

    let mut connections: Vec<ConnectionExport> = pairs
        .into_iter()
        .map(|((source, target), accum)| ConnectionExport {
            source: source.0,
            target: target.0,
            strength: (accum.weight_sum / accum.count as f64) as f32,
            synapses: accum.count,
            plasticity_rate: accum.rate,
            plasticity_rule: accum.rule,
        })
        .collect();
    connections.sort_by_key(|c| (c.source, c.target));

    ConnectomeExport {
        regions: region_exports,
        connections,
    }
}

/// Rebuild a bookkeeping-equivalent substrate from an export.
///
/// Per region, enough neurons are synthesized to carry the densest
/// incident connection (at least ceil(sqrt(synapses)) endpoints, minimum
/// one); synapse endpoints are assigned round-robin.
pub fn import_connectome(
    export: &ConnectomeExport,
    alloc: &mut IdAllocator,
) -> Result<AHashMap<RegionId, Region>> {
    let mut regions: AHashMap<RegionId, Region> = AHashMap::new();
    for entry in &export.regions {
        let id = RegionId(entry.id);
        alloc.reserve_region_id(id);
        regions.insert(
            id,
            Region::new(id, format!("region-{}", entry.id), entry.kind, ActivationPattern::Synchronous),
        );
    }

    // Size each region for the densest connection it participates in.
    let mut required: AHashMap<RegionId, usize> = AHashMap::new();
    for connection in &export.connections {
        let mut endpoints = ((connection.synapses as f64).sqrt().ceil() as usize).max(1);
        if connection.source == connection.target {
            // Internal pairs need two distinct endpoints per synapse.
            endpoints = endpoints.max(2);
        }
        for id in [RegionId(connection.source), RegionId(connection.target)] {
            let slot = required.entry(id).or_insert(1);
            *slot = (*slot).max(endpoints);
        }
    }
    let mut neuron_ids: AHashMap<RegionId, Vec<synaptica_neural::NeuronId>> = AHashMap::new();
    for (&id, &count) in &required {
        let region = regions
            .get_mut(&id)
            .ok_or(SynapticaError::RegionNotFound(id))?;
        neuron_ids.insert(id, region.create_neurons(count, alloc));
    }

    for connection in &export.connections {
        let src_region = RegionId(connection.source);
        let tgt_region = RegionId(connection.target);
        let src_neurons = neuron_ids
            .get(&src_region)
            .ok_or(SynapticaError::RegionNotFound(src_region))?
            .clone();
        let tgt_neurons = neuron_ids
            .get(&tgt_region)
            .ok_or(SynapticaError::RegionNotFound(tgt_region))?
            .clone();

        for k in 0..connection.synapses {
            let source = src_neurons[k % src_neurons.len()];
            // Offset the target cursor so an internal pair never selects
            // the same neuron for both endpoints.
            let target = if src_region == tgt_region {
                tgt_neurons[(k + 1) % tgt_neurons.len()]
            } else {
                tgt_neurons[k % tgt_neurons.len()]
            };
            if src_region == tgt_region {
                let region = regions
                    .get_mut(&src_region)
                    .ok_or(SynapticaError::RegionNotFound(src_region))?;
                // Round-robin can revisit a pair; the arena allows
                // parallel edges, so plain insertion is fine.
                region.connect_neurons(
                    source,
                    target,
                    connection.strength,
                    SynapseType::Excitatory,
                    connection.plasticity_rule,
                    connection.plasticity_rate,
                    alloc,
                )?;
            } else {
                let mut src = regions
                    .remove(&src_region)
                    .ok_or(SynapticaError::RegionNotFound(src_region))?;
                let outcome = (|| {
                    let tgt = regions
                        .get_mut(&tgt_region)
                        .ok_or(SynapticaError::RegionNotFound(tgt_region))?;
                    let synapse = Synapse::new(
                        alloc.next_synapse_id(),
                        source,
                        target,
                        connection.strength,
                        SynapseType::Excitatory,
                        connection.plasticity_rule,
                        connection.plasticity_rate,
                    );
                    let sid = synapse.id();
                    src.insert_outgoing_synapse(synapse, tgt_region)?;
                    tgt.register_incoming(sid, src_region, target)
                })();
                regions.insert(src_region, src);
                outcome?;
            }
        }
    }

    info!(
        target: "development",
        "imported connectome: {} regions, {} connections",
        export.regions.len(),
        export.connections.len()
    );
    Ok(regions)
}
