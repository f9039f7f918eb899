// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input modalities that can be bound to regions.

use serde::{Deserialize, Serialize};
use synaptica_neural::SynapticaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Visual,
    Audio,
    Social,
    Proprioceptive,
    Text,
    Multimodal,
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Modality::Visual => "visual",
            Modality::Audio => "audio",
            Modality::Social => "social",
            Modality::Proprioceptive => "proprioceptive",
            Modality::Text => "text",
            Modality::Multimodal => "multimodal",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Modality {
    type Err = SynapticaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "visual" => Ok(Modality::Visual),
            "audio" => Ok(Modality::Audio),
            "social" => Ok(Modality::Social),
            "proprioceptive" => Ok(Modality::Proprioceptive),
            "text" => Ok(Modality::Text),
            "multimodal" => Ok(Modality::Multimodal),
            other => Err(SynapticaError::UnknownModality(other.to_string())),
        }
    }
}
