// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighing records, one per trailer load cycle.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// One trailer load for a field: weighed full on arrival, weighed empty
/// after unloading.
///
/// Weights are kilograms. A record is *finalized* exactly when the empty
/// weight has been set; until then it contributes nothing to totals.
/// Quality metrics are optional per-load measurements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weighing {
    pub trailer_name: String,

    /// Gross weight in kg.
    pub full: f64,

    /// Empty weight in kg, set on finalization.
    pub empty: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bale_count: Option<u32>,

    /// Relative humidity in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    /// Protein content in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,

    /// Specific weight in kg/hl.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: Timestamp,
}

impl Weighing {
    /// Create an unfinalized record from the full weighing.
    pub fn new(trailer_name: impl Into<String>, full: f64, created_at: Timestamp) -> Self {
        Self {
            trailer_name: trailer_name.into(),
            full,
            empty: None,
            bale_count: None,
            humidity: None,
            protein: None,
            specific_weight: None,
            note: None,
            created_at,
        }
    }

    /// Whether the empty weight has been recorded.
    pub fn is_finalized(&self) -> bool {
        matches!(self.empty, Some(empty) if empty > 0.0)
    }

    /// Net weight in kg, defined only when both weights are present and
    /// positive.
    pub fn net_weight(&self) -> Option<f64> {
        match self.empty {
            Some(empty) if empty > 0.0 && self.full > 0.0 => Some(self.full - empty),
            _ => None,
        }
    }
}
