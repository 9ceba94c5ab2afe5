//! Output value types of an optimization run.
//!
//! Everything here is a plain, serializable data structure with no further
//! behavior: downstream report formatters and UI bindings consume it as-is.
//! Instances are created fresh by each [`crate::Optimizer::optimize`] call
//! and never mutated afterwards.

use serde::Serialize;
use std::collections::HashMap;

/// The calculated allocation for one building type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingAllocation {
    pub building: String,
    pub recipe: String,
    /// Number of buildings to construct.
    pub building_count: u32,
    /// Average workers per building; fractional by design.
    pub workers_per_building: f64,
    /// Total workers assigned across all buildings of this type. After a
    /// population clamp this can be lower than what `building_count` and
    /// `workers_per_building` imply; those fields keep the unclamped
    /// sizing so reports stay auditable.
    pub total_workers: u32,
    /// Expected annual production per resource, keyed by resource name.
    pub production: HashMap<String, f64>,
    /// Expected annual consumption per resource, keyed by resource name.
    pub consumption: HashMap<String, f64>,
    /// Staffing efficiency in [0, 1].
    pub efficiency: f64,
}

/// Complete result of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub allocations: Vec<BuildingAllocation>,
    /// Total workers across all allocations (after any clamping).
    pub total_workers_needed: u32,
    /// Projected annual balance per resource name: positive = surplus,
    /// negative = deficit.
    pub resource_balance: HashMap<String, f64>,
    /// Worker-weighted mean efficiency scaled by population utilization.
    pub overall_efficiency: f64,
    pub warnings: Vec<Warning>,
}

/// Non-fatal findings collected during an optimization run. Warnings never
/// abort the run; they are surfaced on the result for the caller to
/// display or log.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum Warning {
    /// A final product's stock is below a quarter of its annual usage
    /// (roughly a three-month buffer); the deficit was added to the
    /// production target.
    #[error(
        "low stock: {resource} has only {stock:.0} units (less than 25% of annual usage); \
         adding {added:.0} to the production target"
    )]
    LowStock {
        resource: String,
        stock: f64,
        added: f64,
    },

    /// A final-product target has no producing building in the chain.
    #[error("no production method found for '{resource}'; it must be sourced externally")]
    NoProducer { resource: String },

    /// A building's worker allocation was clamped to the remaining
    /// population. `building_count` and `workers_per_building` keep their
    /// unclamped values.
    #[error(
        "population limit: {building} allocation reduced to {workers} workers \
         (needed {needed:.1})"
    )]
    PopulationClamped {
        building: String,
        workers: u32,
        needed: f64,
    },

    /// The total worker requirement exceeds the available population;
    /// production targets may not be met.
    #[error(
        "optimization requires {required} workers but only {available} available; \
         production targets may not be met"
    )]
    PopulationExceeded { required: u32, available: u32 },
}
