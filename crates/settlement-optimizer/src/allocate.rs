//! Worker and building allocation against a demand plan.
//!
//! Converts per-resource demand into building counts, worker counts, and
//! staffing efficiency, then applies the population ceiling sequentially
//! in demand-plan order. Two behaviors are deliberate rough edges carried
//! over from the settlement's established planning rules:
//!
//! - A building reached by demand for more than one resource keeps only
//!   the *first* (recipe, demand) pair; recipes of the same building are
//!   never merged.
//! - Clamping a building's workers to the remaining population does not
//!   recompute `building_count` or `workers_per_building`; reports show
//!   the originally computed sizing alongside the reduced worker count.

use crate::demand::DemandPlan;
use crate::result::{BuildingAllocation, Warning};
use crate::OptimizeError;
use settlement_core::chain::ProductionChain;
use settlement_core::id::{BuildingId, RecipeId};
use std::collections::HashMap;

/// At or above this fraction of capacity, staffing counts as full and
/// efficiency snaps to exactly 1.0. A hard cutoff, not a curve.
const FULL_STAFFING_THRESHOLD: f64 = 0.95;

/// Allocate buildings and workers to meet the demand plan.
///
/// Buildings are processed in the plan's first-demand order, drawing
/// sequentially from `population`; once the remainder runs out, later
/// buildings are clamped with a [`Warning::PopulationClamped`].
pub fn allocate(
    chain: &ProductionChain,
    plan: &DemandPlan,
    population: u32,
) -> Result<(Vec<BuildingAllocation>, Vec<Warning>), OptimizeError> {
    // Step A: group demand by producing building, first pair wins.
    let mut grouped: HashMap<BuildingId, (RecipeId, f64)> = HashMap::new();
    let mut group_order: Vec<BuildingId> = Vec::new();
    for (resource, amount) in plan.in_order() {
        // A negative amount means a planned drawdown covered it entirely.
        if amount <= 0.0 {
            continue;
        }
        let Some((building, recipe)) = chain.first_producer(resource) else {
            continue; // raw/external input
        };
        grouped.entry(building).or_insert_with(|| {
            group_order.push(building);
            (recipe, amount)
        });
    }

    let mut allocations = Vec::with_capacity(group_order.len());
    let mut warnings = Vec::new();
    let mut remaining_population = population;
    let mut unclamped_total: u32 = 0;

    for &building_id in &group_order {
        let Some(&(recipe_id, demand)) = grouped.get(&building_id) else {
            continue;
        };
        let Some(building) = chain.building(building_id) else {
            continue;
        };
        let Some(recipe) = chain.recipe(recipe_id) else {
            continue;
        };

        if building.max_workers == 0 {
            return Err(OptimizeError::NoWorkerCapacity {
                building: building.name.clone(),
            });
        }
        if recipe.rate_per_worker_year <= 0.0 {
            return Err(OptimizeError::NonPositiveRate {
                recipe: recipe.name.clone(),
            });
        }
        let Some(primary) = recipe.primary_output() else {
            continue;
        };
        if primary.quantity <= 0.0 {
            return Err(OptimizeError::NonPositiveOutput {
                recipe: recipe.name.clone(),
                resource: chain
                    .resource_name(primary.resource)
                    .unwrap_or_default()
                    .to_string(),
                quantity: primary.quantity,
            });
        }

        // Step B: size the building type.
        let max_workers = building.max_workers as f64;
        let workers_needed = demand / recipe.rate_per_worker_year;
        let building_count = (workers_needed / max_workers).ceil() as u32;
        let workers_per_building = workers_needed / building_count as f64;
        let mut total_workers = workers_needed.ceil() as u32;
        unclamped_total += total_workers;

        // Step C: population ceiling. The clamp leaves building_count and
        // workers_per_building at their computed values.
        if total_workers > remaining_population {
            total_workers = remaining_population;
            warnings.push(Warning::PopulationClamped {
                building: building.name.clone(),
                workers: total_workers,
                needed: workers_needed,
            });
        }
        remaining_population -= total_workers;

        // Step D: staffing efficiency with the full-staffing cutoff.
        let efficiency = if workers_per_building >= max_workers * FULL_STAFFING_THRESHOLD {
            1.0
        } else {
            (workers_per_building / max_workers) * building.partial_staffing_efficiency
        };

        // Step E: expected production/consumption, proportioned to the
        // recipe's primary output.
        let actual_production =
            total_workers as f64 * recipe.rate_per_worker_year * efficiency;
        let mut production = HashMap::with_capacity(recipe.outputs.len());
        for output in &recipe.outputs {
            if let Some(name) = chain.resource_name(output.resource) {
                production.insert(
                    name.to_string(),
                    actual_production * (output.quantity / primary.quantity),
                );
            }
        }
        let mut consumption = HashMap::with_capacity(recipe.inputs.len());
        for input in &recipe.inputs {
            if let Some(name) = chain.resource_name(input.resource) {
                consumption.insert(
                    name.to_string(),
                    actual_production * (input.quantity / primary.quantity),
                );
            }
        }

        allocations.push(BuildingAllocation {
            building: building.name.clone(),
            recipe: recipe.name.clone(),
            building_count,
            workers_per_building,
            total_workers,
            production,
            consumption,
            efficiency,
        });
    }

    if unclamped_total > population {
        warnings.push(Warning::PopulationExceeded {
            required: unclamped_total,
            available: population,
        });
    }

    Ok((allocations, warnings))
}

// ===========================================================================
// Tests
// ===========================================================================
