//! Projected resource balance and the overall efficiency score.

use crate::result::BuildingAllocation;
use settlement_core::chain::ProductionChain;
use settlement_core::id::ResourceId;
use std::collections::HashMap;

/// Project the yearly net balance per resource under the given allocation.
///
/// Every resource in the chain appears in the map, starting at zero. Each
/// allocation's production is added and its consumption subtracted; last
/// year's consumption of each final-product target is subtracted as
/// ongoing settlement demand.
pub fn resource_balance(
    chain: &ProductionChain,
    allocations: &[BuildingAllocation],
    targets: &[ResourceId],
) -> HashMap<String, f64> {
    let mut balance: HashMap<String, f64> = chain
        .resources()
        .map(|(_, resource)| (resource.name.clone(), 0.0))
        .collect();

    for alloc in allocations {
        for (name, amount) in &alloc.production {
            *balance.entry(name.clone()).or_insert(0.0) += amount;
        }
        for (name, amount) in &alloc.consumption {
            *balance.entry(name.clone()).or_insert(0.0) -= amount;
        }
    }

    // Same filter as demand seeding: non-final targets contribute nothing.
    for &target in targets {
        let Some(resource) = chain.resource(target) else {
            continue;
        };
        if !resource.is_final_product {
            continue;
        }
        *balance.entry(resource.name.clone()).or_insert(0.0) -= resource.used_last_year;
    }

    balance
}

/// Worker-weighted mean staffing efficiency, scaled by how much of the
/// population the plan actually employs. Utilization is capped at 1.0,
/// so an over-committed allocation cannot score above fully staffed.
///
/// Returns 0.0 for an empty allocation, a zero-worker plan, or a zero
/// population.
pub fn overall_efficiency(allocations: &[BuildingAllocation], population: u32) -> f64 {
    if allocations.is_empty() || population == 0 {
        return 0.0;
    }
    let total_workers: u32 = allocations.iter().map(|a| a.total_workers).sum();
    if total_workers == 0 {
        return 0.0;
    }
    let weighted: f64 = allocations
        .iter()
        .map(|a| a.efficiency * a.total_workers as f64)
        .sum();
    let mean = weighted / total_workers as f64;
    let utilization = (total_workers as f64 / population as f64).min(1.0);
    mean * utilization
}

// ===========================================================================
// Tests
// ===========================================================================
