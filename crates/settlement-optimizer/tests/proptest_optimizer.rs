//! Property-based tests for the production optimizer.
//!
//! Uses proptest to generate random two-stage production chains, then
//! verify the arithmetic invariants of allocation and scoring.

use proptest::prelude::*;
use settlement_core::chain::{ChainBuilder, ProductionChain, RecipeEntry, ResourceDef};
use settlement_core::id::ResourceId;
use settlement_optimizer::Optimizer;

// ===========================================================================
// Generators
// ===========================================================================

/// Parameters for a random raw -> final two-stage chain.
#[derive(Debug, Clone)]
struct ChainParams {
    used_last_year: f64,
    target_surplus: f64,
    stock: f64,
    input_quantity: f64,
    output_quantity: f64,
    raw_rate: f64,
    final_rate: f64,
    raw_max_workers: u32,
    final_max_workers: u32,
    staffing_efficiency: f64,
}

fn arb_chain_params() -> impl Strategy<Value = ChainParams> {
    (
        1.0..10_000.0f64,
        0.0..1_000.0f64,
        0.0..20_000.0f64,
        0.1..10.0f64,
        0.1..10.0f64,
        0.5..500.0f64,
        0.5..500.0f64,
        1..50u32,
        1..50u32,
        0.1..1.0f64,
    )
        .prop_map(
            |(
                used_last_year,
                target_surplus,
                stock,
                input_quantity,
                output_quantity,
                raw_rate,
                final_rate,
                raw_max_workers,
                final_max_workers,
                staffing_efficiency,
            )| ChainParams {
                used_last_year,
                target_surplus,
                stock,
                input_quantity,
                output_quantity,
                raw_rate,
                final_rate,
                raw_max_workers,
                final_max_workers,
                staffing_efficiency,
            },
        )
}

fn build_chain(p: &ChainParams) -> (ProductionChain, ResourceId) {
    let mut b = ChainBuilder::new();
    let raw = b.register_resource(ResourceDef::new("Grain"));
    let food = b.register_resource(ResourceDef {
        used_last_year: p.used_last_year,
        target_surplus: p.target_surplus,
        stock: p.stock,
        is_final_product: true,
        ..ResourceDef::new("Bread")
    });
    let growing = b.register_recipe(
        "Grain Growing",
        vec![],
        vec![RecipeEntry {
            resource: raw,
            quantity: 1.0,
        }],
        p.raw_rate,
        30.0,
    );
    let baking = b.register_recipe(
        "Baking",
        vec![RecipeEntry {
            resource: raw,
            quantity: p.input_quantity,
        }],
        vec![RecipeEntry {
            resource: food,
            quantity: p.output_quantity,
        }],
        p.final_rate,
        1.0,
    );
    b.register_building("Field", p.raw_max_workers, p.staffing_efficiency, vec![growing]);
    b.register_building("Bakery", p.final_max_workers, p.staffing_efficiency, vec![baking]);
    (b.build().unwrap(), food)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    /// Building counts cover exactly the fractional worker need: never
    /// fewer buildings than the need divided by capacity, never a whole
    /// spare building.
    #[test]
    fn building_count_is_tight_ceiling(p in arb_chain_params()) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], 10_000_000).unwrap();

        for alloc in &result.allocations {
            let max_workers = chain
                .building_id(&alloc.building)
                .and_then(|id| chain.building(id))
                .map(|b| b.max_workers as f64)
                .unwrap();
            let workers_needed = alloc.workers_per_building * alloc.building_count as f64;
            let lower = (workers_needed / max_workers).ceil() as u32;
            prop_assert_eq!(alloc.building_count, lower);
            prop_assert!(workers_needed <= alloc.building_count as f64 * max_workers + 1e-6);
        }
    }

    /// With an unconstrained population, total workers round the fractional
    /// need up and never exceed it by a whole worker.
    #[test]
    fn total_workers_rounds_up(p in arb_chain_params()) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], 10_000_000).unwrap();

        prop_assert!(result.warnings.is_empty());
        for alloc in &result.allocations {
            let workers_needed = alloc.workers_per_building * alloc.building_count as f64;
            prop_assert!(alloc.total_workers as f64 >= workers_needed - 1e-6);
            prop_assert!((alloc.total_workers as f64) < workers_needed + 1.0);
        }
    }

    /// Staffing efficiency is either the scaled partial value or exactly
    /// 1.0, and the snap fires precisely at 95% of capacity.
    #[test]
    fn efficiency_matches_staffing_rule(p in arb_chain_params()) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], 10_000_000).unwrap();

        for alloc in &result.allocations {
            let max_workers = chain
                .building_id(&alloc.building)
                .and_then(|id| chain.building(id))
                .map(|b| b.max_workers as f64)
                .unwrap();
            if alloc.workers_per_building >= max_workers * 0.95 {
                prop_assert_eq!(alloc.efficiency, 1.0);
            } else {
                let expected =
                    (alloc.workers_per_building / max_workers) * p.staffing_efficiency;
                prop_assert!((alloc.efficiency - expected).abs() < 1e-9);
            }
        }
    }

    /// Allocated workers never exceed the population, whatever the chain.
    #[test]
    fn population_is_a_hard_ceiling(
        p in arb_chain_params(),
        population in 0..500u32,
    ) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], population).unwrap();
        prop_assert!(result.total_workers_needed <= population);
    }

    /// The overall score stays in [0, 1] and is zero exactly when nothing
    /// is staffed.
    #[test]
    fn overall_efficiency_bounded(
        p in arb_chain_params(),
        population in 0..500u32,
    ) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], population).unwrap();

        prop_assert!(result.overall_efficiency >= 0.0);
        prop_assert!(result.overall_efficiency <= 1.0 + 1e-9);
        if result.total_workers_needed == 0 {
            prop_assert_eq!(result.overall_efficiency, 0.0);
        }
    }

    /// Demand reaches each resource at most once, so each building is
    /// allocated at most once.
    #[test]
    fn one_allocation_per_building(p in arb_chain_params()) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], 10_000_000).unwrap();

        let mut names: Vec<&str> = result
            .allocations
            .iter()
            .map(|a| a.building.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), result.allocations.len());
    }

    /// The balance map always covers every registered resource.
    #[test]
    fn balance_covers_all_resources(
        p in arb_chain_params(),
        population in 0..500u32,
    ) {
        let (chain, food) = build_chain(&p);
        let result = Optimizer::new(&chain).optimize(&[food], population).unwrap();
        prop_assert_eq!(result.resource_balance.len(), chain.resource_count());
        prop_assert!(result.resource_balance.contains_key("Grain"));
        prop_assert!(result.resource_balance.contains_key("Bread"));
    }
}
