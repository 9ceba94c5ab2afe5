//! Tofu supply chain example: demand propagation, allocation, and scoring.
//!
//! Builds the classic two-stage chain (soybeans grown on farms, tofu made
//! in workshops) and runs the optimizer under three conditions: a roomy
//! population, a labor shortage, and depleted tofu stock.
//!
//! Run with: `cargo run -p settlement-optimizer --example tofu_chain`

use settlement_core::chain::{ChainBuilder, ProductionChain, RecipeEntry, ResourceDef};
use settlement_core::id::ResourceId;
use settlement_optimizer::{OptimizationResult, Optimizer};

fn build_chain(tofu_stock: f64) -> (ProductionChain, ResourceId) {
    let mut b = ChainBuilder::new();

    let soybean = b.register_resource(ResourceDef::new("Soybean"));
    let tofu = b.register_resource(ResourceDef {
        used_last_year: 1200.0,
        target_surplus: 100.0,
        stock: tofu_stock,
        is_final_product: true,
        ..ResourceDef::new("Tofu")
    });

    let farming = b.register_recipe(
        "Soybean Farming",
        vec![],
        vec![RecipeEntry {
            resource: soybean,
            quantity: 1.0,
        }],
        10.0, // units per worker-year
        30.0, // growing season in days
    );
    let tofu_making = b.register_recipe(
        "Tofu Production",
        vec![RecipeEntry {
            resource: soybean,
            quantity: 2.0,
        }],
        vec![RecipeEntry {
            resource: tofu,
            quantity: 3.0,
        }],
        150.0,
        2.0,
    );

    b.register_building("Farm", 8, 0.95, vec![farming]);
    b.register_building("Tofu Workshop", 4, 0.9, vec![tofu_making]);

    let chain = b.build().unwrap();
    (chain, tofu)
}

fn print_result(result: &OptimizationResult) {
    for alloc in &result.allocations {
        println!(
            "  {} x{} ({}): {} workers, {:.1} per building, efficiency {:.2}",
            alloc.building,
            alloc.building_count,
            alloc.recipe,
            alloc.total_workers,
            alloc.workers_per_building,
            alloc.efficiency,
        );
    }
    println!("  total workers: {}", result.total_workers_needed);
    println!("  overall efficiency: {:.3}", result.overall_efficiency);

    let mut balance: Vec<_> = result.resource_balance.iter().collect();
    balance.sort_by(|a, b| a.0.cmp(b.0));
    for (name, net) in balance {
        println!("  balance {name}: {net:+.1}/year");
    }
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    println!();
}

fn main() {
    // --- Scenario 1: Plenty of people ---

    println!("=== Scenario 1: Population 96, healthy stock ===\n");
    let (chain, tofu) = build_chain(500.0);
    let result = Optimizer::new(&chain).optimize(&[tofu], 96).unwrap();
    print_result(&result);

    // --- Scenario 2: Labor shortage ---

    println!("=== Scenario 2: Population 50 (not enough hands) ===\n");
    let result = Optimizer::new(&chain).optimize(&[tofu], 50).unwrap();
    print_result(&result);

    // --- Scenario 3: Depleted stock ---

    println!("=== Scenario 3: Tofu stock down to 200 ===\n");
    let (chain, tofu) = build_chain(200.0);
    let result = Optimizer::new(&chain).optimize(&[tofu], 120).unwrap();
    print_result(&result);
}
