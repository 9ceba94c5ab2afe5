//! Backward demand propagation over the recipe graph.
//!
//! Starting from the final-product targets, walks producing recipes
//! backward and accumulates the total annual demand for every reachable
//! resource. Breadth-first with a processed set: each resource is expanded
//! at most once, which guards against cycles and makes diamond-shaped
//! graphs sum their contributions correctly as long as every consumer
//! requests an input before that input is itself expanded (FIFO order
//! guarantees this).

use crate::result::Warning;
use crate::OptimizeError;
use settlement_core::chain::ProductionChain;
use settlement_core::id::ResourceId;
use std::collections::{HashMap, HashSet, VecDeque};

/// Stock below this fraction of annual usage (~3 months) triggers a
/// low-stock top-up of the production target.
const STOCK_BUFFER_FRACTION: f64 = 0.25;

/// Total annual demand per resource, with the order in which each resource
/// first received demand.
///
/// The order is load-bearing: the capacity allocator groups demand by
/// building in exactly this order, which keeps allocation deterministic.
#[derive(Debug, Clone, Default)]
pub struct DemandPlan {
    demand: HashMap<ResourceId, f64>,
    order: Vec<ResourceId>,
}

impl DemandPlan {
    /// Demand for a resource; 0.0 if the resource never received any.
    pub fn demand_for(&self, resource: ResourceId) -> f64 {
        self.demand.get(&resource).copied().unwrap_or(0.0)
    }

    /// Whether the resource appears in the plan (a zero-demand final
    /// product still does).
    pub fn contains(&self, resource: ResourceId) -> bool {
        self.demand.contains_key(&resource)
    }

    /// Entries in first-demand order.
    pub fn in_order(&self) -> impl Iterator<Item = (ResourceId, f64)> + '_ {
        self.order.iter().map(|&id| (id, self.demand_for(id)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Compute total annual demand for every resource reachable backward from
/// the final-product targets.
///
/// Targets not flagged as final products are ignored. Each seeded target
/// requires `used_last_year + target_surplus` per year, topped up when
/// stock is below the three-month buffer. A target without any producer
/// gets a [`Warning::NoProducer`]; intermediate resources without a
/// producer are silently treated as raw/external inputs.
pub fn compute(
    chain: &ProductionChain,
    targets: &[ResourceId],
) -> Result<(DemandPlan, Vec<Warning>), OptimizeError> {
    let mut plan = DemandPlan::default();
    let mut warnings = Vec::new();
    let mut queue = VecDeque::new();
    let mut seeded = HashSet::new();

    // Seed: required production = last year's usage + target surplus,
    // plus a top-up when stocks are low. Zero-demand targets still get an
    // entry so downstream reporting can show them at zero.
    for &id in targets {
        let def = chain
            .resource(id)
            .ok_or(OptimizeError::UnknownResource(id))?;
        if !def.is_final_product {
            continue;
        }

        let mut required = def.used_last_year + def.target_surplus;
        let buffer = def.used_last_year * STOCK_BUFFER_FRACTION;
        if def.stock < buffer {
            let added = buffer - def.stock;
            required += added;
            warnings.push(Warning::LowStock {
                resource: def.name.clone(),
                stock: def.stock,
                added,
            });
        }

        if plan.demand.insert(id, required).is_none() {
            plan.order.push(id);
            queue.push_back(id);
        }
        seeded.insert(id);
    }

    // Propagate backward, FIFO, expanding each resource at most once.
    let mut processed = HashSet::new();
    while let Some(id) = queue.pop_front() {
        if !processed.insert(id) {
            continue;
        }

        let Some((_, recipe_id)) = chain.first_producer(id) else {
            if seeded.contains(&id) {
                if let Some(name) = chain.resource_name(id) {
                    warnings.push(Warning::NoProducer {
                        resource: name.to_string(),
                    });
                }
            }
            // Raw/external input: a graph leaf, nothing to expand.
            continue;
        };
        let Some(recipe) = chain.recipe(recipe_id) else {
            continue;
        };
        let Some(output_per_batch) = recipe.output_quantity(id) else {
            continue;
        };
        if output_per_batch <= 0.0 {
            return Err(OptimizeError::NonPositiveOutput {
                recipe: recipe.name.clone(),
                resource: chain.resource_name(id).unwrap_or_default().to_string(),
                quantity: output_per_batch,
            });
        }

        // Demand accumulated so far, including contributions from every
        // consumer that requested this resource before now.
        let total = plan.demand_for(id);
        let batches_needed = total / output_per_batch;

        for input in &recipe.inputs {
            let added = input.quantity * batches_needed;
            match plan.demand.entry(input.resource) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    *e.get_mut() += added;
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(added);
                    plan.order.push(input.resource);
                    queue.push_back(input.resource);
                }
            }
        }
    }

    Ok((plan, warnings))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use settlement_core::chain::{ChainBuilder, ProductionChain, RecipeEntry, ResourceDef};

    fn entry(resource: ResourceId, quantity: f64) -> RecipeEntry {
        RecipeEntry { resource, quantity }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Soybean -> Tofu two-stage chain with the scenario numbers:
    /// Tofu uses 1200/yr, surplus 100, stock 500.
    fn tofu_chain(stock: f64) -> (ProductionChain, ResourceId, ResourceId) {
        let mut b = ChainBuilder::new();
        let soybean = b.register_resource(ResourceDef::new("Soybean"));
        let tofu = b.register_resource(ResourceDef {
            used_last_year: 1200.0,
            target_surplus: 100.0,
            stock,
            is_final_product: true,
            ..ResourceDef::new("Tofu")
        });
        let farming = b.register_recipe(
            "Soybean Farming",
            vec![],
            vec![entry(soybean, 1.0)],
            10.0,
            30.0,
        );
        let tofu_making = b.register_recipe(
            "Tofu Production",
            vec![entry(soybean, 2.0)],
            vec![entry(tofu, 3.0)],
            150.0,
            2.0,
        );
        b.register_building("Farm", 8, 0.95, vec![farming]);
        b.register_building("Tofu Workshop", 4, 0.9, vec![tofu_making]);
        let chain = b.build().unwrap();
        (chain, soybean, tofu)
    }

    #[test]
    fn demand_propagates_through_chain() {
        let (chain, soybean, tofu) = tofu_chain(500.0);
        let (plan, warnings) = compute(&chain, &[tofu]).unwrap();

        // Tofu: 1200 used + 100 surplus; stock 500 >= 300 buffer, no top-up.
        assert!(approx(plan.demand_for(tofu), 1300.0));
        // Soybean: 1300 / 3 batches * 2 per batch.
        assert!(approx(plan.demand_for(soybean), 1300.0 / 3.0 * 2.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn discovery_order_targets_first() {
        let (chain, soybean, tofu) = tofu_chain(500.0);
        let (plan, _) = compute(&chain, &[tofu]).unwrap();
        let order: Vec<ResourceId> = plan.in_order().map(|(id, _)| id).collect();
        assert_eq!(order, vec![tofu, soybean]);
    }

    #[test]
    fn low_stock_tops_up_demand() {
        // Stock 200 < 0.25 * 1200 = 300: deficit of 100 is added.
        let (chain, _, tofu) = tofu_chain(200.0);
        let (plan, warnings) = compute(&chain, &[tofu]).unwrap();

        assert!(approx(plan.demand_for(tofu), 1400.0));
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            Warning::LowStock {
                resource,
                stock,
                added,
            } => {
                assert_eq!(resource, "Tofu");
                assert!(approx(*stock, 200.0));
                assert!(approx(*added, 100.0));
            }
            other => panic!("expected LowStock, got: {other:?}"),
        }
    }

    #[test]
    fn zero_demand_final_product_still_seeded() {
        let mut b = ChainBuilder::new();
        let idle = b.register_resource(ResourceDef {
            is_final_product: true,
            ..ResourceDef::new("Incense")
        });
        let chain = b.build().unwrap();

        let (plan, warnings) = compute(&chain, &[idle]).unwrap();
        assert!(plan.contains(idle));
        assert!(approx(plan.demand_for(idle), 0.0));
        // No producer and it was a target, so the warning fires.
        assert!(matches!(&warnings[0], Warning::NoProducer { resource } if resource == "Incense"));
    }

    #[test]
    fn raw_inputs_are_silent_leaves() {
        // Water has no producer but is only an intermediate input: no
        // warning, demand still recorded.
        let mut b = ChainBuilder::new();
        let water = b.register_resource(ResourceDef::new("Water"));
        let ale = b.register_resource(ResourceDef {
            used_last_year: 100.0,
            stock: 1000.0,
            is_final_product: true,
            ..ResourceDef::new("Ale")
        });
        let brewing = b.register_recipe(
            "Brewing",
            vec![entry(water, 5.0)],
            vec![entry(ale, 1.0)],
            20.0,
            4.0,
        );
        b.register_building("Brewery", 6, 0.9, vec![brewing]);
        let chain = b.build().unwrap();

        let (plan, warnings) = compute(&chain, &[ale]).unwrap();
        assert!(approx(plan.demand_for(water), 500.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn non_final_targets_ignored() {
        let (chain, soybean, _) = tofu_chain(500.0);
        let (plan, warnings) = compute(&chain, &[soybean]).unwrap();
        assert!(plan.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn diamond_graph_sums_contributions() {
        // Bread and Ale both consume Grain; Grain's demand must equal the
        // sum of both contributions, and Grain is expanded only once.
        let mut b = ChainBuilder::new();
        let grain = b.register_resource(ResourceDef::new("Grain"));
        let bread = b.register_resource(ResourceDef {
            used_last_year: 300.0,
            stock: 1000.0,
            is_final_product: true,
            ..ResourceDef::new("Bread")
        });
        let ale = b.register_resource(ResourceDef {
            used_last_year: 120.0,
            stock: 1000.0,
            is_final_product: true,
            ..ResourceDef::new("Ale")
        });
        let baking = b.register_recipe(
            "Baking",
            vec![entry(grain, 2.0)],
            vec![entry(bread, 1.0)],
            60.0,
            1.0,
        );
        let brewing = b.register_recipe(
            "Brewing",
            vec![entry(grain, 3.0)],
            vec![entry(ale, 1.0)],
            30.0,
            4.0,
        );
        b.register_building("Bakery", 4, 0.9, vec![baking]);
        b.register_building("Brewery", 6, 0.9, vec![brewing]);
        let chain = b.build().unwrap();

        let (plan, _) = compute(&chain, &[bread, ale]).unwrap();
        // Bread: 300 * 2 grain; Ale: 120 * 3 grain.
        assert!(approx(plan.demand_for(grain), 600.0 + 360.0));
    }

    #[test]
    fn cyclic_recipes_terminate() {
        // Compost <-> Crop cycle: the processed set stops re-expansion.
        let mut b = ChainBuilder::new();
        let compost = b.register_resource(ResourceDef::new("Compost"));
        let crop = b.register_resource(ResourceDef {
            used_last_year: 50.0,
            stock: 100.0,
            is_final_product: true,
            ..ResourceDef::new("Crop")
        });
        let growing = b.register_recipe(
            "Growing",
            vec![entry(compost, 1.0)],
            vec![entry(crop, 2.0)],
            20.0,
            10.0,
        );
        let composting = b.register_recipe(
            "Composting",
            vec![entry(crop, 1.0)],
            vec![entry(compost, 4.0)],
            40.0,
            5.0,
        );
        b.register_building("Field", 10, 0.9, vec![growing]);
        b.register_building("Compost Yard", 2, 0.9, vec![composting]);
        let chain = b.build().unwrap();

        let (plan, _) = compute(&chain, &[crop]).unwrap();
        assert!(plan.contains(compost));
        assert!(plan.contains(crop));
    }

    #[test]
    fn zero_output_quantity_is_an_error() {
        let mut b = ChainBuilder::new();
        let dust = b.register_resource(ResourceDef {
            used_last_year: 10.0,
            stock: 100.0,
            is_final_product: true,
            ..ResourceDef::new("Dust")
        });
        let bad = b.register_recipe("Sweeping", vec![], vec![entry(dust, 0.0)], 10.0, 1.0);
        b.register_building("Hall", 2, 0.9, vec![bad]);
        let chain = b.build().unwrap();

        let result = compute(&chain, &[dust]);
        assert!(matches!(
            result,
            Err(OptimizeError::NonPositiveOutput { ref resource, .. }) if resource == "Dust"
        ));
    }

    #[test]
    fn unknown_target_is_an_error() {
        let (chain, _, _) = tofu_chain(500.0);
        let result = compute(&chain, &[ResourceId(99)]);
        assert!(matches!(result, Err(OptimizeError::UnknownResource(_))));
    }
}
