//! The production chain: resources, recipes, buildings, and the derived
//! producer/consumer indexes.
//!
//! Definitions are registered by name through [`ChainBuilder`] and frozen
//! into an immutable [`ProductionChain`] by [`ChainBuilder::build`]. The
//! chain has no `&mut self` methods, so a shared reference is a valid
//! read-only snapshot for the duration of an optimization pass.

use crate::id::{BuildingId, RecipeId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resource or product tracked by the settlement.
///
/// The stock and usage figures are maintained by external data entry
/// (persistence, yearly bookkeeping); the optimizer only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    /// Units currently in storage.
    pub stock: f64,
    /// Units consumed during the last year.
    pub used_last_year: f64,
    /// Units consumed over the settlement's lifetime.
    pub used_total: f64,
    /// Units produced during the last year.
    pub produced_last_year: f64,
    /// Units produced over the settlement's lifetime.
    pub produced_total: f64,
    /// Desired annual surplus (positive) or planned drawdown (negative).
    pub target_surplus: f64,
    /// Whether this resource is an optimization target.
    pub is_final_product: bool,
}

impl ResourceDef {
    /// A resource with zeroed bookkeeping, not flagged as a final product.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stock: 0.0,
            used_last_year: 0.0,
            used_total: 0.0,
            produced_last_year: 0.0,
            produced_total: 0.0,
            target_surplus: 0.0,
            is_final_product: false,
        }
    }
}

/// A recipe input/output entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub resource: ResourceId,
    /// Quantity consumed or produced per batch.
    pub quantity: f64,
}

/// A production recipe: inputs consumed and outputs yielded per batch.
///
/// Entry order matters: the first output is the recipe's primary output,
/// and per-allocation production/consumption is proportioned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    pub name: String,
    pub inputs: Vec<RecipeEntry>,
    pub outputs: Vec<RecipeEntry>,
    /// Units of primary output one worker produces per year.
    pub rate_per_worker_year: f64,
    /// Days to produce one batch. Informational; allocation math never
    /// reads it.
    pub production_days: f64,
}

impl RecipeDef {
    /// Whether this recipe lists `resource` among its outputs.
    pub fn produces(&self, resource: ResourceId) -> bool {
        self.outputs.iter().any(|e| e.resource == resource)
    }

    /// Output quantity per batch for `resource`, if it is an output.
    pub fn output_quantity(&self, resource: ResourceId) -> Option<f64> {
        self.outputs
            .iter()
            .find(|e| e.resource == resource)
            .map(|e| e.quantity)
    }

    /// The first-listed output. `build()` rejects recipes with no outputs,
    /// so this is always `Some` for recipes taken from a built chain.
    pub fn primary_output(&self) -> Option<&RecipeEntry> {
        self.outputs.first()
    }
}

/// A building template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    /// Worker capacity of a single building.
    pub max_workers: u32,
    /// Output penalty factor in [0, 1] applied when staffed below capacity.
    pub partial_staffing_efficiency: f64,
    /// Recipes this building can run, in priority order.
    pub recipes: Vec<RecipeId>,
}

/// Builder for constructing an immutable [`ProductionChain`].
///
/// Two-phase lifecycle: register definitions by name, then `build()` to
/// validate and freeze. `mutate_resource` lets data entry update stock and
/// usage figures between registrations.
#[derive(Debug, Default)]
pub struct ChainBuilder {
    resources: Vec<ResourceDef>,
    resource_name_to_id: HashMap<String, ResourceId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    buildings: Vec<BuildingDef>,
    building_name_to_id: HashMap<String, BuildingId>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource. Returns its id.
    pub fn register_resource(&mut self, def: ResourceDef) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resource_name_to_id.insert(def.name.clone(), id);
        self.resources.push(def);
        id
    }

    /// Register a recipe. Returns its id.
    pub fn register_recipe(
        &mut self,
        name: &str,
        inputs: Vec<RecipeEntry>,
        outputs: Vec<RecipeEntry>,
        rate_per_worker_year: f64,
        production_days: f64,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            inputs,
            outputs,
            rate_per_worker_year,
            production_days,
        });
        self.recipe_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a building template. Returns its id.
    pub fn register_building(
        &mut self,
        name: &str,
        max_workers: u32,
        partial_staffing_efficiency: f64,
        recipes: Vec<RecipeId>,
    ) -> BuildingId {
        let id = BuildingId(self.buildings.len() as u32);
        self.buildings.push(BuildingDef {
            name: name.to_string(),
            max_workers,
            partial_staffing_efficiency,
            recipes,
        });
        self.building_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Update an existing resource by name (stock, usage totals, targets).
    pub fn mutate_resource<F>(&mut self, name: &str, f: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut ResourceDef),
    {
        let id = self
            .resource_name_to_id
            .get(name)
            .ok_or_else(|| ChainError::NotFound(name.to_string()))?;
        f(&mut self.resources[id.0 as usize]);
        Ok(())
    }

    /// Lookup resource id by name.
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_name_to_id.get(name).copied()
    }

    /// Lookup recipe id by name.
    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Lookup building id by name.
    pub fn building_id(&self, name: &str) -> Option<BuildingId> {
        self.building_name_to_id.get(name).copied()
    }

    /// Validate references, build the producer/consumer indexes, and
    /// freeze the chain.
    pub fn build(self) -> Result<ProductionChain, ChainError> {
        for recipe in &self.recipes {
            if recipe.outputs.is_empty() {
                return Err(ChainError::EmptyOutputs(recipe.name.clone()));
            }
            for entry in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if entry.resource.0 as usize >= self.resources.len() {
                    return Err(ChainError::InvalidResourceRef {
                        recipe: recipe.name.clone(),
                        resource: entry.resource,
                    });
                }
            }
            check_unique(&recipe.name, &self.resources, &recipe.inputs)?;
            check_unique(&recipe.name, &self.resources, &recipe.outputs)?;
        }
        for building in &self.buildings {
            for &recipe in &building.recipes {
                if recipe.0 as usize >= self.recipes.len() {
                    return Err(ChainError::InvalidRecipeRef {
                        building: building.name.clone(),
                        recipe,
                    });
                }
            }
        }

        // Derived indexes, in building registration order. The optimizer
        // always picks the first entry, so this order is load-bearing.
        let mut producers: HashMap<ResourceId, Vec<BuildingId>> = HashMap::new();
        let mut consumers: HashMap<ResourceId, Vec<BuildingId>> = HashMap::new();
        for (idx, building) in self.buildings.iter().enumerate() {
            let building_id = BuildingId(idx as u32);
            for &recipe_id in &building.recipes {
                let recipe = &self.recipes[recipe_id.0 as usize];
                for entry in &recipe.outputs {
                    let list = producers.entry(entry.resource).or_default();
                    if !list.contains(&building_id) {
                        list.push(building_id);
                    }
                }
                for entry in &recipe.inputs {
                    let list = consumers.entry(entry.resource).or_default();
                    if !list.contains(&building_id) {
                        list.push(building_id);
                    }
                }
            }
        }

        Ok(ProductionChain {
            resources: self.resources,
            resource_name_to_id: self.resource_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            buildings: self.buildings,
            building_name_to_id: self.building_name_to_id,
            producers,
            consumers,
        })
    }
}

fn check_unique(
    recipe: &str,
    resources: &[ResourceDef],
    entries: &[RecipeEntry],
) -> Result<(), ChainError> {
    for (i, a) in entries.iter().enumerate() {
        if entries[..i].iter().any(|b| b.resource == a.resource) {
            return Err(ChainError::DuplicateEntry {
                recipe: recipe.to_string(),
                resource: resources[a.resource.0 as usize].name.clone(),
            });
        }
    }
    Ok(())
}

/// Immutable production chain. Frozen after `build()`; safe to share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionChain {
    resources: Vec<ResourceDef>,
    resource_name_to_id: HashMap<String, ResourceId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    buildings: Vec<BuildingDef>,
    building_name_to_id: HashMap<String, BuildingId>,
    producers: HashMap<ResourceId, Vec<BuildingId>>,
    consumers: HashMap<ResourceId, Vec<BuildingId>>,
}

impl ProductionChain {
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn building(&self, id: BuildingId) -> Option<&BuildingDef> {
        self.buildings.get(id.0 as usize)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn building_id(&self, name: &str) -> Option<BuildingId> {
        self.building_name_to_id.get(name).copied()
    }

    pub fn resource_name(&self, id: ResourceId) -> Option<&str> {
        self.resources.get(id.0 as usize).map(|r| r.name.as_str())
    }

    /// All resources with their ids, in registration order.
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &ResourceDef)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i as u32), r))
    }

    /// Ids of every resource flagged as a final product, in registration
    /// order.
    pub fn final_products(&self) -> Vec<ResourceId> {
        self.resources()
            .filter(|(_, r)| r.is_final_product)
            .map(|(id, _)| id)
            .collect()
    }

    /// Buildings that produce `resource`, in registration order. Empty for
    /// raw/external resources.
    pub fn producers_of(&self, resource: ResourceId) -> &[BuildingId] {
        self.producers.get(&resource).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buildings that consume `resource`, in registration order.
    pub fn consumers_of(&self, resource: ResourceId) -> &[BuildingId] {
        self.consumers.get(&resource).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve `resource` to a producer using the deterministic
    /// single-producer rule: the first producing building in registration
    /// order, and the first of its recipes whose outputs include the
    /// resource. Returns `None` for raw/external resources.
    pub fn first_producer(&self, resource: ResourceId) -> Option<(BuildingId, RecipeId)> {
        let building_id = *self.producers_of(resource).first()?;
        let building = self.building(building_id)?;
        let recipe_id = building
            .recipes
            .iter()
            .copied()
            .find(|&id| self.recipe(id).is_some_and(|r| r.produces(resource)))?;
        Some((building_id, recipe_id))
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("recipe '{recipe}' references unregistered resource {resource:?}")]
    InvalidResourceRef { recipe: String, resource: ResourceId },
    #[error("building '{building}' references unregistered recipe {recipe:?}")]
    InvalidRecipeRef { building: String, recipe: RecipeId },
    #[error("recipe '{recipe}' lists '{resource}' more than once")]
    DuplicateEntry { recipe: String, resource: String },
    #[error("recipe '{0}' has no outputs and cannot be a producer")]
    EmptyOutputs(String),
}
