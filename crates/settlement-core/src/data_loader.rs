//! Data-driven chain loading from JSON.
//!
//! Feature-gated behind `data-loader`. Provides JSON deserialization into
//! [`ChainBuilder`] for settlement data maintained in data files, with
//! recipe and building entries referencing resources by name.

use crate::chain::{ChainBuilder, ChainError, RecipeEntry, ResourceDef};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("unknown resource reference: {0}")]
    UnknownResourceRef(String),
    #[error("unknown recipe reference: {0}")]
    UnknownRecipeRef(String),
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level chain data structure for JSON deserialization.
#[derive(Debug, serde::Deserialize)]
pub struct ChainData {
    #[serde(default)]
    pub resources: Vec<ResourceData>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
}

/// JSON representation of a resource.
#[derive(Debug, serde::Deserialize)]
pub struct ResourceData {
    pub name: String,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub used_last_year: f64,
    #[serde(default)]
    pub used_total: f64,
    #[serde(default)]
    pub produced_last_year: f64,
    #[serde(default)]
    pub produced_total: f64,
    #[serde(default)]
    pub target_surplus: f64,
    #[serde(default)]
    pub final_product: bool,
}

/// JSON representation of a recipe.
#[derive(Debug, serde::Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<EntryData>,
    #[serde(default)]
    pub outputs: Vec<EntryData>,
    pub rate_per_worker_year: f64,
    #[serde(default)]
    pub production_days: f64,
}

/// JSON representation of a recipe input/output entry.
#[derive(Debug, serde::Deserialize)]
pub struct EntryData {
    pub resource: String, // references resource by name
    pub quantity: f64,
}

/// JSON representation of a building template.
#[derive(Debug, serde::Deserialize)]
pub struct BuildingData {
    pub name: String,
    pub max_workers: u32,
    #[serde(default = "default_staffing_efficiency")]
    pub partial_staffing_efficiency: f64,
    #[serde(default)]
    pub recipes: Vec<String>, // references recipes by name
}

fn default_staffing_efficiency() -> f64 {
    0.9
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a chain builder from a JSON string.
pub fn load_chain_json(json: &str) -> Result<ChainBuilder, DataLoadError> {
    let data: ChainData = serde_json::from_str(json)?;
    build_chain(data)
}

/// Load a chain builder from JSON bytes.
pub fn load_chain_json_bytes(bytes: &[u8]) -> Result<ChainBuilder, DataLoadError> {
    let data: ChainData = serde_json::from_slice(bytes)?;
    build_chain(data)
}

fn build_chain(data: ChainData) -> Result<ChainBuilder, DataLoadError> {
    let mut builder = ChainBuilder::new();

    // Phase 1: Register all resources
    for resource in &data.resources {
        builder.register_resource(ResourceDef {
            name: resource.name.clone(),
            stock: resource.stock,
            used_last_year: resource.used_last_year,
            used_total: resource.used_total,
            produced_last_year: resource.produced_last_year,
            produced_total: resource.produced_total,
            target_surplus: resource.target_surplus,
            is_final_product: resource.final_product,
        });
    }

    // Phase 2: Register all recipes (resolve resource refs by name)
    for recipe in &data.recipes {
        let inputs = resolve_entries(&builder, &recipe.inputs)?;
        let outputs = resolve_entries(&builder, &recipe.outputs)?;
        builder.register_recipe(
            &recipe.name,
            inputs,
            outputs,
            recipe.rate_per_worker_year,
            recipe.production_days,
        );
    }

    // Phase 3: Register all buildings (resolve recipe refs by name)
    for building in &data.buildings {
        let mut recipes = Vec::with_capacity(building.recipes.len());
        for name in &building.recipes {
            let id = builder
                .recipe_id(name)
                .ok_or_else(|| DataLoadError::UnknownRecipeRef(name.clone()))?;
            recipes.push(id);
        }
        builder.register_building(
            &building.name,
            building.max_workers,
            building.partial_staffing_efficiency,
            recipes,
        );
    }

    Ok(builder)
}

fn resolve_entries(
    builder: &ChainBuilder,
    entries: &[EntryData],
) -> Result<Vec<RecipeEntry>, DataLoadError> {
    entries
        .iter()
        .map(|entry| {
            let resource = builder
                .resource_id(&entry.resource)
                .ok_or_else(|| DataLoadError::UnknownResourceRef(entry.resource.clone()))?;
            Ok(RecipeEntry {
                resource,
                quantity: entry.quantity,
            })
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
