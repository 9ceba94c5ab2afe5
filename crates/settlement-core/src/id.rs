use serde::{Deserialize, Serialize};

/// Identifies a resource in the production chain. Cheap to copy and compare.
///
/// Ids are assigned in registration order, which makes them a stable sort
/// key: "first" always means "registered first".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Identifies a recipe in the production chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a building type in the production chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);
