//! Settlement Core -- the production-chain data model for the settlement
//! optimizer.
//!
//! This crate provides the immutable production chain (resources, recipes,
//! buildings) and its derived producer/consumer indexes. It is pure data
//! with lookup behavior only; the optimization engine lives in the
//! `settlement-optimizer` crate and treats the chain as a read-only
//! snapshot.
//!
//! # Lifecycle
//!
//! Definitions are registered by name on a [`chain::ChainBuilder`], which
//! assigns dense ids in registration order. `build()` validates references
//! and freezes everything into a [`chain::ProductionChain`]. Registration
//! order is semantically meaningful: the producer index keeps producing
//! buildings in that order, and the optimizer always resolves a resource
//! to the *first* producer ("first producer wins").
//!
//! # Key Types
//!
//! - [`chain::ProductionChain`] -- frozen chain with the derived
//!   resource-to-producers and resource-to-consumers indexes.
//! - [`chain::ResourceDef`] / [`chain::RecipeDef`] / [`chain::BuildingDef`]
//!   -- the definition records supplied by external data entry.
//! - [`id::ResourceId`] / [`id::RecipeId`] / [`id::BuildingId`] -- dense,
//!   registration-ordered ids.
//! - [`data_loader`] (feature `data-loader`) -- JSON deserialization into
//!   a `ChainBuilder` for chains maintained in data files.

pub mod chain;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod id;
