//! Production Optimizer for settlement supply chains.
//!
//! Given a [`ProductionChain`](settlement_core::chain::ProductionChain), a
//! set of target final products, and an available population, computes a
//! yearly production plan: how many buildings of each type to run, how many
//! workers to assign, the staffing efficiency that falls out of the
//! assignment, and the projected net balance per resource.
//!
//! # Pipeline
//!
//! An optimization run proceeds in three stages, one module each:
//!
//! 1. [`demand`] -- Backward chaining from the targets through recipe
//!    inputs, producing a per-resource demand plan in discovery order.
//! 2. [`allocate`] -- Sizing buildings and assigning workers against the
//!    demand, drawing sequentially from the population.
//! 3. [`balance`] -- Netting expected production against consumption and
//!    ongoing settlement demand, plus the overall efficiency score.
//!
//! # Usage
//!
//! ```rust,ignore
//! use settlement_optimizer::Optimizer;
//!
//! let optimizer = Optimizer::new(&chain);
//! let result = optimizer.optimize(&[tofu], 96)?;
//! println!("efficiency: {:.2}", result.overall_efficiency);
//! ```
//!
//! Non-fatal conditions (low stock top-ups, missing producers, population
//! clamps) surface as [`Warning`]s on the result; malformed chain data
//! (zero-capacity buildings, non-positive rates or output quantities)
//! aborts the run with an [`OptimizeError`].

pub mod allocate;
pub mod balance;
pub mod demand;
pub mod result;

pub use demand::DemandPlan;
pub use result::{BuildingAllocation, OptimizationResult, Warning};

use settlement_core::chain::ProductionChain;
use settlement_core::id::ResourceId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort an optimization run.
///
/// All of these indicate malformed chain data rather than an infeasible
/// plan; infeasibility (not enough people, no producer for a target) is
/// reported through [`Warning`]s instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    /// A target resource id is not registered in the chain.
    #[error("unknown resource id: {0:?}")]
    UnknownResource(ResourceId),

    /// A recipe on the demand path outputs a non-positive quantity of the
    /// demanded resource, so batch counts cannot be derived.
    #[error("recipe '{recipe}' outputs {quantity} of '{resource}' per batch")]
    NonPositiveOutput {
        recipe: String,
        resource: String,
        quantity: f64,
    },

    /// A building on the demand path has `max_workers == 0`.
    #[error("building '{building}' has no worker capacity")]
    NoWorkerCapacity { building: String },

    /// A recipe on the demand path has a non-positive yearly rate.
    #[error("recipe '{recipe}' has a non-positive production rate")]
    NonPositiveRate { recipe: String },
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Orchestrates a full optimization run over a frozen production chain.
pub struct Optimizer<'a> {
    chain: &'a ProductionChain,
}

impl<'a> Optimizer<'a> {
    pub fn new(chain: &'a ProductionChain) -> Self {
        Self { chain }
    }

    /// Compute a production plan for `targets` with `population` workers.
    ///
    /// Targets that are not final products are skipped. The result's
    /// allocations appear in the order demand first reached each building,
    /// which is deterministic for a given chain and target list.
    pub fn optimize(
        &self,
        targets: &[ResourceId],
        population: u32,
    ) -> Result<OptimizationResult, OptimizeError> {
        let (plan, mut warnings) = demand::compute(self.chain, targets)?;
        let (allocations, alloc_warnings) = allocate::allocate(self.chain, &plan, population)?;
        warnings.extend(alloc_warnings);

        let resource_balance = balance::resource_balance(self.chain, &allocations, targets);
        let overall_efficiency = balance::overall_efficiency(&allocations, population);
        let total_workers_needed = allocations.iter().map(|a| a.total_workers).sum();

        Ok(OptimizationResult {
            allocations,
            total_workers_needed,
            resource_balance,
            overall_efficiency,
            warnings,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
