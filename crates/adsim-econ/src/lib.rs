#![deny(warnings)]

//! Calculation engine for the ad spend simulator.
//!
//! This crate provides pure, total functions for:
//! - Profitability metrics for a single parameter set
//! - The inverse CTR/CPC coupling used by the live controls
//! - Breakeven sweeps across CVR and CPC values
//!
//! Nothing here holds state; callers recompute on every parameter change.

pub mod coupling;
pub mod metrics;
pub mod sweep;

pub use coupling::{
    apply_cpc_change, apply_ctr_change, cpc_from_ctr, ctr_cpc_efficiency, ctr_from_cpc, CtrCpcPair,
    CPC_SENSITIVITY, CTR_SENSITIVITY,
};
pub use metrics::{
    breakeven_roas, compute_metrics, cost_structure, loss_alert, safety_level, CostStructure, LossAlert,
    SafetyLevel, SAFE_MARGIN_PCT,
};
pub use sweep::{cpc_sweep, cvr_sweep, nearest_rows, sweep, SweepKind, SweepRow, CPC_SWEEP_VALUES, CVR_SWEEP_VALUES};
