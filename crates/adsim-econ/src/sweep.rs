//! Breakeven sweeps: one parameter varies, the rest stay at their live values.
//!
//! Sweeps bypass the CTR/CPC coupling. Only the live CPC control re-derives
//! CTR; a swept CPC does not.

use crate::metrics::ratio;
use adsim_core::{ParameterSet, ProfitStatus};
use serde::{Deserialize, Serialize};

/// Tested CVR values (percent): 0.5 to 5.0 in steps of 0.5.
pub const CVR_SWEEP_VALUES: [f64; 10] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];

/// Tested CPC values: 500 to 3000 in steps of 250.
pub const CPC_SWEEP_VALUES: [f64; 11] = [
    500.0, 750.0, 1000.0, 1250.0, 1500.0, 1750.0, 2000.0, 2250.0, 2500.0, 2750.0, 3000.0,
];

/// Which parameter a sweep varies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Cvr,
    Cpc,
}

impl SweepKind {
    pub fn values(self) -> &'static [f64] {
        match self {
            SweepKind::Cvr => &CVR_SWEEP_VALUES,
            SweepKind::Cpc => &CPC_SWEEP_VALUES,
        }
    }

    /// The live value this sweep is compared against.
    pub fn live_value(self, params: &ParameterSet) -> f64 {
        match self {
            SweepKind::Cvr => params.cvr,
            SweepKind::Cpc => params.cpc,
        }
    }
}

/// One tested value and its outcome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub kind: SweepKind,
    /// The tested CVR (percent) or CPC.
    pub tested: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub net_profit: f64,
    pub roas: f64,
    pub status: ProfitStatus,
}

fn row(kind: SweepKind, tested: f64, cvr: f64, cpc: f64, params: &ParameterSet) -> SweepRow {
    let clicks = ratio(params.budget, cpc);
    let conversions = clicks * (cvr / 100.0);
    let revenue = conversions * params.aov;
    let cogs = revenue * (params.cost_rate / 100.0);
    let gross_profit = revenue - cogs;
    let net_profit = gross_profit - params.budget;
    SweepRow {
        kind,
        tested,
        clicks,
        conversions,
        revenue,
        net_profit,
        roas: ratio(revenue, params.budget),
        status: ProfitStatus::from_net_profit(net_profit),
    }
}

/// One row per tested value of `kind`, everything else at its live value.
pub fn sweep(kind: SweepKind, params: &ParameterSet) -> Vec<SweepRow> {
    kind.values()
        .iter()
        .map(|&tested| match kind {
            SweepKind::Cvr => row(kind, tested, tested, params.cpc, params),
            SweepKind::Cpc => row(kind, tested, params.cvr, tested, params),
        })
        .collect()
}

/// Vary CVR at the live CPC, budget, AOV and cost rate.
pub fn cvr_sweep(params: &ParameterSet) -> Vec<SweepRow> {
    sweep(SweepKind::Cvr, params)
}

/// Vary CPC at the live CVR, budget, AOV and cost rate. CTR is not re-derived.
pub fn cpc_sweep(params: &ParameterSet) -> Vec<SweepRow> {
    sweep(SweepKind::Cpc, params)
}

/// Indices of the one or two rows whose tested value is closest to `live`.
///
/// Closest first; equal distances keep sweep order.
pub fn nearest_rows(rows: &[SweepRow], live: f64) -> Vec<usize> {
    let mut by_distance: Vec<(usize, f64)> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (i, (r.tested - live).abs()))
        .collect();
    // stable sort keeps sweep order on ties
    by_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    by_distance.into_iter().take(2).map(|(i, _)| i).collect()
}
