//! Single-point profitability metrics.

use adsim_core::{MetricsRecord, ParameterSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Division that resolves degenerate denominators to 0.
///
/// A zero or non-finite denominator, or a non-finite quotient, yields 0.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() {
        return 0.0;
    }
    let q = num / den;
    if q.is_finite() {
        q
    } else {
        0.0
    }
}

/// ROAS at which net profit is exactly zero: `1 / (1 - cost_rate/100)`.
///
/// Depends only on the cost rate. Returns 0 at `cost_rate = 100`.
pub fn breakeven_roas(cost_rate: f64) -> f64 {
    ratio(1.0, 1.0 - cost_rate / 100.0)
}

/// Compute the full metric set for `params`.
///
/// Total and pure: identical inputs give bit-identical outputs and no field
/// is ever NaN or infinite.
///
/// Example:
/// let m = compute_metrics(&ParameterSet::default());
/// assert_eq!(m.roas, 3.0);
pub fn compute_metrics(params: &ParameterSet) -> MetricsRecord {
    let cvr = params.cvr / 100.0;
    let ctr = params.ctr / 100.0;
    let cost_rate = params.cost_rate / 100.0;

    let clicks = ratio(params.budget, params.cpc);
    let impressions = ratio(clicks, ctr);
    let conversions = clicks * cvr;
    let revenue = conversions * params.aov;
    let roas = ratio(revenue, params.budget);

    let cpa = if conversions > 0.0 {
        ratio(params.budget, conversions)
    } else {
        0.0
    };
    let cpm = if impressions > 0.0 {
        ratio(params.budget, impressions) * 1000.0
    } else {
        0.0
    };

    let cogs = revenue * cost_rate;
    let gross_profit = revenue - cogs;
    let gross_margin = ratio(gross_profit, revenue) * 100.0;
    let net_profit = gross_profit - params.budget;
    let net_margin = ratio(net_profit, revenue) * 100.0;
    let roi = ratio(net_profit, params.budget) * 100.0;

    let breakeven_roas = breakeven_roas(params.cost_rate);
    let safety_margin = ratio(roas - breakeven_roas, breakeven_roas) * 100.0;

    MetricsRecord {
        clicks,
        impressions,
        conversions,
        revenue,
        roas,
        cpc: params.cpc,
        cpa,
        cpm,
        cogs,
        gross_profit,
        gross_margin,
        net_profit,
        net_margin,
        roi,
        breakeven_roas,
        safety_margin,
    }
}

/// How revenue splits between cost of goods, ad spend and what is left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostStructure {
    pub cogs: f64,
    pub ad_spend: f64,
    /// Net profit floored at 0; a loss shows up as an empty slice.
    pub net_profit: f64,
}

impl CostStructure {
    pub fn total(&self) -> f64 {
        self.cogs + self.ad_spend + self.net_profit
    }

    /// Shares of [`total`](Self::total) in percent, in field order.
    pub fn shares(&self) -> [f64; 3] {
        let total = self.total();
        [
            ratio(self.cogs, total) * 100.0,
            ratio(self.ad_spend, total) * 100.0,
            ratio(self.net_profit, total) * 100.0,
        ]
    }
}

pub fn cost_structure(params: &ParameterSet, metrics: &MetricsRecord) -> CostStructure {
    CostStructure {
        cogs: metrics.cogs,
        ad_spend: params.budget,
        net_profit: metrics.net_profit.max(0.0),
    }
}

/// Raised when the campaign loses money at the current parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LossAlert {
    pub actual_roas: f64,
    pub required_roas: f64,
    pub net_profit: f64,
}

pub fn loss_alert(metrics: &MetricsRecord) -> Option<LossAlert> {
    if metrics.net_profit >= 0.0 {
        return None;
    }
    Some(LossAlert {
        actual_roas: metrics.roas,
        required_roas: metrics.breakeven_roas,
        net_profit: metrics.net_profit,
    })
}

/// Safety margin (percent) at or above which the campaign counts as safe.
pub const SAFE_MARGIN_PCT: f64 = 20.0;

/// Headroom band of the safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// Margin of at least [`SAFE_MARGIN_PCT`].
    Safe,
    /// Profitable but thin: `0 <= margin < SAFE_MARGIN_PCT`.
    Caution,
    /// Below breakeven.
    Danger,
}

impl SafetyLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            SafetyLevel::Safe => "safe",
            SafetyLevel::Caution => "caution",
            SafetyLevel::Danger => "danger",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn safety_level(metrics: &MetricsRecord) -> SafetyLevel {
    let margin = metrics.safety_margin;
    if margin >= SAFE_MARGIN_PCT {
        SafetyLevel::Safe
    } else if margin >= 0.0 {
        SafetyLevel::Caution
    } else {
        SafetyLevel::Danger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsim_core::{ParameterField, ProfitStatus};
    use proptest::prelude::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn default_campaign_matches_worked_example() {
        let m = compute_metrics(&ParameterSet::default());
        assert_eq!(m.clicks, 5000.0);
        assert!(close(m.impressions, 333_333.333, 0.001));
        assert_eq!(m.conversions, 100.0);
        assert_eq!(m.revenue, 15_000_000.0);
        assert_eq!(m.roas, 3.0);
        assert_eq!(m.cogs, 4_500_000.0);
        assert_eq!(m.gross_profit, 10_500_000.0);
        assert_eq!(m.net_profit, 5_500_000.0);
        assert!(close(m.roi, 110.0, 1e-9));
        assert!(close(m.breakeven_roas, 1.428_571, 1e-6));
        assert!(close(m.safety_margin, 110.0, 1e-9));
        assert_eq!(m.cpa, 50_000.0);
        assert!(close(m.cpm, 15_000.0, 1e-6));
        assert!(close(m.gross_margin, 70.0, 1e-9));
        assert!(close(m.net_margin, 36.666_666, 1e-5));
        assert_eq!(m.status(), ProfitStatus::Profit);
    }

    #[test]
    fn degenerate_denominators_resolve_to_zero() {
        let p = ParameterSet {
            cvr: 0.0,
            ctr: 0.0,
            cpc: 0.0,
            budget: 0.0,
            aov: 0.0,
            cost_rate: 100.0,
        };
        let m = compute_metrics(&p);
        assert!(m.is_finite());
        assert_eq!(m.clicks, 0.0);
        assert_eq!(m.impressions, 0.0);
        assert_eq!(m.cpa, 0.0);
        assert_eq!(m.cpm, 0.0);
        assert_eq!(m.roas, 0.0);
        assert_eq!(m.roi, 0.0);
        assert_eq!(m.breakeven_roas, 0.0);
        assert_eq!(m.safety_margin, 0.0);
    }

    #[test]
    fn zero_conversions_zero_cpa_and_margins() {
        let p = ParameterSet {
            cvr: 0.0,
            ..ParameterSet::default()
        };
        let m = compute_metrics(&p);
        assert_eq!(m.conversions, 0.0);
        assert_eq!(m.cpa, 0.0);
        assert_eq!(m.gross_margin, 0.0);
        assert_eq!(m.net_margin, 0.0);
        assert_eq!(m.net_profit, -p.budget);
        assert_eq!(m.status(), ProfitStatus::Loss);
    }

    #[test]
    fn cost_structure_floors_loss() {
        let p = ParameterSet {
            cvr: 0.5,
            ..ParameterSet::default()
        };
        let m = compute_metrics(&p);
        assert!(m.net_profit < 0.0);
        let cs = cost_structure(&p, &m);
        assert_eq!(cs.net_profit, 0.0);
        assert_eq!(cs.ad_spend, p.budget);
        let alert = loss_alert(&m).unwrap();
        assert_eq!(alert.required_roas, m.breakeven_roas);
        assert!(alert.actual_roas < alert.required_roas);
    }

    #[test]
    fn cost_structure_shares_sum_to_hundred() {
        let p = ParameterSet::default();
        let cs = cost_structure(&p, &compute_metrics(&p));
        let sum: f64 = cs.shares().iter().sum();
        assert!(close(sum, 100.0, 1e-9));
        assert!(loss_alert(&compute_metrics(&p)).is_none());
    }

    fn with_margin(safety_margin: f64) -> MetricsRecord {
        MetricsRecord {
            safety_margin,
            ..compute_metrics(&ParameterSet::default())
        }
    }

    #[test]
    fn safety_band_edges() {
        assert_eq!(safety_level(&with_margin(20.0)), SafetyLevel::Safe);
        assert_eq!(safety_level(&with_margin(19.999)), SafetyLevel::Caution);
        assert_eq!(safety_level(&with_margin(0.0)), SafetyLevel::Caution);
        assert_eq!(safety_level(&with_margin(-1e-9)), SafetyLevel::Danger);
        assert_eq!(safety_level(&with_margin(-40.0)), SafetyLevel::Danger);
    }

    #[test]
    fn safety_band_for_campaigns() {
        // defaults: ROAS 3.0 against breakeven 1/0.7, margin 110%
        let p = ParameterSet::default();
        assert_eq!(safety_level(&compute_metrics(&p)), SafetyLevel::Safe);
        // ROAS 1.5 against 1.4286: margin 5%
        let thin = ParameterSet { cvr: 1.0, ..p };
        let m = compute_metrics(&thin);
        assert!(m.net_profit > 0.0 && m.safety_margin < SAFE_MARGIN_PCT);
        assert_eq!(safety_level(&m), SafetyLevel::Caution);
        assert!(loss_alert(&m).is_none());
        let losing = ParameterSet { cvr: 0.5, ..p };
        assert_eq!(safety_level(&compute_metrics(&losing)), SafetyLevel::Danger);
    }

    fn params_strategy() -> impl Strategy<Value = ParameterSet> {
        (1u32..=100, 1u32..=100, 10u32..=500, 10u32..=200, 10u32..=1000, 10u32..=90).prop_map(
            |(cvr, ctr, cpc, budget, aov, cost_rate)| ParameterSet {
                cvr: cvr as f64 / 10.0,
                ctr: ctr as f64 / 10.0,
                cpc: cpc as f64 * 10.0,
                budget: budget as f64 * 100_000.0,
                aov: aov as f64 * 1_000.0,
                cost_rate: cost_rate as f64,
            },
        )
    }

    proptest! {
        #[test]
        fn metrics_always_finite(p in params_strategy()) {
            prop_assert!(adsim_core::validate_parameters(&p).is_ok());
            let m = compute_metrics(&p);
            prop_assert!(m.is_finite());
        }

        #[test]
        fn metrics_are_idempotent(p in params_strategy()) {
            let a = compute_metrics(&p);
            let b = compute_metrics(&p);
            for (x, y) in a.values().iter().zip(b.values().iter()) {
                prop_assert_eq!(x.to_bits(), y.to_bits());
            }
        }

        #[test]
        fn breakeven_roas_strictly_increasing(c in 10u32..90) {
            let lo = breakeven_roas(c as f64);
            let hi = breakeven_roas((c + 1) as f64);
            prop_assert!(hi > lo);
        }

        #[test]
        fn breakeven_depends_only_on_cost_rate(p in params_strategy(), q in params_strategy()) {
            let mut q = q;
            ParameterField::CostRate.set(&mut q, p.cost_rate);
            prop_assert_eq!(compute_metrics(&p).breakeven_roas, compute_metrics(&q).breakeven_roas);
        }
    }
}
