//! Inverse CTR/CPC coupling.
//!
//! A higher click-through rate is modeled as buying cheaper clicks. Either
//! control can drive; the other is derived and fully overwritten. The two
//! directions use independent sensitivities and independent rounding, so
//! `ctr -> cpc -> ctr` does not always land where it started.

use crate::metrics::ratio;
use adsim_core::{BASELINE_CPC, BASELINE_CTR};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How strongly CPC reacts to a CTR multiplier.
pub const CPC_SENSITIVITY: f64 = 0.2;

/// How strongly CTR reacts to a CPC ratio.
pub const CTR_SENSITIVITY: f64 = 5.0;

/// CPC implied by `ctr`, rounded to the nearest 10 currency units.
///
/// `cpc = BASELINE_CPC / (1 + (ctr / 1.5 - 1) * 0.2)`
pub fn cpc_from_ctr(ctr: f64) -> f64 {
    let multiplier = ctr / BASELINE_CTR;
    let adjusted = ratio(BASELINE_CPC, 1.0 + (multiplier - 1.0) * CPC_SENSITIVITY);
    (adjusted / 10.0).round() * 10.0
}

/// CTR implied by `cpc`, rounded to the nearest 0.1 percentage point.
///
/// `ctr = 1.5 * (1 + (BASELINE_CPC / cpc - 1) * 5)`
pub fn ctr_from_cpc(cpc: f64) -> f64 {
    let cpc_ratio = ratio(BASELINE_CPC, cpc);
    let ctr = BASELINE_CTR * (1.0 + (cpc_ratio - 1.0) * CTR_SENSITIVITY);
    (ctr * 10.0).round() / 10.0
}

/// A CTR/CPC pair that is consistent under the coupling model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CtrCpcPair {
    pub ctr: f64,
    pub cpc: f64,
}

impl Default for CtrCpcPair {
    fn default() -> Self {
        Self {
            ctr: BASELINE_CTR,
            cpc: BASELINE_CPC,
        }
    }
}

/// CTR drives: keep `ctr`, derive the CPC.
pub fn apply_ctr_change(pair: CtrCpcPair, ctr: f64) -> CtrCpcPair {
    let next = CtrCpcPair {
        ctr,
        cpc: cpc_from_ctr(ctr),
    };
    trace!(from = ?pair, to = ?next, "ctr drives cpc");
    next
}

/// CPC drives: keep `cpc`, derive the CTR.
pub fn apply_cpc_change(pair: CtrCpcPair, cpc: f64) -> CtrCpcPair {
    let next = CtrCpcPair {
        ctr: ctr_from_cpc(cpc),
        cpc,
    };
    trace!(from = ?pair, to = ?next, "cpc drives ctr");
    next
}

/// Display-only efficiency indicator, 100 at the baseline pair.
///
/// Uses its own formula, which is not constant along the coupling curve.
pub fn ctr_cpc_efficiency(ctr: f64, cpc: f64) -> f64 {
    (ctr / BASELINE_CTR) * ratio(1000.0, cpc) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identity_at_calibration_point() {
        assert_eq!(cpc_from_ctr(BASELINE_CTR), BASELINE_CPC);
        assert_eq!(ctr_from_cpc(BASELINE_CPC), BASELINE_CTR);
    }

    #[test]
    fn doubling_ctr_prices_clicks_at_830() {
        assert_eq!(cpc_from_ctr(3.0), 830.0);
        let pair = apply_ctr_change(CtrCpcPair::default(), 3.0);
        assert_eq!(pair, CtrCpcPair { ctr: 3.0, cpc: 830.0 });
    }

    #[test]
    fn halving_cpc_gives_ctr_nine() {
        assert_eq!(ctr_from_cpc(500.0), 9.0);
        let pair = apply_cpc_change(CtrCpcPair::default(), 500.0);
        assert_eq!(pair, CtrCpcPair { ctr: 9.0, cpc: 500.0 });
    }

    #[test]
    fn round_trip_is_not_guaranteed() {
        // 9.1 -> 500 -> 9.0: the CPC grid is coarser than the CTR grid here.
        let cpc = cpc_from_ctr(9.1);
        assert_eq!(cpc, 500.0);
        assert_eq!(ctr_from_cpc(cpc), 9.0);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // raw ctr at cpc 2000 is exactly -2.25
        assert_eq!(ctr_from_cpc(2000.0), -2.3);
        assert_eq!(ctr_from_cpc(1250.0), 0.0);
        assert_eq!(ctr_from_cpc(800.0), 3.4);
    }

    #[test]
    fn degenerate_inputs_stay_finite() {
        assert_eq!(ctr_from_cpc(0.0), -6.0);
        assert!(cpc_from_ctr(-6.0).is_finite());
        assert_eq!(ctr_cpc_efficiency(1.5, 0.0), 0.0);
    }

    #[test]
    fn efficiency_disagrees_with_coupling_curve() {
        // Known quirk: the indicator is 100 at baseline but not along the curve.
        assert_eq!(ctr_cpc_efficiency(1.5, 1000.0), 100.0);
        let pair = apply_ctr_change(CtrCpcPair::default(), 3.0);
        let e = ctr_cpc_efficiency(pair.ctr, pair.cpc);
        assert!((e - 240.963_855).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn cpc_falls_as_ctr_rises(tenths in 1u32..100) {
            let lo = cpc_from_ctr(tenths as f64 / 10.0);
            let hi = cpc_from_ctr((tenths + 1) as f64 / 10.0);
            prop_assert!(hi <= lo);
        }

        #[test]
        fn derived_values_sit_on_their_grid(tenths in 1u32..=100, tens in 10u32..=500) {
            let cpc = cpc_from_ctr(tenths as f64 / 10.0);
            prop_assert_eq!(cpc % 10.0, 0.0);
            let ctr = ctr_from_cpc(tens as f64 * 10.0);
            prop_assert_eq!((ctr * 10.0).round() / 10.0, ctr);
        }

        #[test]
        fn driver_is_kept_verbatim(ctr in 0.1f64..10.0, cpc in 100.0f64..5000.0) {
            prop_assert_eq!(apply_ctr_change(CtrCpcPair::default(), ctr).ctr, ctr);
            prop_assert_eq!(apply_cpc_change(CtrCpcPair::default(), cpc).cpc, cpc);
        }
    }
}
