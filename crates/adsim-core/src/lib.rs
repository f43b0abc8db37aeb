#![deny(warnings)]

//! Core domain models and invariants for the ad spend simulator.
//!
//! This crate defines the serializable parameter and metrics types shared by
//! the engine, the runtime and the export layer, together with the slider
//! ranges every parameter lives in and validation helpers for them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CTR (percent) at which the baseline CPC was observed.
pub const BASELINE_CTR: f64 = 1.5;

/// CPC (currency units) observed at [`BASELINE_CTR`]. Never changes.
pub const BASELINE_CPC: f64 = 1000.0;

/// Inclusive slider range with a fixed step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// True when `value` is finite and inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Clamp into the range, then round to the nearest multiple of `step`.
    ///
    /// Sub-unit steps are rounded through their inverse (`round(v * 10) / 10`
    /// for a 0.1 step) so that results such as 0.3 come out exact.
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        let snapped = if self.step >= 1.0 {
            (clamped / self.step).round() * self.step
        } else {
            let inv = (1.0 / self.step).round();
            (clamped * inv).round() / inv
        };
        snapped.clamp(self.min, self.max)
    }
}

/// The mutable simulation input. A single live instance exists per simulator.
///
/// Missing fields deserialize to their [`Default`] values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ParameterSet {
    /// Conversion rate in percent.
    pub cvr: f64,
    /// Click-through rate in percent.
    pub ctr: f64,
    /// Cost per click in currency units.
    pub cpc: f64,
    /// Total ad spend in currency units.
    pub budget: f64,
    /// Average order value in currency units.
    pub aov: f64,
    /// Cost of goods sold as a percent of revenue.
    pub cost_rate: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            cvr: 2.0,
            ctr: BASELINE_CTR,
            cpc: BASELINE_CPC,
            budget: 5_000_000.0,
            aov: 150_000.0,
            cost_rate: 30.0,
        }
    }
}

/// Addressable fields of a [`ParameterSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterField {
    Cvr,
    Ctr,
    Cpc,
    Budget,
    Aov,
    CostRate,
}

impl ParameterField {
    pub const ALL: [ParameterField; 6] = [
        ParameterField::Cvr,
        ParameterField::Ctr,
        ParameterField::Cpc,
        ParameterField::Budget,
        ParameterField::Aov,
        ParameterField::CostRate,
    ];

    /// Slider range for the field.
    pub const fn range(self) -> ParamRange {
        match self {
            ParameterField::Cvr => ParamRange::new(0.1, 10.0, 0.1),
            ParameterField::Ctr => ParamRange::new(0.1, 10.0, 0.1),
            ParameterField::Cpc => ParamRange::new(100.0, 5_000.0, 10.0),
            ParameterField::Budget => ParamRange::new(1_000_000.0, 20_000_000.0, 100_000.0),
            ParameterField::Aov => ParamRange::new(10_000.0, 1_000_000.0, 1_000.0),
            ParameterField::CostRate => ParamRange::new(10.0, 90.0, 1.0),
        }
    }

    pub fn get(self, params: &ParameterSet) -> f64 {
        match self {
            ParameterField::Cvr => params.cvr,
            ParameterField::Ctr => params.ctr,
            ParameterField::Cpc => params.cpc,
            ParameterField::Budget => params.budget,
            ParameterField::Aov => params.aov,
            ParameterField::CostRate => params.cost_rate,
        }
    }

    /// Raw write with no coupling; the runtime decides what follows a write.
    pub fn set(self, params: &mut ParameterSet, value: f64) {
        match self {
            ParameterField::Cvr => params.cvr = value,
            ParameterField::Ctr => params.ctr = value,
            ParameterField::Cpc => params.cpc = value,
            ParameterField::Budget => params.budget = value,
            ParameterField::Aov => params.aov = value,
            ParameterField::CostRate => params.cost_rate = value,
        }
    }

    /// Stable machine name, matching the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            ParameterField::Cvr => "cvr",
            ParameterField::Ctr => "ctr",
            ParameterField::Cpc => "cpc",
            ParameterField::Budget => "budget",
            ParameterField::Aov => "aov",
            ParameterField::CostRate => "cost_rate",
        }
    }

    /// Human-readable label with unit.
    pub const fn label(self) -> &'static str {
        match self {
            ParameterField::Cvr => "CVR (%)",
            ParameterField::Ctr => "CTR (%)",
            ParameterField::Cpc => "CPC",
            ParameterField::Budget => "Budget",
            ParameterField::Aov => "AOV",
            ParameterField::CostRate => "Cost Rate (%)",
        }
    }

    /// Whether writing this field drives the CTR/CPC coupling.
    pub const fn is_coupled(self) -> bool {
        matches!(self, ParameterField::Ctr | ParameterField::Cpc)
    }
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cvr" => Ok(ParameterField::Cvr),
            "ctr" => Ok(ParameterField::Ctr),
            "cpc" => Ok(ParameterField::Cpc),
            "budget" => Ok(ParameterField::Budget),
            "aov" => Ok(ParameterField::Aov),
            "cost_rate" | "costrate" | "cost-rate" => Ok(ParameterField::CostRate),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// Binary profitability status shared by the metrics record and sweep rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitStatus {
    Profit,
    Loss,
}

impl ProfitStatus {
    /// `Profit` iff `net_profit >= 0`.
    pub fn from_net_profit(net_profit: f64) -> Self {
        if net_profit >= 0.0 {
            ProfitStatus::Profit
        } else {
            ProfitStatus::Loss
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ProfitStatus::Profit => "profit",
            ProfitStatus::Loss => "loss",
        }
    }
}

impl fmt::Display for ProfitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full metric set derived from one [`ParameterSet`].
///
/// Percent-valued fields (`gross_margin`, `net_margin`, `roi`,
/// `safety_margin`) are already multiplied by 100.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub clicks: f64,
    pub impressions: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub roas: f64,
    /// The CPC the record was computed with.
    pub cpc: f64,
    pub cpa: f64,
    pub cpm: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub gross_margin: f64,
    pub net_profit: f64,
    pub net_margin: f64,
    pub roi: f64,
    pub breakeven_roas: f64,
    pub safety_margin: f64,
}

impl MetricsRecord {
    pub fn status(&self) -> ProfitStatus {
        ProfitStatus::from_net_profit(self.net_profit)
    }

    /// Every numeric field, in declaration order.
    pub fn values(&self) -> [f64; 16] {
        [
            self.clicks,
            self.impressions,
            self.conversions,
            self.revenue,
            self.roas,
            self.cpc,
            self.cpa,
            self.cpm,
            self.cogs,
            self.gross_profit,
            self.gross_margin,
            self.net_profit,
            self.net_margin,
            self.roi,
            self.breakeven_roas,
            self.safety_margin,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
    }
}

/// Validation errors for parameter invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Parameter value is NaN or infinite.
    #[error("{0} must be a finite number")]
    NonFinite(ParameterField),
    /// Parameter value lies outside its slider range.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: ParameterField,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Field name did not match any parameter.
    #[error("unknown parameter: {0}")]
    UnknownField(String),
}

/// Validate a single field value against its range.
pub fn validate_field(field: ParameterField, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    let range = field.range();
    if !range.contains(value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

/// Validate every field of a parameter set.
pub fn validate_parameters(params: &ParameterSet) -> Result<(), ValidationError> {
    for field in ParameterField::ALL {
        validate_field(field, field.get(params))?;
    }
    Ok(())
}
