#![deny(warnings)]

//! Tabular export of the simulator state.
//!
//! Four tables with fixed column order: the current settings row, the CVR
//! and CPC breakeven sweeps, and the scenario history. Values are rounded
//! half away from zero through `rust_decimal` and printed without locale
//! formatting, so exports are byte-for-byte reproducible.

use adsim_core::{MetricsRecord, ParameterSet};
use adsim_econ::SweepRow;
use adsim_runtime::{Scenario, SimSnapshot};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub const CURRENT_HEADERS: [&str; 11] = [
    "Label",
    "CVR (%)",
    "CTR (%)",
    "Budget",
    "AOV",
    "CPC",
    "Cost Rate (%)",
    "Revenue",
    "Net Profit",
    "ROAS",
    "ROI (%)",
];

pub const CVR_SWEEP_HEADERS: [&str; 5] = ["CVR (%)", "Revenue", "Net Profit", "ROAS", "Status"];

pub const CPC_SWEEP_HEADERS: [&str; 5] = ["CPC", "Clicks", "Conversions", "Net Profit", "Status"];

pub const SCENARIO_HEADERS: [&str; 11] = [
    "Saved At",
    "CVR (%)",
    "CTR (%)",
    "Budget",
    "AOV",
    "CPC",
    "Cost Rate (%)",
    "Revenue",
    "Net Profit",
    "ROAS",
    "ROI (%)",
];

fn rounded(value: f64, dp: u32) -> Decimal {
    let d = Decimal::from_f64(value).unwrap_or(Decimal::ZERO);
    let r = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    // no "-0" in exports
    if r.is_zero() {
        Decimal::ZERO
    } else {
        r
    }
}

/// Fixed-point rendering with exactly `dp` decimals. Non-finite values print as 0.
///
/// Example:
/// assert_eq!(fixed(0.125, 2), "0.13");
pub fn fixed(value: f64, dp: u32) -> String {
    format!("{:.*}", dp as usize, rounded(value, dp))
}

/// Currency or count rendered in whole units.
pub fn whole(value: f64) -> String {
    fixed(value, 0)
}

/// Whole currency units as an integer, `None` when out of `i64` range.
pub fn to_whole_units(value: f64) -> Option<i64> {
    rounded(value, 0).to_i64()
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `ad_analysis_YYYYMMDD_HHMM.<ext>`
pub fn export_file_name(now: &DateTime<Utc>, ext: &str) -> String {
    format!("ad_analysis_{}.{}", now.format("%Y%m%d_%H%M"), ext)
}

/// A named table of pre-formatted cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn write_csv(&self, out: &mut String) {
        out.push_str(&csv_field(&self.name));
        out.push('\n');
        write_csv_line(out, &self.headers);
        for row in &self.rows {
            write_csv_line(out, row);
        }
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn write_csv_line(out: &mut String, cells: &[String]) {
    let line: Vec<String> = cells.iter().map(|c| csv_field(c)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

fn settings_cells(label: String, params: &ParameterSet, metrics: &MetricsRecord) -> Vec<String> {
    vec![
        label,
        fixed(params.cvr, 1),
        fixed(params.ctr, 1),
        whole(params.budget),
        whole(params.aov),
        whole(params.cpc),
        whole(params.cost_rate),
        whole(metrics.revenue),
        whole(metrics.net_profit),
        fixed(metrics.roas, 2),
        whole(metrics.roi),
    ]
}

pub fn current_table(params: &ParameterSet, metrics: &MetricsRecord) -> ExportTable {
    let mut t = ExportTable::new("Current Settings", &CURRENT_HEADERS);
    t.rows.push(settings_cells("Current".to_string(), params, metrics));
    t
}

pub fn cvr_sweep_table(rows: &[SweepRow]) -> ExportTable {
    let mut t = ExportTable::new("CVR Breakeven", &CVR_SWEEP_HEADERS);
    for r in rows {
        t.rows.push(vec![
            fixed(r.tested, 1),
            whole(r.revenue),
            whole(r.net_profit),
            fixed(r.roas, 2),
            r.status.to_string(),
        ]);
    }
    t
}

pub fn cpc_sweep_table(rows: &[SweepRow]) -> ExportTable {
    let mut t = ExportTable::new("CPC Breakeven", &CPC_SWEEP_HEADERS);
    for r in rows {
        t.rows.push(vec![
            whole(r.tested),
            whole(r.clicks),
            whole(r.conversions),
            whole(r.net_profit),
            r.status.to_string(),
        ]);
    }
    t
}

pub fn scenario_table(scenarios: &[Scenario]) -> ExportTable {
    let mut t = ExportTable::new("Saved Scenarios", &SCENARIO_HEADERS);
    for s in scenarios {
        t.rows
            .push(settings_cells(format_timestamp(&s.saved_at), &s.params, &s.metrics));
    }
    t
}

/// The four export tables for one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub current: ExportTable,
    pub cvr_sweep: ExportTable,
    pub cpc_sweep: ExportTable,
    pub scenarios: ExportTable,
}

impl ExportBundle {
    pub fn tables(&self) -> [&ExportTable; 4] {
        [&self.current, &self.cvr_sweep, &self.cpc_sweep, &self.scenarios]
    }

    /// Every table as CSV: name line, header line, rows; blank line between tables.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for (i, table) in self.tables().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            table.write_csv(&mut out);
        }
        out
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_bundle(snapshot: &SimSnapshot) -> ExportBundle {
    debug!(scenarios = snapshot.scenarios.len(), "building export bundle");
    ExportBundle {
        current: current_table(&snapshot.params, &snapshot.metrics),
        cvr_sweep: cvr_sweep_table(&snapshot.cvr_sweep),
        cpc_sweep: cpc_sweep_table(&snapshot.cpc_sweep),
        scenarios: scenario_table(&snapshot.scenarios),
    }
}
