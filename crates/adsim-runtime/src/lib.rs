#![deny(warnings)]

//! Simulator state and command API.
//!
//! [`Simulator`] is the explicit application-state object: it owns the live
//! parameter set and the scenario history. Every read recomputes from the
//! live parameters; nothing derived is cached between calls.

pub mod scenario;

pub use scenario::{Scenario, ScenarioStore};

use adsim_core::{validate_parameters, MetricsRecord, ParameterField, ParameterSet, ValidationError};
use adsim_econ::{
    apply_cpc_change, apply_ctr_change, compute_metrics, cost_structure, cpc_sweep, ctr_cpc_efficiency,
    cvr_sweep, loss_alert, nearest_rows, safety_level, CostStructure, CtrCpcPair, LossAlert, SafetyLevel,
    SweepKind, SweepRow,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the command API.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("simulator state lock poisoned")]
    StatePoisoned,
}

/// A user-driven change, serializable so front ends can send it as data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SetParameter { field: ParameterField, value: f64 },
    SaveScenario,
    ClearScenarios,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Parameters after the update, including any coupled follower.
    Parameters { params: ParameterSet },
    Saved { scenario: Scenario },
    Cleared { removed: usize },
}

/// Everything the presentation layer renders for one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub params: ParameterSet,
    pub metrics: MetricsRecord,
    pub cvr_sweep: Vec<SweepRow>,
    pub cpc_sweep: Vec<SweepRow>,
    /// Row indices into `cvr_sweep` nearest the live CVR.
    pub cvr_nearest: Vec<usize>,
    /// Row indices into `cpc_sweep` nearest the live CPC.
    pub cpc_nearest: Vec<usize>,
    pub cost_structure: CostStructure,
    pub loss_alert: Option<LossAlert>,
    pub safety: SafetyLevel,
    pub ctr_cpc_efficiency: f64,
    pub scenarios: Vec<Scenario>,
}

/// Startup configuration: initial parameters plus commands to replay.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfigFile {
    pub parameters: ParameterSet,
    pub commands: Vec<Command>,
}

/// Live parameters plus scenario history.
#[derive(Clone, Debug, Default)]
pub struct Simulator {
    params: ParameterSet,
    scenarios: ScenarioStore,
}

impl Simulator {
    /// Start from a validated parameter set.
    pub fn new(params: ParameterSet) -> Result<Self, SimError> {
        validate_parameters(&params)?;
        Ok(Self {
            params,
            scenarios: ScenarioStore::new(),
        })
    }

    /// Build from a config file, replaying its commands in order.
    pub fn from_config(cfg: &SimConfigFile) -> Result<Self, SimError> {
        let mut sim = Self::new(cfg.parameters)?;
        for cmd in &cfg.commands {
            sim.apply(cmd.clone())?;
        }
        Ok(sim)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Set one field the way a slider would.
    ///
    /// The value is clamped and stepped into the field's range. Writing CTR
    /// or CPC makes it the driver: the other one is re-derived and
    /// overwritten with the raw coupled value, which may fall outside its
    /// own slider range (a CPC above 1250 derives a CTR at or below zero).
    pub fn set_parameter(&mut self, field: ParameterField, value: f64) -> Result<ParameterSet, SimError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(field).into());
        }
        let value = field.range().snap(value);
        let mut next = self.params;
        if field.is_coupled() {
            let pair = CtrCpcPair {
                ctr: next.ctr,
                cpc: next.cpc,
            };
            let pair = if field == ParameterField::Ctr {
                apply_ctr_change(pair, value)
            } else {
                apply_cpc_change(pair, value)
            };
            next.ctr = pair.ctr;
            next.cpc = pair.cpc;
        } else {
            field.set(&mut next, value);
        }
        debug!(%field, value, ctr = next.ctr, cpc = next.cpc, "parameter set");
        self.params = next;
        Ok(next)
    }

    pub fn metrics(&self) -> MetricsRecord {
        compute_metrics(&self.params)
    }

    pub fn cvr_sweep(&self) -> Vec<SweepRow> {
        cvr_sweep(&self.params)
    }

    pub fn cpc_sweep(&self) -> Vec<SweepRow> {
        cpc_sweep(&self.params)
    }

    pub fn save_scenario(&mut self) -> Scenario {
        let metrics = self.metrics();
        self.scenarios.save(self.params, metrics)
    }

    pub fn clear_scenarios(&mut self) -> usize {
        self.scenarios.clear()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        self.scenarios.list()
    }

    pub fn apply(&mut self, cmd: Command) -> Result<CommandOutcome, SimError> {
        debug!(?cmd, "apply command");
        match cmd {
            Command::SetParameter { field, value } => {
                let params = self.set_parameter(field, value)?;
                Ok(CommandOutcome::Parameters { params })
            }
            Command::SaveScenario => Ok(CommandOutcome::Saved {
                scenario: self.save_scenario(),
            }),
            Command::ClearScenarios => Ok(CommandOutcome::Cleared {
                removed: self.clear_scenarios(),
            }),
        }
    }

    /// Recompute everything from the live parameters.
    pub fn snapshot(&self) -> SimSnapshot {
        let metrics = self.metrics();
        let cvr_rows = self.cvr_sweep();
        let cpc_rows = self.cpc_sweep();
        SimSnapshot {
            params: self.params,
            metrics,
            cvr_nearest: nearest_rows(&cvr_rows, SweepKind::Cvr.live_value(&self.params)),
            cpc_nearest: nearest_rows(&cpc_rows, SweepKind::Cpc.live_value(&self.params)),
            cvr_sweep: cvr_rows,
            cpc_sweep: cpc_rows,
            cost_structure: cost_structure(&self.params, &metrics),
            loss_alert: loss_alert(&metrics),
            safety: safety_level(&metrics),
            ctr_cpc_efficiency: ctr_cpc_efficiency(self.params.ctr, self.params.cpc),
            scenarios: self.scenarios.list().to_vec(),
        }
    }
}

/// Thread-safe handle. Each command holds the write lock for its whole
/// update, so exactly one field drives per update and readers never observe
/// a partial append.
#[derive(Clone, Debug, Default)]
pub struct SharedSimulator {
    inner: Arc<RwLock<Simulator>>,
}

impl SharedSimulator {
    pub fn new(sim: Simulator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(sim)),
        }
    }

    pub fn apply(&self, cmd: Command) -> Result<CommandOutcome, SimError> {
        let mut guard = self.inner.write().map_err(|_| SimError::StatePoisoned)?;
        guard.apply(cmd)
    }

    pub fn snapshot(&self) -> Result<SimSnapshot, SimError> {
        let guard = self.inner.read().map_err(|_| SimError::StatePoisoned)?;
        Ok(guard.snapshot())
    }

    pub fn params(&self) -> Result<ParameterSet, SimError> {
        let guard = self.inner.read().map_err(|_| SimError::StatePoisoned)?;
        Ok(*guard.params())
    }
}
