//! Append-only in-memory scenario history.

use adsim_core::{MetricsRecord, ParameterSet};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Frozen copy of the parameters and metrics at save time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Sequence number, never reused within a store.
    pub id: u64,
    /// Strictly increasing across saves.
    pub saved_at: DateTime<Utc>,
    pub params: ParameterSet,
    pub metrics: MetricsRecord,
}

/// Ordered list of scenarios, oldest first.
///
/// Saves append; the only other mutation is [`clear`](Self::clear).
#[derive(Clone, Debug, Default)]
pub struct ScenarioStore {
    scenarios: Vec<Scenario>,
    next_id: u64,
    last_saved_at: Option<DateTime<Utc>>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `params`/`metrics` stamped with the current time.
    pub fn save(&mut self, params: ParameterSet, metrics: MetricsRecord) -> Scenario {
        self.save_at(params, metrics, Utc::now())
    }

    /// Snapshot with an explicit clock reading.
    ///
    /// A reading at or before the previous stamp is bumped 1 ms past it.
    pub fn save_at(
        &mut self,
        params: ParameterSet,
        metrics: MetricsRecord,
        now: DateTime<Utc>,
    ) -> Scenario {
        let saved_at = match self.last_saved_at {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        self.next_id += 1;
        let scenario = Scenario {
            id: self.next_id,
            saved_at,
            params,
            metrics,
        };
        self.last_saved_at = Some(saved_at);
        self.scenarios.push(scenario.clone());
        info!(id = scenario.id, total = self.scenarios.len(), "scenario saved");
        scenario
    }

    /// Drop every scenario. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.scenarios.len();
        self.scenarios.clear();
        info!(removed, "scenarios cleared");
        removed
    }

    pub fn list(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
