//! Read-only view models and landing/dashboard navigation.

use serde::Serialize;
use tracing::warn;

use crate::sim::engine::Simulator;
use crate::sim::metrics::PanelMetrics;
use crate::sim::types::{BuildingState, HistoryPoint, PhaseReading, Status};

/// Which screen the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    /// Building selection.
    #[default]
    Landing,
    /// Dashboard of one building.
    Dashboard(String),
}

impl View {
    /// Navigation target for "select building".
    pub fn select(name: impl Into<String>) -> Self {
        Self::Dashboard(name.into())
    }

    /// Navigation target for "go home".
    pub fn home() -> Self {
        Self::Landing
    }
}

/// One card on the landing screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingOverview {
    pub name: String,
    pub health: Status,
    pub total_power: f64,
    pub load_imbalance_pct: f64,
}

impl BuildingOverview {
    pub fn from_building(building: &BuildingState) -> Self {
        let metrics = PanelMetrics::from_phases(&building.phases);
        Self {
            name: building.name.clone(),
            health: metrics.health,
            total_power: metrics.total_power,
            load_imbalance_pct: metrics.load_imbalance_pct,
        }
    }
}

/// Everything the dashboard screen renders for one building.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub name: String,
    pub phases: Vec<PhaseReading>,
    pub history: Vec<HistoryPoint>,
    pub metrics: PanelMetrics,
}

impl DashboardSnapshot {
    pub fn from_building(building: &BuildingState) -> Self {
        Self {
            name: building.name.clone(),
            phases: building.phases.to_vec(),
            history: building.history.iter().cloned().collect(),
            metrics: PanelMetrics::from_phases(&building.phases),
        }
    }
}

/// A view request resolved against the current simulator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ResolvedView {
    Landing { buildings: Vec<BuildingOverview> },
    Dashboard(DashboardSnapshot),
}

impl ResolvedView {
    /// Returns `true` for the landing screen.
    pub fn is_landing(&self) -> bool {
        matches!(self, Self::Landing { .. })
    }
}

/// Landing cards for every building, in registration order.
pub fn landing(sim: &Simulator) -> Vec<BuildingOverview> {
    sim.buildings().map(BuildingOverview::from_building).collect()
}

/// Resolves a view request.
///
/// A dashboard request for a building that is not tracked falls back to the
/// landing screen instead of rendering without data.
pub fn resolve(view: &View, sim: &Simulator) -> ResolvedView {
    match view {
        View::Landing => ResolvedView::Landing {
            buildings: landing(sim),
        },
        View::Dashboard(name) => match sim.building(name) {
            Some(b) => ResolvedView::Dashboard(DashboardSnapshot::from_building(b)),
            None => {
                warn!(building = %name, "unknown building selected; showing landing view");
                ResolvedView::Landing {
                    buildings: landing(sim),
                }
            }
        },
    }
}
