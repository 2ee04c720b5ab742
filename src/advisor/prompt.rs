//! Prompt construction for the advisory service.

use serde::Serialize;

use crate::sim::metrics::load_imbalance_pct;
use crate::sim::types::{BuildingState, PhaseReading};

/// Snapshot handed to the advisor: current phases plus the computed imbalance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRequest {
    pub building: String,
    pub phases: Vec<PhaseReading>,
    pub load_imbalance_pct: f64,
}

impl AdvisoryRequest {
    /// Copies the building's current readings.
    pub fn from_building(building: &BuildingState) -> Self {
        Self {
            building: building.name.clone(),
            phases: building.phases.to_vec(),
            load_imbalance_pct: load_imbalance_pct(&building.phases),
        }
    }
}

/// `Phase R: Voltage=220.0V, ...` entries joined with `; `.
pub fn data_summary(phases: &[PhaseReading]) -> String {
    phases
        .iter()
        .map(|p| {
            format!(
                "Phase {}: Voltage={:.1}V, Current={:.1}A, Power={:.2}kW, PF={:.2}, Status={}",
                p.name, p.voltage, p.current, p.power, p.power_factor, p.status
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Full prompt for one building.
pub fn build_prompt(site_name: &str, request: &AdvisoryRequest) -> String {
    format!(
        "You are an expert AI energy advisor for the {site} ({building}).
Analyze the following real-time 3-phase power data and provide a concise, actionable report in markdown format.

Current Data: {summary}
Calculated Load Imbalance: {imbalance:.1}%

Your report should include:
1. **System Status**: A brief summary (e.g., \"All systems nominal,\" \"Minor voltage fluctuation detected,\" \"Critical alert on Phase X\").
2. **Load Balance Analysis**: Comment on the load imbalance percentage. If it's over 10%, it's a potential issue.
3. **Potential Issues**: Highlight any anomalies detected (voltage deviations outside 205-235V, high current, or imbalances).
4. **Efficiency Recommendations**: Provide one or two specific, actionable recommendations (e.g., \"Consider shifting a 0.5kW load from Phase R to S to improve balance,\" or \"Overall consumption is stable, continue monitoring.\").

Keep the language clear and direct for technical staff. Use bold for headings.",
        site = site_name,
        building = request.building,
        summary = data_summary(&request.phases),
        imbalance = request.load_imbalance_pct,
    )
}
