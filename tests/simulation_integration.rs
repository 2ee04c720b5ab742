mod common;

use chrono::{Duration, Utc};
use panel_sim::config::DashboardConfig;
use panel_sim::io::export::{PowerReport, write_history_csv, write_report};
use panel_sim::sim::metrics::PanelMetrics;
use panel_sim::sim::phase::{VOLTAGE_MAX, VOLTAGE_MIN, power_kw};
use panel_sim::sim::types::Status;
use panel_sim::view::{self, ResolvedView, View};

#[test]
fn campus_invariants_hold_over_a_long_run() {
    let mut sim = common::campus();
    let start = common::registered_at();
    let band = sim.config().current_band;

    for i in 1..=1_000 {
        sim.tick_at(&(start + Duration::seconds(3 * i)));
        for b in sim.buildings() {
            assert!(b.history.len() <= 20, "{} history too long", b.name);
            for p in &b.phases {
                assert!((VOLTAGE_MIN..=VOLTAGE_MAX).contains(&p.voltage));
                assert!((band.min_a..=band.max_a).contains(&p.current));
                assert_eq!(p.power, power_kw(p.voltage, p.current, p.power_factor));
            }
            let last = b.history.back().unwrap();
            assert_eq!(last.power_r, b.phases[0].power);
        }
    }
    assert_eq!(sim.ticks(), 1_000);
}

#[test]
fn same_seed_reproduces_the_walk() {
    let run = || {
        let mut sim = common::campus();
        for i in 1..=30 {
            sim.tick_at(&(common::registered_at() + Duration::seconds(3 * i)));
        }
        let mut csv = Vec::new();
        write_history_csv(sim.buildings(), &mut csv).unwrap();
        csv
    };
    assert_eq!(run(), run());
}

#[test]
fn report_matches_dashboard_metrics() {
    let mut sim = common::campus();
    for i in 1..=7 {
        sim.tick_at(&(common::registered_at() + Duration::seconds(3 * i)));
    }
    let building = sim.building("Engineering Faculty").unwrap();
    let metrics = PanelMetrics::from_phases(&building.phases);

    let report = PowerReport::from_building(building, Utc::now());
    let mut buf = Vec::new();
    write_report(&report, &mut buf).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    let close = |key: &str, want: f64| {
        let got = json[key].as_f64().unwrap();
        assert!((got - want).abs() < 1e-9, "{key}: {got} != {want}");
    };
    close("totalPower", metrics.total_power);
    close("averageVoltage", metrics.avg_voltage);
    close("totalCurrent", metrics.total_current);

    let history = json["historicalData"].as_array().unwrap();
    assert_eq!(history.len(), 10);
    let expected = building.recent_history(10);
    for (got, want) in history.iter().zip(&expected) {
        assert_eq!(got["timestamp"], want.timestamp.as_str());
    }
    assert_eq!(
        history.last().unwrap()["timestamp"],
        building.history.back().unwrap().timestamp.as_str()
    );
}

#[test]
fn navigation_falls_back_for_unknown_building() {
    let sim = common::campus();
    match view::resolve(&View::select("Old Gym"), &sim) {
        ResolvedView::Landing { buildings } => {
            let names: Vec<_> = buildings.iter().map(|b| b.name.as_str()).collect();
            assert_eq!(names, ["Rectorate", "Engineering Faculty", "Library"]);
        }
        ResolvedView::Dashboard(_) => panic!("unknown building must not open a dashboard"),
    }
}

#[test]
fn single_preset_is_one_building() {
    let config = DashboardConfig::from_preset("single").unwrap();
    assert!(config.validate().is_empty());
    let sim = common::simulator(&config);
    assert_eq!(sim.len(), 1);
    assert!(view::resolve(&View::home(), &sim).is_landing());
}

#[test]
fn toml_config_drives_the_simulator() {
    let toml = r#"
[simulation]
seed = 7
history_capacity = 8
backfill_points = 4
current_max_a = 20.0

[[buildings]]
name = "Workshop"
"#;
    let config = DashboardConfig::from_toml_str(toml).unwrap();
    assert!(config.validate().is_empty(), "{:?}", config.validate());

    let mut sim = common::simulator(&config);
    let workshop = sim.building("Workshop").unwrap();
    assert_eq!(workshop.history.len(), 4);

    for i in 1..=50 {
        sim.tick_at(&(common::registered_at() + Duration::seconds(i)));
    }
    let workshop = sim.building("Workshop").unwrap();
    assert_eq!(workshop.history.len(), 8);
    assert!(workshop.phases.iter().all(|p| p.current <= 20.0));
}

#[test]
fn seeded_campus_starts_healthy() {
    let sim = common::campus();
    for b in sim.buildings() {
        assert_eq!(PanelMetrics::from_phases(&b.phases).health, Status::Normal);
    }
}
