#![cfg(feature = "api")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use panel_sim::advisor::Advisor;
use panel_sim::api::{AppState, router};
use panel_sim::config::AdvisorConfig;
use panel_sim::session::{Session, shared};
use serde_json::Value;
use tower::util::ServiceExt;

async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router(Arc::clone(state)).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test(start_paused = true)]
async fn live_session_updates_are_visible_through_the_api() {
    let sim = common::campus();
    let period = sim.config().tick_interval;
    let session = Session::start(shared(sim), period);
    let state = Arc::new(AppState {
        simulator: Arc::clone(session.state()),
        advisor: Advisor::from_key(&AdvisorConfig::default(), None).unwrap(),
    });

    let (status, before) = get(&state, "/buildings/Library").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["history"].as_array().unwrap().len(), 11);

    tokio::time::sleep(period * 12 + Duration::from_millis(10)).await;

    let (_, after) = get(&state, "/buildings/Library").await;
    let history = after["history"].as_array().unwrap();
    assert_eq!(history.len(), 20);
    assert_eq!(
        history.last().unwrap()["power_R"],
        after["phases"][0]["power"]
    );

    let (_, report) = get(&state, "/buildings/Library/report").await;
    assert_eq!(report["totalPower"], after["metrics"]["totalPower"]);
    assert_eq!(report["historicalData"].as_array().unwrap().len(), 10);

    session.end();
}

#[tokio::test]
async fn overview_lists_every_campus_building() {
    let state = Arc::new(AppState {
        simulator: shared(common::campus()),
        advisor: Advisor::from_key(&AdvisorConfig::default(), None).unwrap(),
    });
    let (status, json) = get(&state, "/buildings").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Rectorate", "Engineering Faculty", "Library"]);

    let (_, view) = get(&state, "/view?building=Old%20Gym").await;
    assert_eq!(view["view"], "landing");
}
