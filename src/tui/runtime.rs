//! TUI application state.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::advisor::{Advisor, AdvisorError, Advisory, AdvisoryRequest};
use crate::io::export::{self, PowerReport};
use crate::sim::engine::Simulator;
use crate::view::{self, ResolvedView, View};

/// What the advisor panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdvisorPanel {
    /// No request made for this dashboard yet.
    #[default]
    Idle,
    /// Waiting for the service.
    Loading,
    /// Last advisory received.
    Ready(Advisory),
    /// Inline error text.
    Failed(String),
}

/// TUI application state.
///
/// Owns the simulator outright: ticks and draws happen on the same thread, so
/// every frame renders a fully updated state.
pub struct App {
    sim: Simulator,
    advisor: Arc<Advisor>,
    runtime: Handle,
    pending: Option<Receiver<Result<Advisory, AdvisorError>>>,
    export_dir: PathBuf,
    tick_interval: Duration,
    /// Requested screen.
    pub view: View,
    /// Cursor on the landing list.
    pub selected: usize,
    /// Advisor panel of the open dashboard.
    pub panel: AdvisorPanel,
    /// One-line status message (export result, busy advisor).
    pub notice: Option<String>,
    /// Whether ticking is suspended.
    pub paused: bool,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
}

impl App {
    /// Creates the app on the landing screen.
    ///
    /// Advisory requests are spawned on `runtime`; reports are written to
    /// `export_dir`.
    pub fn new(
        sim: Simulator,
        advisor: Arc<Advisor>,
        runtime: Handle,
        export_dir: PathBuf,
    ) -> Self {
        let tick_interval = sim.config().tick_interval;
        Self {
            sim,
            advisor,
            runtime,
            pending: None,
            export_dir,
            tick_interval,
            view: View::Landing,
            selected: 0,
            panel: AdvisorPanel::Idle,
            notice: None,
            paused: false,
            quit: false,
            last_tick: Instant::now(),
        }
    }

    /// Advances the simulation by one step.
    pub fn tick(&mut self) {
        self.sim.tick();
        self.last_tick = Instant::now();
    }

    /// Returns the simulation tick period.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Read access to the simulator.
    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Resolves the current view against live state.
    pub fn resolved(&self) -> ResolvedView {
        view::resolve(&self.view, &self.sim)
    }

    /// Moves the landing cursor down, wrapping.
    pub fn select_next(&mut self) {
        if !self.sim.is_empty() {
            self.selected = (self.selected + 1) % self.sim.len();
        }
    }

    /// Moves the landing cursor up, wrapping.
    pub fn select_prev(&mut self) {
        if !self.sim.is_empty() {
            self.selected = (self.selected + self.sim.len() - 1) % self.sim.len();
        }
    }

    /// Opens the dashboard of the building under the cursor.
    pub fn open_selected(&mut self) {
        let name = self
            .sim
            .buildings()
            .nth(self.selected)
            .map(|b| b.name.clone());
        if let Some(name) = name {
            self.open(name);
        }
    }

    /// Opens a building's dashboard. Unknown names fall back to the landing view.
    pub fn open(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.reset_dashboard();
        if self.sim.building(&name).is_some() {
            self.view = View::select(name);
        } else {
            warn!(building = %name, "unknown building selected; showing landing view");
            self.view = View::home();
        }
    }

    /// Returns to the landing view.
    pub fn go_home(&mut self) {
        self.reset_dashboard();
        self.view = View::home();
    }

    fn reset_dashboard(&mut self) {
        self.panel = AdvisorPanel::Idle;
        self.pending = None;
        self.notice = None;
    }

    /// Starts an advisory request for the open dashboard in the background.
    pub fn request_advisory(&mut self) {
        let View::Dashboard(name) = &self.view else {
            return;
        };
        if self.pending.is_some() {
            self.notice = Some(AdvisorError::Busy.user_message());
            return;
        }
        let Some(building) = self.sim.building(name) else {
            self.go_home();
            return;
        };

        let request = AdvisoryRequest::from_building(building);
        let advisor = Arc::clone(&self.advisor);
        let (tx, rx) = mpsc::channel();
        self.runtime.spawn(async move {
            // The receiver is gone if the user navigated away; nothing to do.
            let _ = tx.send(advisor.analyze(&request).await);
        });
        self.pending = Some(rx);
        self.panel = AdvisorPanel::Loading;
        self.notice = None;
    }

    /// Moves a finished advisory result into the panel.
    pub fn poll_advisor(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.panel = AdvisorPanel::Failed(
                    "Failed to get analysis from the AI advisor. Please try again.".to_string(),
                );
                return;
            }
        };
        self.pending = None;
        self.panel = match outcome {
            Ok(advisory) => AdvisorPanel::Ready(advisory),
            Err(err) => AdvisorPanel::Failed(err.user_message()),
        };
    }

    /// Writes the open dashboard's report to the export directory.
    pub fn export_report(&mut self) {
        let View::Dashboard(name) = &self.view else {
            return;
        };
        let Some(building) = self.sim.building(name) else {
            self.go_home();
            return;
        };
        let report = PowerReport::from_building(building, Utc::now());
        let result = std::fs::create_dir_all(&self.export_dir)
            .map_err(export::ExportError::from)
            .and_then(|()| export::export_report(&report, &self.export_dir));
        self.notice = Some(match result {
            Ok(path) => {
                info!(path = %path.display(), "report exported");
                format!("Report saved to {}", path.display())
            }
            Err(err) => {
                warn!(error = %err, "report export failed");
                format!("Export failed: {err}")
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdvisorConfig;
    use crate::sim::types::{BuildingSpec, SimConfig};

    fn sim() -> Simulator {
        Simulator::with_buildings(
            SimConfig {
                seed: Some(11),
                ..SimConfig::default()
            },
            [
                BuildingSpec::standard("Rectorate"),
                BuildingSpec::standard("Library"),
            ],
        )
        .unwrap()
    }

    fn app(rt: &tokio::runtime::Runtime, dir: PathBuf) -> App {
        let advisor = Advisor::from_key(&AdvisorConfig::default(), None).unwrap();
        App::new(sim(), Arc::new(advisor), rt.handle().clone(), dir)
    }

    #[test]
    fn starts_on_landing_and_opens_selection() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        assert!(app.resolved().is_landing());

        app.select_next();
        app.open_selected();
        assert_eq!(app.view, View::select("Library"));
        assert!(!app.resolved().is_landing());

        app.go_home();
        assert!(app.resolved().is_landing());
    }

    #[test]
    fn cursor_wraps() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        app.select_prev();
        assert_eq!(app.selected, 1);
        app.select_next();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn unknown_building_goes_home() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        app.open("Gymnasium");
        assert_eq!(app.view, View::Landing);
        assert!(app.resolved().is_landing());
    }

    #[test]
    fn tick_advances_simulation() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        app.tick();
        app.tick();
        assert_eq!(app.simulator().ticks(), 2);
        assert_eq!(app.tick_interval(), Duration::from_millis(3000));
    }

    #[test]
    fn toggle_pause() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        assert!(!app.paused);
        app.toggle_pause();
        assert!(app.paused);
        app.toggle_pause();
        assert!(!app.paused);
    }

    #[test]
    fn advisory_without_credential_shows_inline_error() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        app.open("Rectorate");
        app.request_advisory();
        assert_eq!(app.panel, AdvisorPanel::Loading);

        for _ in 0..200 {
            app.poll_advisor();
            if app.panel != AdvisorPanel::Loading {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(
            app.panel,
            AdvisorPanel::Failed(
                "API key is not configured. Set the API_KEY environment variable.".to_string()
            )
        );
    }

    #[test]
    fn advisory_on_landing_is_ignored() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt, PathBuf::from("."));
        app.request_advisory();
        assert_eq!(app.panel, AdvisorPanel::Idle);
    }

    #[test]
    fn export_writes_report() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&rt, dir.path().join("reports"));
        app.open("Library");
        app.export_report();

        let notice = app.notice.clone().unwrap();
        assert!(notice.starts_with("Report saved to"), "{notice}");
        let files: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
            .unwrap()
            .collect();
        assert_eq!(files.len(), 1);
    }
}
