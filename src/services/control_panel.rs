use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{
    droid::SessionProvider,
    orchestrator::{Download, Orchestrator, RunReport, RunStatus},
    progress::{Progress, ProgressEvent},
};
use crate::{domain::site::Site, error::RunError};

/// Why a run could not be started.
#[derive(Error, Debug, PartialEq)]
pub enum StartError {
    #[error("Upload a search term file first")]
    NoTerms,

    #[error("Select at least one site")]
    NoSites,

    #[error("A scraping run is already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub status: RunStatus,
    pub terms: usize,
    pub trace: Vec<String>,
    pub downloads: Vec<Download>,
}

#[derive(Default)]
struct PanelState {
    terms: Vec<String>,
    running: bool,
    status: Option<RunStatus>,
    stop: Option<CancellationToken>,
    trace: Vec<String>,
    downloads: Vec<Download>,
}

/// State behind the dashboard: the uploaded terms, the status trace of the
/// current run and the files it produced.
#[derive(Default)]
pub struct ControlPanel {
    state: Mutex<PanelState>,
}

impl ControlPanel {
    pub fn new() -> Self {
        ControlPanel::default()
    }

    fn state(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_terms(&self, terms: Vec<String>) {
        let mut state = self.state();
        state
            .trace
            .push(format!("Loaded {} search terms", terms.len()));
        state.terms = terms;
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let state = self.state();
        PanelSnapshot {
            status: state.status.clone().unwrap_or(RunStatus::Idle),
            terms: state.terms.len(),
            trace: state.trace.clone(),
            downloads: state.downloads.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Looks up a download by label (site name or "Master"), ignoring case.
    pub fn download(&self, label: &str) -> Option<Download> {
        self.state()
            .downloads
            .iter()
            .find(|d| d.label.eq_ignore_ascii_case(label))
            .cloned()
    }

    /// Marks a run as started and hands out its terms and a fresh stop token.
    pub fn begin_run(&self, sites: &[Site]) -> Result<(Vec<String>, CancellationToken), StartError> {
        let mut state = self.state();
        if state.running {
            return Err(StartError::AlreadyRunning);
        }
        if state.terms.is_empty() {
            return Err(StartError::NoTerms);
        }
        if sites.is_empty() {
            return Err(StartError::NoSites);
        }

        let stop = CancellationToken::new();
        state.running = true;
        state.status = Some(RunStatus::Running);
        state.stop = Some(stop.clone());
        state.trace.clear();
        state.downloads.clear();

        Ok((state.terms.clone(), stop))
    }

    /// Returns false when no run is in progress.
    pub fn request_stop(&self) -> bool {
        let mut state = self.state();
        match (state.stop.clone(), state.running) {
            (Some(stop), true) => {
                stop.cancel();
                state.trace.push("Stop requested".to_string());
                true
            }
            _ => false,
        }
    }

    pub fn record(&self, event: &ProgressEvent) {
        self.state().trace.push(event.to_string());
    }

    /// Frees the run slot. The downloads are the files the run reported.
    pub fn finish(&self, result: &Result<RunReport, RunError>) {
        match result {
            Ok(report) => {
                let mut state = self.state();
                state.running = false;
                state.stop = None;
                state.status = Some(report.status.clone());
                state.downloads = report.downloads.clone();
            }
            Err(e) => self.abort(&e.to_string()),
        }
    }

    /// Frees the run slot after a run that produced no report.
    pub fn abort(&self, reason: &str) {
        let mut state = self.state();
        state.running = false;
        state.stop = None;
        state.status = Some(RunStatus::Failed(reason.to_string()));
        state.trace.push(format!("Error: {}", reason));
    }
}

/// Feeds progress events into the panel until every sender is dropped.
pub async fn progress_handler(panel: &ControlPanel, mut receiver: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = receiver.recv().await {
        panel.record(&event);
    }
}

/// Runs one scrape and keeps `panel` informed. The panel's trace is complete
/// once this returns.
pub async fn run_scrape<P: SessionProvider>(
    panel: &ControlPanel,
    orchestrator: &Orchestrator<P>,
    sites: &[Site],
    terms: &[String],
    stop: &CancellationToken,
) {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let progress = Progress::new(sender);

    let (result, _) = tokio::join!(
        async move {
            let result = orchestrator.run(sites, terms, stop, &progress).await;
            drop(progress);
            result
        },
        progress_handler(panel, receiver)
    );

    if let Err(e) = &result {
        log::error!("Scraping run failed: {}", e);
    }
    panel.finish(&result);
}

/// Starts `run_scrape` in the background. The run slot is freed even when the
/// scraping task panics.
pub fn spawn_scrape<P>(
    panel: Arc<ControlPanel>,
    orchestrator: Orchestrator<P>,
    sites: Vec<Site>,
    terms: Vec<String>,
    stop: CancellationToken,
) -> JoinHandle<()>
where
    P: SessionProvider + 'static,
    P::Session: 'static,
{
    let run_panel = panel.clone();
    let run = tokio::spawn(async move {
        run_scrape(&run_panel, &orchestrator, &sites, &terms, &stop).await;
    });

    tokio::spawn(async move {
        if let Err(e) = run.await {
            log::error!("Scraping task ended abnormally: {}", e);
            panel.abort(&format!("scraping task ended abnormally: {}", e));
        }
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::table::Extraction,
        error::ScrapeError,
        services::{
            fake::{FakeAdapter, FakeProvider, FakeSession},
            output_dir::OutputDir,
            sites::{SiteAdapter, WorkUnit},
        },
    };

    struct PanickingAdapter(Site);

    #[async_trait]
    impl SiteAdapter<FakeSession> for PanickingAdapter {
        fn site(&self) -> Site {
            self.0
        }

        async fn setup(&mut self, _session: &FakeSession) -> Result<(), ScrapeError> {
            Ok(())
        }

        async fn scrape_unit(
            &mut self,
            _session: &FakeSession,
            _unit: &WorkUnit,
            _stop: &CancellationToken,
        ) -> Result<Vec<Extraction>, ScrapeError> {
            panic!("page layout changed");
        }
    }

    fn loaded_panel() -> ControlPanel {
        let panel = ControlPanel::new();
        panel.set_terms(vec!["Onion".into(), "Potato".into()]);
        panel
    }

    #[test]
    fn start_requires_terms_and_sites() {
        let panel = ControlPanel::new();
        assert_eq!(panel.begin_run(&Site::ALL).unwrap_err(), StartError::NoTerms);

        panel.set_terms(vec!["Onion".into()]);
        let err = panel.begin_run(&[]).unwrap_err();
        assert_eq!(err, StartError::NoSites);
        assert_eq!(err.to_string(), "Select at least one site");
    }

    #[test]
    fn second_start_is_rejected_while_running() {
        let panel = loaded_panel();
        let (terms, _stop) = panel.begin_run(&[Site::DMart]).unwrap();

        assert_eq!(terms, vec!["Onion", "Potato"]);
        assert_eq!(
            panel.begin_run(&[Site::DMart]).unwrap_err(),
            StartError::AlreadyRunning
        );
        assert_eq!(panel.snapshot().status, RunStatus::Running);
    }

    #[test]
    fn stop_cancels_only_the_current_run() {
        let panel = loaded_panel();
        assert!(!panel.request_stop());

        let (_, first) = panel.begin_run(&[Site::DMart]).unwrap();
        assert!(panel.request_stop());
        assert!(first.is_cancelled());

        panel.finish(&Ok(RunReport {
            status: RunStatus::Cancelled,
            downloads: vec![],
        }));
        let (_, second) = panel.begin_run(&[Site::DMart]).unwrap();

        assert!(!second.is_cancelled());
    }

    #[test]
    fn reported_files_become_downloads() {
        let panel = loaded_panel();
        panel.begin_run(&[Site::JioMart]).unwrap();
        panel.record(&ProgressEvent::SiteFinished {
            site: Site::JioMart,
            rows: 2,
            file: Some(Path::new("out/jiomart.xlsx").to_path_buf()),
        });
        assert!(panel.download("JioMart").is_none());

        panel.finish(&Ok(RunReport {
            status: RunStatus::Completed,
            downloads: vec![
                Download {
                    label: "JioMart".into(),
                    file: "out/jiomart.xlsx".into(),
                },
                Download {
                    label: "Master".into(),
                    file: "out/master.xlsx".into(),
                },
            ],
        }));

        let jiomart = panel.download("jiomart").unwrap();
        assert_eq!(jiomart.label, "JioMart");
        assert_eq!(jiomart.file, Path::new("out/jiomart.xlsx"));
        assert_eq!(panel.download("Master").unwrap().file, Path::new("out/master.xlsx"));
        assert!(panel.download("DMart").is_none());
        assert_eq!(panel.snapshot().trace.len(), 1);
    }

    #[test]
    fn failed_run_is_reported() {
        let panel = loaded_panel();
        panel.begin_run(&[Site::DMart]).unwrap();

        panel.finish(&Err(RunError::Session(crate::error::ScrapeError::Setup(
            "no WebDriver server".into(),
        ))));

        let snapshot = panel.snapshot();
        assert!(matches!(snapshot.status, RunStatus::Failed(_)));
        assert!(!panel.is_running());
        assert!(snapshot.trace.last().unwrap().starts_with("Error:"));
    }

    #[tokio::test]
    async fn run_scrape_fills_trace_and_downloads() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(
            FakeProvider::default(),
            OutputDir::new(dir.path()),
            Box::new(|site| Box::new(FakeAdapter::new(site))),
        );
        let panel = loaded_panel();
        let sites = [Site::Hyperpure, Site::BigBasket];
        let (terms, stop) = panel.begin_run(&sites).unwrap();

        run_scrape(&panel, &orchestrator, &sites, &terms, &stop).await;

        let snapshot = panel.snapshot();
        assert_eq!(snapshot.status, RunStatus::Completed);
        let labels: Vec<&str> = snapshot.downloads.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["BigBasket", "Hyperpure", "Master"]);
        assert_eq!(snapshot.trace.last().unwrap(), "Closed browser session");
        assert!(!panel.is_running());
    }

    #[tokio::test]
    async fn panicking_run_frees_the_slot() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(
            FakeProvider::default(),
            OutputDir::new(dir.path()),
            Box::new(|site| Box::new(PanickingAdapter(site))),
        );
        let panel = Arc::new(loaded_panel());
        let sites = vec![Site::DMart];
        let (terms, stop) = panel.begin_run(&sites).unwrap();

        spawn_scrape(panel.clone(), orchestrator, sites, terms, stop)
            .await
            .unwrap();

        assert!(!panel.is_running());
        assert!(matches!(panel.snapshot().status, RunStatus::Failed(_)));
        assert!(panel.begin_run(&[Site::DMart]).is_ok());
    }
}
