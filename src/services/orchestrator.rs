use std::path::PathBuf;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{
    accumulator,
    droid::{Droid, SessionProvider},
    output_dir::OutputDir,
    progress::{Progress, ProgressEvent},
    site_handler::scrape_site,
    sites::{build_adapter, SiteAdapter},
};
use crate::{
    configuration::Settings,
    domain::{
        site::{Site, MASTER_LABEL, UNIFIED_SCHEMA},
        table::ResultTable,
    },
    error::RunError,
};

pub type AdapterFactory<S> = Box<dyn Fn(Site) -> Box<dyn SiteAdapter<S>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed(String),
}

/// A file written by a run, labelled by site name or "Master".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Download {
    pub label: String,
    #[serde(skip)]
    pub file: PathBuf,
}

#[derive(Debug)]
pub struct RunReport {
    /// `Completed` or `Cancelled`.
    pub status: RunStatus,
    pub downloads: Vec<Download>,
}

/// Runs the selected sites one after another on a single browser session and
/// merges their tables into the master file.
pub struct Orchestrator<P: SessionProvider> {
    provider: P,
    output: OutputDir,
    adapters: AdapterFactory<P::Session>,
}

impl Orchestrator<Droid> {
    /// Scrapes with Chrome through the configured WebDriver server.
    pub fn with_browser(settings: &Settings) -> Self {
        let output = OutputDir::new(settings.scraper.output_dir.clone());
        let scraper = settings.scraper.clone();
        let adapter_output = output.clone();

        Orchestrator::new(
            Droid::new(settings.webdriver.clone()),
            output,
            Box::new(move |site| build_adapter(site, &scraper, &adapter_output)),
        )
    }
}

impl<P: SessionProvider> Orchestrator<P> {
    pub fn new(provider: P, output: OutputDir, adapters: AdapterFactory<P::Session>) -> Self {
        Orchestrator {
            provider,
            output,
            adapters,
        }
    }

    /// Clears the previous run's files, then scrapes `selected` in declared
    /// site order. The session is closed on every path out of the run.
    pub async fn run(
        &self,
        selected: &[Site],
        terms: &[String],
        stop: &CancellationToken,
        progress: &Progress,
    ) -> Result<RunReport, RunError> {
        self.output.reset()?;

        let sites: Vec<Site> = Site::ALL
            .into_iter()
            .filter(|site| selected.contains(site))
            .collect();
        progress.emit(ProgressEvent::RunStarted {
            sites: sites.clone(),
            terms: terms.len(),
        });

        let session = self.provider.open().await.map_err(RunError::Session)?;
        let result = self.scrape_sites(&session, &sites, terms, stop, progress).await;
        self.provider.close(session).await;
        progress.emit(ProgressEvent::SessionClosed);

        result
    }

    async fn scrape_sites(
        &self,
        session: &P::Session,
        sites: &[Site],
        terms: &[String],
        stop: &CancellationToken,
        progress: &Progress,
    ) -> Result<RunReport, RunError> {
        let mut tables = vec![];
        let mut report = RunReport {
            status: RunStatus::Running,
            downloads: vec![],
        };

        for &site in sites {
            if stop.is_cancelled() {
                break;
            }

            progress.emit(ProgressEvent::SiteStarted(site));
            let mut adapter = (self.adapters)(site);
            let output = scrape_site(
                adapter.as_mut(),
                session,
                terms,
                stop,
                &self.output,
                progress,
            )
            .await?;

            let table = output.table.reindex(&UNIFIED_SCHEMA);
            if let Some(file) = &output.file {
                report.downloads.push(Download {
                    label: site.name().to_string(),
                    file: file.clone(),
                });
            }
            progress.emit(ProgressEvent::SiteFinished {
                site,
                rows: table.len(),
                file: output.file,
            });
            tables.push(table);
        }

        if stop.is_cancelled() {
            progress.emit(ProgressEvent::Stopping);
            report.status = RunStatus::Cancelled;
            return Ok(report);
        }

        if !tables.is_empty() {
            let master = ResultTable::concat(&UNIFIED_SCHEMA, &tables);
            let file = self.output.master_file();
            accumulator::append(&master, &file)?;

            report.downloads.push(Download {
                label: MASTER_LABEL.to_string(),
                file: file.clone(),
            });
            progress.emit(ProgressEvent::MasterWritten {
                rows: master.len(),
                file,
            });
        }

        report.status = RunStatus::Completed;
        Ok(report)
    }
}
