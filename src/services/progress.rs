use std::{fmt, path::PathBuf};

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::site::Site;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RunStarted { sites: Vec<Site>, terms: usize },
    SiteStarted(Site),
    SiteFinished { site: Site, rows: usize, file: Option<PathBuf> },
    TermFailed { site: Site, term: String, error: String },
    Stopping,
    MasterWritten { rows: usize, file: PathBuf },
    SessionClosed,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::RunStarted { sites, terms } => write!(
                f,
                "Scraping {} site(s) for {} search term(s)...",
                sites.len(),
                terms
            ),
            ProgressEvent::SiteStarted(site) => write!(f, "Scraping {}...", site),
            ProgressEvent::SiteFinished {
                site,
                rows,
                file: Some(file),
            } => write!(
                f,
                "{} data saved to {} ({} rows)",
                site,
                file.to_string_lossy(),
                rows
            ),
            ProgressEvent::SiteFinished {
                site, file: None, ..
            } => write!(f, "{} returned no data", site),
            ProgressEvent::TermFailed { site, term, error } => {
                write!(f, "{}: failed on '{}': {}", site, term, error)
            }
            ProgressEvent::Stopping => write!(f, "Stopping the scraping process..."),
            ProgressEvent::MasterWritten { rows, file } => write!(
                f,
                "Master data saved to {} ({} rows)",
                file.to_string_lossy(),
                rows
            ),
            ProgressEvent::SessionClosed => write!(f, "Closed browser session"),
        }
    }
}

/// Sending half of the status stream shown on the control panel.
#[derive(Clone)]
pub struct Progress {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl Progress {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Progress {
            sender: Some(sender),
        }
    }

    /// Discards every event; used where nobody is listening.
    pub fn silent() -> Self {
        Progress { sender: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        log::info!("{}", event);

        if let Some(sender) = &self.sender {
            if let Err(e) = sender.send(event) {
                log::error!("Progress channel got an Error: {:?}", e);
            }
        }
    }
}
