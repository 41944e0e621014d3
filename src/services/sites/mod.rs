pub mod agmarknet;
pub mod bigbasket;
pub mod dmart;
pub mod hyperpure;
pub mod jiomart;
pub mod page;

use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::WebDriver;
use tokio_util::sync::CancellationToken;

pub use agmarknet::AgmarknetAdapter;
pub use bigbasket::BigBasketAdapter;
pub use dmart::DMartAdapter;
pub use hyperpure::HyperpureAdapter;
pub use jiomart::JioMartAdapter;

use crate::{
    configuration::ScraperSettings,
    domain::{
        site::{Site, NO_SEARCH_TERM},
        table::Extraction,
    },
    error::ScrapeError,
    services::output_dir::OutputDir,
};

/// One unit of per-site work.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkUnit {
    /// A lookup of one user supplied search term.
    Term(String),
    /// An entry of the site's own catalog, by position.
    CatalogEntry(usize),
}

impl WorkUnit {
    pub fn search_term(&self) -> &str {
        match self {
            WorkUnit::Term(term) => term,
            WorkUnit::CatalogEntry(_) => NO_SEARCH_TERM,
        }
    }

    pub fn label(&self) -> String {
        match self {
            WorkUnit::Term(term) => term.clone(),
            WorkUnit::CatalogEntry(index) => format!("catalog entry #{}", index + 1),
        }
    }
}

/// How often a failed work unit is attempted, and the pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u8,
    pub pause: Duration,
}

impl RetryPolicy {
    pub const fn once() -> Self {
        RetryPolicy {
            attempts: 1,
            pause: Duration::ZERO,
        }
    }

    pub const fn new(attempts: u8, pause: Duration) -> Self {
        RetryPolicy { attempts, pause }
    }
}

/// Site specific navigation and extraction over a browser session `S`.
///
/// The generic loop in `site_handler` drives an adapter: `setup` once, then
/// `scrape_unit` for every unit returned by `work_units`, checking the stop
/// token in between.
#[async_trait]
pub trait SiteAdapter<S: Send + Sync>: Send {
    fn site(&self) -> Site;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::once()
    }

    /// One-time navigation, e.g. opening the entry page or setting a
    /// delivery location. An error here abandons the site.
    async fn setup(&mut self, session: &S) -> Result<(), ScrapeError>;

    async fn work_units(&mut self, _session: &S, terms: &[String]) -> Result<Vec<WorkUnit>, ScrapeError> {
        Ok(terms.iter().cloned().map(WorkUnit::Term).collect())
    }

    /// Searches or expands one unit and extracts its rows. `stop` is checked
    /// before each row and each dropdown interaction.
    async fn scrape_unit(
        &mut self,
        session: &S,
        unit: &WorkUnit,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError>;

    /// Called once a unit has exhausted its attempts.
    async fn on_unit_failed(&mut self, _session: &S, _unit: &WorkUnit, _error: &ScrapeError) {}
}

/// Drains `extractions` until `stop` is set. The flag is checked before each
/// row, so rows produced after a stop request are dropped.
pub fn until_stopped<I>(extractions: I, stop: &CancellationToken) -> Vec<Extraction>
where
    I: IntoIterator<Item = Extraction>,
{
    let mut extractions = extractions.into_iter();
    let mut kept = vec![];
    while !stop.is_cancelled() {
        match extractions.next() {
            Some(extraction) => kept.push(extraction),
            None => break,
        }
    }
    kept
}

/// Builds a fresh adapter for `site`, carrying no state from earlier runs.
pub fn build_adapter(
    site: Site,
    settings: &ScraperSettings,
    output: &OutputDir,
) -> Box<dyn SiteAdapter<WebDriver>> {
    match site {
        Site::Agmarknet => Box::new(AgmarknetAdapter::new()),
        Site::BigBasket => Box::new(BigBasketAdapter::new(output.clone())),
        Site::DMart => Box::new(DMartAdapter::new(settings.dmart_location.clone())),
        Site::Hyperpure => Box::new(HyperpureAdapter::new()),
        Site::JioMart => Box::new(JioMartAdapter::new(settings.pincode.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: usize) -> Extraction {
        Extraction::Extracted(crate::domain::table::Row::new().with("Hyperpure_Price", i.to_string()))
    }

    #[test]
    fn until_stopped_keeps_rows_read_before_the_stop() {
        let stop = CancellationToken::new();
        let rows = (0..5).map(|i| {
            if i == 1 {
                stop.cancel();
            }
            row(i)
        });

        let kept = until_stopped(rows, &stop);

        assert_eq!(kept, vec![row(0), row(1)]);
    }

    #[test]
    fn until_stopped_takes_everything_without_a_stop() {
        let kept = until_stopped((0..3).map(row), &CancellationToken::new());
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn until_stopped_takes_nothing_after_a_stop() {
        let stop = CancellationToken::new();
        stop.cancel();

        assert!(until_stopped((0..3).map(row), &stop).is_empty());
    }

    #[test]
    fn catalog_entries_have_no_search_term() {
        assert_eq!(WorkUnit::CatalogEntry(3).search_term(), "N/A");
        assert_eq!(WorkUnit::CatalogEntry(3).label(), "catalog entry #4");
        assert_eq!(WorkUnit::Term("Onion".into()).search_term(), "Onion");
    }
}
