//! In-memory stand-ins for the browser session and site adapters.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{
    droid::SessionProvider,
    sites::{until_stopped, RetryPolicy, SiteAdapter, WorkUnit},
};
use crate::{
    domain::{
        site::Site,
        table::{Extraction, Row},
    },
    error::ScrapeError,
};

pub struct FakeSession;

#[derive(Default, Clone)]
pub struct FakeProvider {
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub fail_open: bool,
}

#[async_trait]
impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession, ScrapeError> {
        if self.fail_open {
            return Err(ScrapeError::Setup("no WebDriver server".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession)
    }

    async fn close(&self, _session: FakeSession) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeAdapter {
    site: Site,
    rows_per_unit: usize,
    skipped_per_unit: usize,
    catalog: Option<usize>,
    fail_setup: bool,
    failures: HashMap<String, u8>,
    retry: RetryPolicy,
    cancel_after: Option<usize>,
    cancel_after_rows: Option<usize>,
    scraped: usize,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeAdapter {
    pub fn new(site: Site) -> Self {
        FakeAdapter {
            site,
            rows_per_unit: 1,
            skipped_per_unit: 0,
            catalog: None,
            fail_setup: false,
            failures: HashMap::new(),
            retry: RetryPolicy::once(),
            cancel_after: None,
            cancel_after_rows: None,
            scraped: 0,
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn rows_per_unit(mut self, rows: usize) -> Self {
        self.rows_per_unit = rows;
        self
    }

    pub fn skip_rows(mut self, skipped: usize) -> Self {
        self.skipped_per_unit = skipped;
        self
    }

    /// Ignores the terms and walks `entries` catalog entries instead.
    pub fn catalog(mut self, entries: usize) -> Self {
        self.catalog = Some(entries);
        self
    }

    pub fn fail_setup(mut self) -> Self {
        self.fail_setup = true;
        self
    }

    pub fn fail_times(mut self, term: &str, times: u8) -> Self {
        self.failures.insert(term.to_string(), times);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Requests stop once `units` units were scraped.
    pub fn cancel_after(mut self, units: usize) -> Self {
        self.cancel_after = Some(units);
        self
    }

    /// Requests stop partway through the first unit, once `rows` rows were read.
    pub fn cancel_after_rows(mut self, rows: usize) -> Self {
        self.cancel_after_rows = Some(rows);
        self
    }

    /// Shares the call log with `calls`.
    pub fn recording(mut self, calls: Arc<Mutex<Vec<String>>>) -> Self {
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SiteAdapter<FakeSession> for FakeAdapter {
    fn site(&self) -> Site {
        self.site
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn setup(&mut self, _session: &FakeSession) -> Result<(), ScrapeError> {
        self.record("setup".into());
        match self.fail_setup {
            true => Err(ScrapeError::Setup("location dialog missing".into())),
            false => Ok(()),
        }
    }

    async fn work_units(
        &mut self,
        _session: &FakeSession,
        terms: &[String],
    ) -> Result<Vec<WorkUnit>, ScrapeError> {
        Ok(match self.catalog {
            Some(entries) => (0..entries).map(WorkUnit::CatalogEntry).collect(),
            None => terms.iter().cloned().map(WorkUnit::Term).collect(),
        })
    }

    async fn scrape_unit(
        &mut self,
        _session: &FakeSession,
        unit: &WorkUnit,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError> {
        let label = unit.label();
        self.record(format!("scrape:{}", label));

        if let Some(remaining) = self.failures.get_mut(&label) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ScrapeError::MissingElement("search bar".into()));
            }
        }

        let column = self.site.columns()[0];
        let cancel_after_rows = self.cancel_after_rows.take();
        let rows = (0..self.rows_per_unit).map(|i| {
            let row = Extraction::Extracted(Row::new().with(column, format!("{} #{}", label, i)));
            if cancel_after_rows == Some(i + 1) {
                stop.cancel();
            }
            row
        });
        let skipped =
            (0..self.skipped_per_unit).map(|_| Extraction::Skipped("card without price".into()));
        let extractions = until_stopped(rows.chain(skipped), stop);

        self.scraped += 1;
        if self.cancel_after == Some(self.scraped) {
            stop.cancel();
        }

        Ok(extractions)
    }

    async fn on_unit_failed(&mut self, _session: &FakeSession, unit: &WorkUnit, _error: &ScrapeError) {
        self.record(format!("failed:{}", unit.label()));
    }
}
