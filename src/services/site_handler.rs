use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use super::{
    accumulator,
    output_dir::OutputDir,
    progress::{Progress, ProgressEvent},
    sites::SiteAdapter,
};
use crate::{
    domain::{
        site::{Site, UNIFIED_SCHEMA},
        table::{Extraction, ResultTable},
    },
    error::SpreadsheetError,
};

/// What one site produced during a run.
#[derive(Debug)]
pub struct SiteOutput {
    pub site: Site,
    pub table: ResultTable,
    pub file: Option<PathBuf>,
}

/// Drives `adapter` over `terms` and writes its rows to the site's file.
///
/// Setup failures abandon the site with an empty table. Unit failures are
/// retried per the adapter's policy, then recorded and skipped. Only a failure
/// to write the output file is returned as an error.
pub async fn scrape_site<S: Send + Sync>(
    adapter: &mut dyn SiteAdapter<S>,
    session: &S,
    terms: &[String],
    stop: &CancellationToken,
    output: &OutputDir,
    progress: &Progress,
) -> Result<SiteOutput, SpreadsheetError> {
    let site = adapter.site();
    let mut table = ResultTable::new(&site.table_columns());

    if stop.is_cancelled() {
        return persist(site, table, output);
    }

    if let Err(e) = adapter.setup(session).await {
        log::error!("{} setup failed: {}", site, e);
        return Ok(SiteOutput {
            site,
            table: table.reindex(&UNIFIED_SCHEMA),
            file: None,
        });
    }

    let units = match adapter.work_units(session, terms).await {
        Ok(units) => units,
        Err(e) => {
            log::error!("{} could not list its work: {}", site, e);
            return Ok(SiteOutput {
                site,
                table: table.reindex(&UNIFIED_SCHEMA),
                file: None,
            });
        }
    };

    let policy = adapter.retry_policy();
    let max_attempts = policy.attempts.max(1);

    for unit in units {
        if stop.is_cancelled() {
            log::info!("{} stopped before '{}'", site, unit.label());
            break;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;

            match adapter.scrape_unit(session, &unit, stop).await {
                Ok(extractions) => {
                    for extraction in extractions {
                        match extraction {
                            Extraction::Extracted(row) => {
                                table.push(unit.search_term(), site.name(), &row)
                            }
                            Extraction::Skipped(reason) => {
                                log::warn!("{}: skipped a row for '{}': {}", site, unit.label(), reason)
                            }
                        }
                    }
                    break;
                }
                Err(e) => {
                    log::error!(
                        "{}: attempt {}/{} for '{}' failed: {}",
                        site,
                        attempt,
                        max_attempts,
                        unit.label(),
                        e
                    );

                    if attempt >= max_attempts || stop.is_cancelled() {
                        adapter.on_unit_failed(session, &unit, &e).await;
                        progress.emit(ProgressEvent::TermFailed {
                            site,
                            term: unit.label(),
                            error: e.to_string(),
                        });
                        break;
                    }
                    tokio::time::sleep(policy.pause).await;
                }
            }
        }
    }

    persist(site, table, output)
}

fn persist(
    site: Site,
    table: ResultTable,
    output: &OutputDir,
) -> Result<SiteOutput, SpreadsheetError> {
    let table = table.reindex(&UNIFIED_SCHEMA);

    if table.is_empty() {
        return Ok(SiteOutput {
            site,
            table,
            file: None,
        });
    }

    let file = output.site_file(site);
    accumulator::append(&table, &file)?;

    Ok(SiteOutput {
        site,
        table,
        file: Some(file),
    })
}
