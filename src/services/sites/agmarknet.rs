use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use thirtyfour::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{
    page::{pause, wait_clickable},
    RetryPolicy, SiteAdapter, WorkUnit,
};
use crate::{
    domain::{
        site::Site,
        table::{Extraction, Row},
    },
    error::ScrapeError,
};

const URL: &str = "https://agmarknet.gov.in";
const VEGETABLES_EXPANDER: &str =
    "//td[text()='Vegetables']/preceding-sibling::td/input[@type='image']";
const VEGETABLE_ITEMS: &str = "//table[@title='Vegetables']//tr[td/input[@type='image']]";
const CELLS_PER_VARIETY: usize = 4;

/// Commodity names collected so far in a run.
#[derive(Debug, Default)]
pub struct SeenItems(HashSet<String>);

impl SeenItems {
    /// A skip marker when `name` was already collected.
    pub fn skip_repeat(&self, name: &str) -> Option<Extraction> {
        self.0
            .contains(name)
            .then(|| Extraction::Skipped(format!("{} already collected", name)))
    }

    /// Remembers `name` if `extractions` produced at least one row.
    pub fn record(&mut self, name: &str, extractions: &[Extraction]) -> bool {
        let extracted = extractions
            .iter()
            .any(|e| matches!(e, Extraction::Extracted(_)));
        if extracted {
            self.0.insert(name.to_string());
        }
        extracted
    }
}

/// Market price board. Walks the board's own vegetable catalog; the search
/// terms are not used.
pub struct AgmarknetAdapter {
    seen_items: SeenItems,
}

impl AgmarknetAdapter {
    pub fn new() -> Self {
        AgmarknetAdapter {
            seen_items: SeenItems::default(),
        }
    }
}

impl Default for AgmarknetAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteAdapter<WebDriver> for AgmarknetAdapter {
    fn site(&self) -> Site {
        Site::Agmarknet
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    async fn setup(&mut self, driver: &WebDriver) -> Result<(), ScrapeError> {
        driver.goto(URL).await?;
        pause(5).await;

        let expander = wait_clickable(driver, By::XPath(VEGETABLES_EXPANDER), 10)
            .await
            .map_err(|e| {
                ScrapeError::Setup(format!("Vegetables section did not load: {}", e))
            })?;
        expander.click().await?;
        pause(2).await;

        Ok(())
    }

    async fn work_units(
        &mut self,
        driver: &WebDriver,
        _terms: &[String],
    ) -> Result<Vec<WorkUnit>, ScrapeError> {
        let items = driver.find_all(By::XPath(VEGETABLE_ITEMS)).await?;
        log::info!("Found {} vegetable items on Agmarknet", items.len());

        Ok((0..items.len()).map(WorkUnit::CatalogEntry).collect())
    }

    async fn scrape_unit(
        &mut self,
        driver: &WebDriver,
        unit: &WorkUnit,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError> {
        let WorkUnit::CatalogEntry(index) = unit else {
            return Ok(vec![Extraction::Skipped(format!(
                "{} is not a catalog entry",
                unit.label()
            ))]);
        };

        // The expanded rows shift positions, so the list is fetched again.
        let items = driver.find_all(By::XPath(VEGETABLE_ITEMS)).await?;
        let item = items
            .get(*index)
            .ok_or_else(|| ScrapeError::MissingElement(format!("vegetable item #{}", index)))?;

        let cells = item.find_all(By::Tag("td")).await?;
        let name = match cells.get(1) {
            Some(cell) => cell.text().await?.trim().to_string(),
            None => return Err(ScrapeError::MissingElement("commodity name".into())),
        };

        if let Some(skipped) = self.seen_items.skip_repeat(&name) {
            return Ok(vec![skipped]);
        }

        item.find(By::XPath("./td[1]/input[@type='image']"))
            .await?
            .click()
            .await?;
        pause(2).await;

        let details = driver
            .find(By::XPath(format!(
                "//tr[td[text()={}]]/following-sibling::tr[1]//table",
                xpath_literal(&name)
            )))
            .await?;
        let detail_cells = details.find_all(By::Tag("td")).await?;

        let mut extractions = vec![];
        for group in detail_cells.chunks(CELLS_PER_VARIETY) {
            if stop.is_cancelled() {
                break;
            }

            let mut texts = Vec::with_capacity(CELLS_PER_VARIETY);
            for cell in group {
                texts.push(cell.text().await?.trim().to_string());
            }
            extractions.push(variety_row(&name, &texts));
        }

        if self.seen_items.record(&name, &extractions) {
            log::info!("Collected data for {}", name);
        }

        Ok(extractions)
    }
}

/// Turns one (variety, max, min, modal) cell group into a row.
pub fn variety_row(commodity: &str, cells: &[String]) -> Extraction {
    match cells {
        [variety, max, min, modal] => Extraction::Extracted(
            Row::new()
                .with("Agmarknet_Commodity", commodity)
                .with("Agmarknet_Variety", variety.as_str())
                .with("Agmarknet_MAX", max.as_str())
                .with("Agmarknet_MIN", min.as_str())
                .with("Agmarknet_Modal", modal.as_str()),
        ),
        _ => Extraction::Skipped(format!(
            "incomplete price row for {} ({} cells)",
            commodity,
            cells.len()
        )),
    }
}

/// Quotes `value` as an XPath string literal.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn variety_row_maps_four_cells() {
        let row = variety_row("Onion", &strings(&["Red", "2400", "1800", "2100"]));

        let Extraction::Extracted(row) = row else {
            panic!("expected a row");
        };
        assert_eq!(row.get("Agmarknet_Commodity"), Some("Onion"));
        assert_eq!(row.get("Agmarknet_Variety"), Some("Red"));
        assert_eq!(row.get("Agmarknet_MAX"), Some("2400"));
        assert_eq!(row.get("Agmarknet_MIN"), Some("1800"));
        assert_eq!(row.get("Agmarknet_Modal"), Some("2100"));
    }

    #[test]
    fn variety_row_skips_partial_groups() {
        let row = variety_row("Onion", &strings(&["Red", "2400"]));
        assert!(matches!(row, Extraction::Skipped(_)));
    }

    #[test]
    fn repeated_commodity_is_collected_once() {
        let mut seen = SeenItems::default();
        assert!(seen.skip_repeat("Onion").is_none());

        let rows = vec![variety_row("Onion", &strings(&["Red", "2400", "1800", "2100"]))];
        assert!(seen.record("Onion", &rows));

        assert!(matches!(seen.skip_repeat("Onion"), Some(Extraction::Skipped(_))));
        assert!(seen.skip_repeat("Potato").is_none());
    }

    #[test]
    fn commodity_without_rows_can_be_retried() {
        let mut seen = SeenItems::default();
        let partial = vec![variety_row("Tomato", &strings(&["Hybrid"]))];

        assert!(!seen.record("Tomato", &partial));
        assert!(seen.skip_repeat("Tomato").is_none());
    }

    #[test]
    fn xpath_literal_quotes() {
        assert_eq!(xpath_literal("Onion"), "'Onion'");
        assert_eq!(xpath_literal("Lady's Finger"), "\"Lady's Finger\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')"
        );
    }
}
