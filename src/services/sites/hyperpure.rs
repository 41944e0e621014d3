use async_trait::async_trait;
use itertools::Itertools;
use scraper::Html;
use thirtyfour::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{
    page::{css, pause, select_text, type_into, wait_present},
    until_stopped, SiteAdapter, WorkUnit,
};
use crate::{
    domain::{
        site::Site,
        table::{Extraction, Row},
    },
    error::ScrapeError,
};

const URL: &str = "https://www.hyperpure.com/in/fruits-vegetables?&type=CATALOG&cheapestProduct=0&discountedProduct=0&entity_id=&entity_type=&parent_reference_id=96887735-46cc-4fdb-8d19-65387afdc926-1721711561231890664&parent_reference_type=&search_source=&source_page=&sub_reference_id=&sub_reference_type=";
const SEARCH_INPUT: &str = "input.SearchInput_searchInput__8P47H";
const SUGGESTIONS: &str = "#react-autowhatever-1 .SearchInput_suggestionsList__dx_Xc";
const FIRST_SUGGESTION: &str = "#react-autowhatever-1--item-0";
const CATALOG_CARD: &str = "CatalogCard_catalogCard__mGd27";

#[derive(Debug, PartialEq)]
pub struct HyperpureProduct {
    pub title: String,
    pub price: String,
    pub category: String,
    pub supersaver: String,
}

impl HyperpureProduct {
    fn row(&self) -> Row {
        Row::new()
            .with("Hyperpure_Product_Title", self.title.as_str())
            .with("Hyperpure_Price", self.price.as_str())
            .with("Hyperpure_Category", self.category.as_str())
            .with("Hyperpure_SUPERSAVER_Information", self.supersaver.as_str())
    }
}

/// Extracts every catalog card of a rendered result page. Cards without a
/// title or a price are reported as `Err` with the reason.
pub fn parse_catalog(html: &str) -> Vec<Result<HyperpureProduct, String>> {
    let document = Html::parse_document(html);
    let card_selector = css("div.CatalogCard_catalogCard__mGd27");
    let title_selector = css("div.word-break.CatalogCard_truncate__dW5IB");
    let price_selector = css("span.CatalogCard_price__Pf25D");
    let offer_tag_selector = css("div.CatalogCard_offerTag__7QmgG");
    let offer_selector = css("div.CatalogCard_offerV2__V6o1z");

    document
        .select(&card_selector)
        .map(|card| {
            let title = select_text(card, &title_selector)
                .ok_or_else(|| "catalog card without title".to_string())?;
            let price = select_text(card, &price_selector)
                .ok_or_else(|| format!("{} has no price", title))?;
            let category = title.split(',').next().unwrap_or_default().to_string();

            let supersaver = match card.select(&offer_tag_selector).next() {
                Some(_) => card
                    .select(&offer_selector)
                    .map(|offer| offer.text().collect::<String>().trim().to_string())
                    .join(" | "),
                None => "N/A".to_string(),
            };

            Ok(HyperpureProduct {
                title,
                price,
                category,
                supersaver,
            })
        })
        .collect()
}

pub struct HyperpureAdapter;

impl HyperpureAdapter {
    pub fn new() -> Self {
        HyperpureAdapter
    }
}

impl Default for HyperpureAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteAdapter<WebDriver> for HyperpureAdapter {
    fn site(&self) -> Site {
        Site::Hyperpure
    }

    async fn setup(&mut self, driver: &WebDriver) -> Result<(), ScrapeError> {
        driver.goto(URL).await?;
        pause(5).await;
        Ok(())
    }

    async fn scrape_unit(
        &mut self,
        driver: &WebDriver,
        unit: &WorkUnit,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError> {
        log::info!("Searching for {}...", unit.search_term());

        let search_input = wait_present(driver, By::Css(SEARCH_INPUT), 20).await?;
        type_into(&search_input, unit.search_term()).await?;

        wait_present(driver, By::Css(SUGGESTIONS), 20).await?;
        driver
            .find(By::Css(FIRST_SUGGESTION))
            .await?
            .click()
            .await?;

        wait_present(driver, By::ClassName(CATALOG_CARD), 20).await?;
        let source = driver.source().await?;

        let products = parse_catalog(&source).into_iter().map(|product| match product {
            Ok(product) => Extraction::Extracted(product.row()),
            Err(reason) => Extraction::Skipped(reason),
        });

        Ok(until_stopped(products, stop))
    }
}
