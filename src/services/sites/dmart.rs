use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use scraper::Html;
use thirtyfour::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{
    page::{css, pause, select_text, type_into, wait_clickable, wait_present},
    RetryPolicy, SiteAdapter, WorkUnit,
};
use crate::{
    domain::{
        site::Site,
        table::{Extraction, Row},
    },
    error::ScrapeError,
};

const URL: &str = "https://www.dmart.in";
const PINCODE_POPUP: &str = "pincode-widget_pincode-header__bR5DG";
const FIRST_PINCODE_RESULT: &str =
    "ul.pincode-widget_pincode-list___pWVx li.pincode-widget_pincode-item__qsZwZ button";
const CONFIRM_LOCATION: &str = "//button[text()='CONFIRM LOCATION']";
const SEARCH_BUTTON: &str = "button.search_searchButton__J9wVN";
const PRODUCT_CARD: &str = "div.vertical-card_card-vertical__Q8seS";
const VARIANT_SELECT: &str = "demo-customized-select";
const VARIANT_OPTIONS: &str = "ul.MuiMenu-list li";
const OPTION_WEIGHT: &str = "span[style='padding-left: 0px;']";
const OPTION_PRICE: &str = "span.bootstrap-select_infoTxt-value__kT4zZ";

const NOT_AVAILABLE: &str = "N/A";

pub struct DMartAdapter {
    location: String,
}

/// Fields of the first search result card.
#[derive(Debug, PartialEq)]
pub struct DMartCard {
    pub title: String,
    pub mrp: String,
    pub price: String,
    pub offer: String,
    pub has_variants: bool,
}

impl DMartCard {
    fn row(&self, variants: &[String]) -> Row {
        Row::new()
            .with("DMart_Title", self.title.as_str())
            .with("DMart_MRP", self.mrp.as_str())
            .with("DMart_Price", self.price.as_str())
            .with("DMart_Offer", self.offer.as_str())
            .with("DMart_Dropdown_Options", variants.iter().join(", "))
    }
}

/// Extracts a product card from its outer HTML.
pub fn parse_card(html: &str) -> DMartCard {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let text_or_na = |selector: &str| {
        select_text(root, &css(selector)).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    // The first amount is the struck-through MRP, the second the selling price.
    let price = root
        .select(&css("span.vertical-card_amount__80Zwk"))
        .nth(1)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    DMartCard {
        title: text_or_na("div.vertical-card_title__pMGg9"),
        mrp: text_or_na(r#"span[style="text-decoration: line-through;"]"#),
        price,
        offer: text_or_na("div.vertical-card_section-right__4rjsN"),
        has_variants: root.select(&css("div.MuiFormControl-root")).next().is_some(),
    }
}

impl DMartAdapter {
    pub fn new(location: String) -> Self {
        DMartAdapter { location }
    }

    /// Opens the variant select and collects `weight: price` entries. Stops
    /// at the first failure and keeps what was read so far.
    async fn variant_options(
        &self,
        driver: &WebDriver,
        title: &str,
        stop: &CancellationToken,
    ) -> Vec<String> {
        let mut options = vec![];
        if let Err(e) = self.read_variants(driver, stop, &mut options).await {
            log::error!(
                "An error occurred while handling the dropdown for {}: {}",
                title,
                e
            );
        }
        options
    }

    async fn read_variants(
        &self,
        driver: &WebDriver,
        stop: &CancellationToken,
        options: &mut Vec<String>,
    ) -> Result<(), ScrapeError> {
        wait_clickable(driver, By::Id(VARIANT_SELECT), 10)
            .await?
            .click()
            .await?;
        pause(2).await;

        wait_present(driver, By::Css(VARIANT_OPTIONS), 10).await?;
        for option in driver.find_all(By::Css(VARIANT_OPTIONS)).await? {
            if stop.is_cancelled() {
                break;
            }

            let weight = option.find(By::Css(OPTION_WEIGHT)).await?.text().await?;
            let price = option.find(By::Css(OPTION_PRICE)).await?.text().await?;
            options.push(format!("{}: {}", weight.trim(), price.trim()));
        }

        driver.find(By::Css("body")).await?.click().await?;
        pause(1).await;

        Ok(())
    }
}

#[async_trait]
impl SiteAdapter<WebDriver> for DMartAdapter {
    fn site(&self) -> Site {
        Site::DMart
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(3))
    }

    async fn setup(&mut self, driver: &WebDriver) -> Result<(), ScrapeError> {
        driver.goto(URL).await?;
        pause(5).await;

        let popup = driver.find(By::ClassName(PINCODE_POPUP)).await?;
        popup
            .find(By::Id("pincodeInput"))
            .await?
            .send_keys(self.location.as_str())
            .await?;
        pause(2).await;

        driver
            .find(By::Css(FIRST_PINCODE_RESULT))
            .await?
            .click()
            .await?;
        pause(5).await;

        driver
            .find(By::XPath(CONFIRM_LOCATION))
            .await?
            .click()
            .await?;
        pause(5).await;

        log::info!("DMart location set to {}", self.location);
        Ok(())
    }

    async fn scrape_unit(
        &mut self,
        driver: &WebDriver,
        unit: &WorkUnit,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError> {
        let term = unit.search_term();

        let search_input = wait_clickable(driver, By::Id("scrInput"), 10).await?;
        type_into(&search_input, term).await?;
        wait_clickable(driver, By::Css(SEARCH_BUTTON), 10)
            .await?
            .click()
            .await?;
        pause(5).await;

        let card_html = wait_present(driver, By::Css(PRODUCT_CARD), 10)
            .await?
            .outer_html()
            .await?;
        let card = parse_card(&card_html);

        let variants = match card.has_variants && !stop.is_cancelled() {
            true => self.variant_options(driver, &card.title, stop).await,
            false => vec![],
        };

        Ok(vec![Extraction::Extracted(card.row(&variants))])
    }
}
