use async_trait::async_trait;
use scraper::Html;
use thirtyfour::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{
    page::{css, pause, select_text, type_into, wait_clickable, wait_displayed},
    SiteAdapter, WorkUnit,
};
use crate::{
    domain::{
        site::Site,
        table::{Extraction, Row},
    },
    error::ScrapeError,
};

const URL: &str = "https://www.jiomart.com/";
const SEARCH_INPUT: &str = "autocomplete-0-input";
const PRODUCT_CARD: &str = ".plp-card-wrapper";

#[derive(Debug, PartialEq)]
pub struct JioMartCard {
    pub title: String,
    pub offer: String,
    pub price: String,
    pub real_price: String,
}

impl JioMartCard {
    fn row(&self) -> Row {
        Row::new()
            .with("JioMart_Title", self.title.as_str())
            .with("JioMart_Offer", self.offer.as_str())
            .with("JioMart_Price", self.price.as_str())
            .with("JioMart_Real_Price", self.real_price.as_str())
    }
}

/// Extracts the first product card from its outer HTML.
pub fn parse_card(html: &str) -> Result<JioMartCard, String> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let required = |selector: &str, field: &str| {
        select_text(root, &css(selector)).ok_or_else(|| format!("product card has no {}", field))
    };

    Ok(JioMartCard {
        title: required("div.plp-card-details-name", "title")?,
        offer: select_text(root, &css("div.plp-card-details-discount"))
            .unwrap_or_else(|| "No offer".to_string()),
        price: required("span.jm-heading-xxs", "price")?,
        real_price: required("span.jm-body-xxs", "real price")?,
    })
}

pub struct JioMartAdapter {
    pincode: String,
}

impl JioMartAdapter {
    pub fn new(pincode: String) -> Self {
        JioMartAdapter { pincode }
    }
}

#[async_trait]
impl SiteAdapter<WebDriver> for JioMartAdapter {
    fn site(&self) -> Site {
        Site::JioMart
    }

    async fn setup(&mut self, driver: &WebDriver) -> Result<(), ScrapeError> {
        driver.goto(URL).await?;
        pause(5).await;

        wait_clickable(driver, By::Id("btn_pin_code_delivery"), 10)
            .await?
            .click()
            .await?;
        wait_clickable(driver, By::Id("btn_enter_pincode"), 10)
            .await?
            .click()
            .await?;

        let pincode_input = wait_displayed(driver, By::Id("rel_pincode"), 10).await?;
        type_into(&pincode_input, &self.pincode).await?;

        wait_clickable(driver, By::Id("btn_pincode_submit"), 10)
            .await?
            .click()
            .await?;
        pause(5).await;

        let delivery_location = driver
            .find(By::Id("delivery_city_pincode"))
            .await?
            .text()
            .await?;
        match delivery_location.contains(&self.pincode) {
            true => log::info!("JioMart location set to {}", self.pincode),
            false => log::warn!(
                "Failed to set the JioMart location, page shows '{}'",
                delivery_location
            ),
        }

        Ok(())
    }

    async fn scrape_unit(
        &mut self,
        driver: &WebDriver,
        unit: &WorkUnit,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError> {
        let term = unit.search_term();
        log::info!("Searching for '{}'...", term);

        driver.goto(URL).await?;
        pause(5).await;

        let search_input = wait_displayed(driver, By::Id(SEARCH_INPUT), 10).await?;
        type_into(&search_input, term).await?;
        search_input.send_keys(Key::Enter).await?;
        pause(10).await;

        if stop.is_cancelled() {
            return Ok(vec![]);
        }

        let card_html = wait_displayed(driver, By::Css(PRODUCT_CARD), 10)
            .await?
            .outer_html()
            .await?;

        Ok(vec![match parse_card(&card_html) {
            Ok(card) => Extraction::Extracted(card.row()),
            Err(reason) => Extraction::Skipped(reason),
        }])
    }
}
