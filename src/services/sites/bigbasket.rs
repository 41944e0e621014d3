use async_trait::async_trait;
use itertools::Itertools;
use thirtyfour::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{
    page::{child_text, pause, type_into, wait_present},
    SiteAdapter, WorkUnit,
};
use crate::{
    domain::{
        site::Site,
        table::{Extraction, Row},
    },
    error::ScrapeError,
    services::output_dir::OutputDir,
};

const URL: &str = "https://www.bigbasket.com/";
const SEARCH_BAR: &str = r#"input[placeholder="Search for Products..."]"#;
const PRODUCT_CARD: &str = "div.SKUDeck___StyledDiv-sc-1e5d9gk-0";
const BRAND: &str = "span.BrandName___StyledLabel2-sc-hssfrl-1";
const PRODUCT_NAME: &str = "h3.block";
const PRICE: &str = "span.Pricing___StyledLabel-sc-pldi2d-1";
const ORIGINAL_PRICE: &str = "span.Pricing___StyledLabel2-sc-pldi2d-2";
const DISCOUNT: &str = "span.Tags___StyledLabel2-sc-aeruf4-1";
const PACK_SIZE: &str = "span.PackChanger___StyledLabel-sc-newjpv-1";
const DROPDOWN: &str = r#"ul[role="listbox"]"#;
const DROPDOWN_OPTION: &str = r#"ul[role="listbox"] li div.PackChanger___StyledDiv-sc-newjpv-4"#;
const OPTION_SIZE: &str = r"div.w-3\/4";
const OPTION_PRICE: &str = "span.PackChanger___StyledLabel4-sc-newjpv-6";

const MAX_CARDS: usize = 4;
const NOT_AVAILABLE: &str = "N/A";

pub struct BigBasketAdapter {
    output: OutputDir,
}

struct Card {
    title: String,
    price: String,
    original_price: String,
    discount: String,
}

impl Card {
    fn row(&self, pack_size: &str, dropdown_prices: &str) -> Row {
        Row::new()
            .with("BigBasket_Title", self.title.as_str())
            .with("BigBasket_Price", self.price.as_str())
            .with("BigBasket_Original_Price", self.original_price.as_str())
            .with("BigBasket_Discount", self.discount.as_str())
            .with("BigBasket_Pack_Size", pack_size)
            .with("BigBasket_Dropdown_Prices", dropdown_prices)
    }
}

impl BigBasketAdapter {
    pub fn new(output: OutputDir) -> Self {
        BigBasketAdapter { output }
    }

    async fn read_card(
        &self,
        driver: &WebDriver,
        card: &WebElement,
        stop: &CancellationToken,
    ) -> Result<Vec<Extraction>, ScrapeError> {
        let (Some(brand), Some(name)) = (
            child_text(card, BRAND).await,
            child_text(card, PRODUCT_NAME).await,
        ) else {
            return Ok(vec![Extraction::Skipped("product card without title".into())]);
        };
        let title = format!("{} {}", brand, name);

        let Some(price) = child_text(card, PRICE).await else {
            return Ok(vec![Extraction::Skipped(format!("{} has no price", title))]);
        };

        let card_data = Card {
            title,
            price,
            original_price: child_text(card, ORIGINAL_PRICE)
                .await
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            discount: child_text(card, DISCOUNT)
                .await
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        };

        let pack_sizes = card.find_all(By::Css(PACK_SIZE)).await?;
        if pack_sizes.is_empty() {
            log::info!("Appended data for product: {} with no dropdown", card_data.title);
            return Ok(vec![Extraction::Extracted(
                card_data.row(NOT_AVAILABLE, NOT_AVAILABLE),
            )]);
        }

        let mut extractions = vec![];
        for size in pack_sizes {
            if stop.is_cancelled() {
                break;
            }

            let size_text = size.text().await?;
            driver
                .action_chain()
                .move_to_element_center(&size)
                .click()
                .perform()
                .await?;
            let dropdown_prices = self.dropdown_prices(driver, stop).await;

            log::info!(
                "Appended data for product: {} with size {}",
                card_data.title,
                size_text
            );
            extractions.push(Extraction::Extracted(
                card_data.row(&size_text, &dropdown_prices),
            ));
        }

        Ok(extractions)
    }

    /// Reads the open pack size list as `size: price` pairs.
    async fn dropdown_prices(&self, driver: &WebDriver, stop: &CancellationToken) -> String {
        if stop.is_cancelled() {
            return NOT_AVAILABLE.to_string();
        }

        match self.read_dropdown(driver, stop).await {
            Ok(Some(options)) => join_options(&options),
            Ok(None) => NOT_AVAILABLE.to_string(),
            Err(e) => {
                log::error!("Failed to get dropdown prices: {}", e);
                NOT_AVAILABLE.to_string()
            }
        }
    }

    async fn read_dropdown(
        &self,
        driver: &WebDriver,
        stop: &CancellationToken,
    ) -> Result<Option<Vec<String>>, ScrapeError> {
        wait_present(driver, By::Css(DROPDOWN), 10).await?;
        pause(2).await;

        let mut options = vec![];
        for option in driver.find_all(By::Css(DROPDOWN_OPTION)).await? {
            if stop.is_cancelled() {
                return Ok(None);
            }

            let size = child_text(&option, OPTION_SIZE)
                .await
                .ok_or_else(|| ScrapeError::MissingElement("pack size label".into()))?;
            let price = child_text(&option, OPTION_PRICE)
                .await
                .ok_or_else(|| ScrapeError::MissingElement("pack size price".into()))?;
            options.push(format!("{}: {}", size, price));
        }

        Ok(Some(options))
    }
}

#[async_trait]
impl SiteAdapter<WebDriver> for BigBasketAdapter {
    fn site(&self) -> Site {
        Site::BigBasket
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
        let term = unit.search_term();
        log::info!("Searching for term: {}", term);

        let search_bar = wait_present(driver, By::Css(SEARCH_BAR), 20).await?;
        type_into(&search_bar, term).await?;
        search_bar.send_keys(Key::Enter).await?;

        wait_present(driver, By::Css(PRODUCT_CARD), 20).await?;
        pause(5).await;

        let cards = driver.find_all(By::Css(PRODUCT_CARD)).await?;
        log::info!("Found {} product cards for term: {}", cards.len(), term);

        let mut extractions = vec![];
        for card in cards.iter().take(MAX_CARDS) {
            if stop.is_cancelled() {
                break;
            }

            match self.read_card(driver, card, stop).await {
                Ok(rows) => extractions.extend(rows),
                Err(e) => {
                    log::error!("Error processing a product card: {}", e);
                    extractions.push(Extraction::Skipped(format!("product card: {}", e)));
                }
            }
        }

        Ok(extractions)
    }

    async fn on_unit_failed(&mut self, driver: &WebDriver, unit: &WorkUnit, _error: &ScrapeError) {
        let path = self.output.debug_page(Site::BigBasket, unit.search_term());

        let dumped = match driver.source().await {
            Ok(source) => std::fs::write(&path, source).map_err(ScrapeError::from),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = dumped {
            log::error!("Could not save page source for '{}': {}", unit.label(), e);
        }
    }
}

/// Joins dropdown entries, `N/A` when there are none.
pub fn join_options(options: &[String]) -> String {
    match options.is_empty() {
        true => NOT_AVAILABLE.to_string(),
        false => options.iter().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_options_formats_pairs() {
        let options = vec!["500 g: ₹25".to_string(), "1 kg: ₹48".to_string()];
        assert_eq!(join_options(&options), "500 g: ₹25, 1 kg: ₹48");
    }

    #[test]
    fn join_options_defaults_to_not_available() {
        assert_eq!(join_options(&[]), "N/A");
    }

    #[test]
    fn card_row_fills_every_bigbasket_column() {
        let card = Card {
            title: "Fresho Onion".into(),
            price: "₹40".into(),
            original_price: "₹50".into(),
            discount: "20% OFF".into(),
        };

        let row = card.row("1 kg", "N/A");

        for column in Site::BigBasket.columns() {
            assert!(row.get(column).is_some(), "{} missing", column);
        }
        assert_eq!(row.get("BigBasket_Pack_Size"), Some("1 kg"));
    }
}
