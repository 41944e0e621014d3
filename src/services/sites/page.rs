use std::time::Duration;

use thirtyfour::prelude::*;

use crate::error::ScrapeError;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fixed pause to let dynamic content settle.
pub async fn pause(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

pub async fn wait_present(
    driver: &WebDriver,
    by: By,
    timeout_secs: u64,
) -> Result<WebElement, ScrapeError> {
    Ok(driver
        .query(by)
        .wait(Duration::from_secs(timeout_secs), POLL_INTERVAL)
        .first()
        .await?)
}

pub async fn wait_clickable(
    driver: &WebDriver,
    by: By,
    timeout_secs: u64,
) -> Result<WebElement, ScrapeError> {
    Ok(driver
        .query(by)
        .and_clickable()
        .wait(Duration::from_secs(timeout_secs), POLL_INTERVAL)
        .first()
        .await?)
}

pub async fn wait_displayed(
    driver: &WebDriver,
    by: By,
    timeout_secs: u64,
) -> Result<WebElement, ScrapeError> {
    Ok(driver
        .query(by)
        .and_displayed()
        .wait(Duration::from_secs(timeout_secs), POLL_INTERVAL)
        .first()
        .await?)
}

/// Trimmed text of the first match of `css` below `element`, if any.
pub async fn child_text(element: &WebElement, css: &str) -> Option<String> {
    match element.find(By::Css(css)).await {
        Ok(el) => el.text().await.ok().map(|t| t.trim().to_string()),
        Err(_) => None,
    }
}

/// Clears an input and types `text` into it.
pub async fn type_into(input: &WebElement, text: &str) -> Result<(), ScrapeError> {
    input.clear().await?;
    input.send_keys(text).await?;
    Ok(())
}

/// Parses a selector literal of this crate.
pub fn css(selector: &str) -> scraper::Selector {
    scraper::Selector::parse(selector).expect("selector literals are valid CSS")
}

/// Trimmed text of the first match of `selector` inside `element`.
pub fn select_text(element: scraper::ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}
