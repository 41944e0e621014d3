use async_trait::async_trait;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

use crate::{configuration::WebDriverSettings, error::ScrapeError};

/// Source of the browser session a run borrows to its site adapters.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Send + Sync;

    async fn open(&self) -> Result<Self::Session, ScrapeError>;

    async fn close(&self, session: Self::Session);
}

/// Opens Chrome sessions on a WebDriver server.
pub struct Droid {
    settings: WebDriverSettings,
}

impl Droid {
    pub fn new(settings: WebDriverSettings) -> Self {
        Droid { settings }
    }
}

#[async_trait]
impl SessionProvider for Droid {
    type Session = WebDriver;

    async fn open(&self) -> Result<WebDriver, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();
        if self.settings.headless {
            caps.set_headless()?;
        }
        caps.set_disable_gpu()?;
        caps.set_no_sandbox()?;
        caps.set_disable_dev_shm_usage()?;
        caps.add_arg(&format!(
            "--window-size={},{}",
            self.settings.window_width, self.settings.window_height
        ))?;

        let driver = WebDriver::new(self.settings.url.as_str(), caps).await?;
        log::info!("Opened browser session on {}", self.settings.url);

        Ok(driver)
    }

    async fn close(&self, session: WebDriver) {
        match session.quit().await {
            Ok(_) => log::info!("Closed browser session"),
            Err(e) => log::error!("Failed to close browser session: {:?}", e),
        }
    }
}
