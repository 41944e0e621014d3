use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("Element not found: {0}")]
    MissingElement(String),

    #[error("Site setup failed: {0}")]
    Setup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Could not open a browser session: {0}")]
    Session(ScrapeError),

    #[error("Output error: {0}")]
    Output(#[from] SpreadsheetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
