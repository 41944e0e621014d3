use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

pub const SEARCH_TERM: &str = "Search Term";
pub const SOURCE: &str = "Source";

/// Search term recorded for rows that were not produced by a term lookup.
pub const NO_SEARCH_TERM: &str = "N/A";

pub const MASTER_FILE_NAME: &str = "master_output_for_all.xlsx";
pub const MASTER_LABEL: &str = "Master";

/// Column order of every table written to disk.
pub const UNIFIED_SCHEMA: [&str; 26] = [
    SEARCH_TERM,
    "JioMart_Title",
    "JioMart_Offer",
    "JioMart_Price",
    "JioMart_Real_Price",
    SOURCE,
    "DMart_Title",
    "DMart_MRP",
    "DMart_Price",
    "DMart_Offer",
    "DMart_Dropdown_Options",
    "BigBasket_Title",
    "BigBasket_Price",
    "BigBasket_Original_Price",
    "BigBasket_Discount",
    "BigBasket_Pack_Size",
    "BigBasket_Dropdown_Prices",
    "Hyperpure_Product_Title",
    "Hyperpure_Price",
    "Hyperpure_Category",
    "Hyperpure_SUPERSAVER_Information",
    "Agmarknet_Commodity",
    "Agmarknet_Variety",
    "Agmarknet_MAX",
    "Agmarknet_MIN",
    "Agmarknet_Modal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Site {
    Agmarknet,
    BigBasket,
    DMart,
    Hyperpure,
    JioMart,
}

impl Site {
    /// Processing order of a run.
    pub const ALL: [Site; 5] = [
        Site::Agmarknet,
        Site::BigBasket,
        Site::DMart,
        Site::Hyperpure,
        Site::JioMart,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Site::Agmarknet => "Agmarknet",
            Site::BigBasket => "BigBasket",
            Site::DMart => "DMart",
            Site::Hyperpure => "Hyperpure",
            Site::JioMart => "JioMart",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Site::Agmarknet => "agmarknet_vegetable_prices.xlsx",
            Site::BigBasket => "bigbasket_Products_price.xlsx",
            Site::DMart => "dmart_product_data.xlsx",
            Site::Hyperpure => "hyperpure_product_data.xlsx",
            Site::JioMart => "jiomart_product_data.xlsx",
        }
    }

    /// Site specific columns, without `Search Term` and `Source`.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Site::Agmarknet => &UNIFIED_SCHEMA[21..26],
            Site::BigBasket => &UNIFIED_SCHEMA[11..17],
            Site::DMart => &UNIFIED_SCHEMA[6..11],
            Site::Hyperpure => &UNIFIED_SCHEMA[17..21],
            Site::JioMart => &UNIFIED_SCHEMA[1..5],
        }
    }

    /// Natural column layout of a freshly scraped table for this site.
    pub fn table_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![SEARCH_TERM];
        columns.extend_from_slice(self.columns());
        columns.push(SOURCE);
        columns
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown site: {0}")]
pub struct UnknownSite(pub String);

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}
