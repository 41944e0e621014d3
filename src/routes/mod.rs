pub mod dashboard_route;
pub mod default_route;
pub mod download_route;
pub mod scrape_route;
pub mod upload_route;

pub use dashboard_route::*;
pub use default_route::*;
pub use download_route::*;
pub use scrape_route::*;
pub use upload_route::*;
