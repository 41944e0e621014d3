use std::net::TcpListener;

use actix_files::Files;
use actix_web::{dev::Server, middleware::Logger, web::Data, App, HttpServer};

use crate::{
    configuration::Settings,
    routes::{dashboard_route, default_route, download_route, scrape_route, upload_route},
    services::ControlPanel,
};

pub fn run(
    listener: TcpListener,
    settings: Settings,
    panel: Data<ControlPanel>,
) -> Result<Server, std::io::Error> {
    let settings = Data::new(settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/static", "./templates/static").prefer_utf8(true))
            .service(default_route::health_check)
            .service(dashboard_route::dashboard)
            .service(upload_route::upload)
            .service(scrape_route::start_scrape)
            .service(scrape_route::stop_scrape)
            .service(scrape_route::scrape_status)
            .service(download_route::download)
            .app_data(settings.clone())
            .app_data(panel.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
