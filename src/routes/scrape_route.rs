use actix_web::{get, post, web, HttpResponse};

use crate::{
    configuration::Settings,
    domain::site::{Site, UnknownSite},
    services::{spawn_scrape, ControlPanel, Orchestrator, StartError},
};

/// Reads the repeated `site` fields of the start form.
fn selected_sites(body: &[u8]) -> Result<Vec<Site>, UnknownSite> {
    url::form_urlencoded::parse(body)
        .filter(|(key, _)| key == "site")
        .map(|(_, value)| value.parse())
        .collect()
}

#[post("/start")]
async fn start_scrape(
    panel: web::Data<ControlPanel>,
    settings: web::Data<Settings>,
    body: web::Bytes,
) -> HttpResponse {
    let sites = match selected_sites(&body) {
        Ok(sites) => sites,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };

    let (terms, stop) = match panel.begin_run(&sites) {
        Ok(run) => run,
        Err(e @ StartError::AlreadyRunning) => return HttpResponse::Conflict().body(e.to_string()),
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };

    log::info!("Starting a run over {:?} for {} terms", sites, terms.len());
    spawn_scrape(
        panel.into_inner(),
        Orchestrator::with_browser(&settings),
        sites,
        terms,
        stop,
    );

    HttpResponse::SeeOther()
        .insert_header(("Location", "/"))
        .finish()
}

#[post("/stop")]
async fn stop_scrape(panel: web::Data<ControlPanel>) -> HttpResponse {
    match panel.request_stop() {
        true => HttpResponse::SeeOther()
            .insert_header(("Location", "/"))
            .finish(),
        false => HttpResponse::Conflict().body("No scraping run is in progress"),
    }
}

#[get("/status")]
async fn scrape_status(panel: web::Data<ControlPanel>) -> HttpResponse {
    HttpResponse::Ok().json(panel.snapshot())
}
