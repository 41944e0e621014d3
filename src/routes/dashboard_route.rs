use actix_web::{get, web, HttpResponse};
use askama::Template;

use crate::{
    domain::site::Site,
    services::{ControlPanel, Download, RunStatus},
};

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    sites: Vec<&'static str>,
    status: String,
    running: bool,
    terms: usize,
    trace: Vec<String>,
    downloads: Vec<Download>,
}

fn status_text(status: &RunStatus) -> String {
    match status {
        RunStatus::Idle => "Idle".to_string(),
        RunStatus::Running => "Running".to_string(),
        RunStatus::Completed => "Completed".to_string(),
        RunStatus::Cancelled => "Stopped".to_string(),
        RunStatus::Failed(e) => format!("Failed: {}", e),
    }
}

#[get("/")]
async fn dashboard(panel: web::Data<ControlPanel>) -> HttpResponse {
    let snapshot = panel.snapshot();
    let template = DashboardTemplate {
        sites: Site::ALL.iter().map(|s| s.name()).collect(),
        status: status_text(&snapshot.status),
        running: snapshot.status == RunStatus::Running,
        terms: snapshot.terms,
        trace: snapshot.trace,
        downloads: snapshot.downloads,
    };

    match template.render() {
        Ok(body) => HttpResponse::Ok().content_type("text/html").body(body),
        Err(e) => {
            log::error!("Failed to render the dashboard: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
