use actix_files::NamedFile;
use actix_web::{
    get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpRequest, HttpResponse, Responder,
};

use crate::services::ControlPanel;

/// Serves a file of the last run: a site name or "Master".
#[get("/download/{label}")]
async fn download(
    req: HttpRequest,
    panel: web::Data<ControlPanel>,
    label: web::Path<String>,
) -> HttpResponse {
    let Some(link) = panel.download(&label) else {
        return HttpResponse::NotFound().body(format!("No {} file in the last run", label));
    };

    match NamedFile::open_async(&link.file).await {
        Ok(file) => file
            .set_content_disposition(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(format!(
                    "{}_data.xlsx",
                    link.label
                ))],
            })
            .respond_to(&req)
            .map_into_boxed_body(),
        Err(e) => {
            log::error!("Failed to open {}: {:?}", link.file.to_string_lossy(), e);
            HttpResponse::NotFound().finish()
        }
    }
}
