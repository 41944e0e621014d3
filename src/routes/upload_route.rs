use actix_multipart::form::{bytes::Bytes, MultipartForm};
use actix_web::{post, web, HttpResponse};

use crate::{domain::search_terms::parse_search_terms, services::ControlPanel};

#[derive(MultipartForm)]
pub struct UploadForm {
    #[multipart(limit = "10MB")]
    file: Bytes,
}

/// Replaces the search terms with the ones in the uploaded workbook.
#[post("/upload")]
async fn upload(
    panel: web::Data<ControlPanel>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> HttpResponse {
    match parse_search_terms(&form.file.data) {
        Ok(terms) => {
            log::info!("Uploaded {} search terms", terms.len());
            panel.set_terms(terms);
            HttpResponse::SeeOther()
                .insert_header(("Location", "/"))
                .finish()
        }
        Err(e) => {
            log::error!("Rejected search term upload: {}", e);
            HttpResponse::BadRequest().body(format!("Invalid search term file: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use rust_xlsxwriter::Workbook;

    use super::*;

    const BOUNDARY: &str = "mandi-test-boundary";

    fn multipart_body(file: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"terms.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(file: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(file))
    }

    fn term_workbook(terms: &[&str]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Vegetables").unwrap();
        for (i, term) in terms.iter().enumerate() {
            sheet.write_string(i as u32 + 1, 0, *term).unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }

    #[actix_web::test]
    async fn uploaded_terms_replace_the_old_ones() {
        let panel = web::Data::new(ControlPanel::new());
        panel.set_terms(vec!["Okra".into()]);
        let app = test::init_service(App::new().app_data(panel.clone()).service(upload)).await;

        let req = upload_request(&term_workbook(&["Onion", "Potato"])).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(panel.snapshot().terms, 2);
    }

    #[actix_web::test]
    async fn garbage_upload_is_rejected() {
        let panel = web::Data::new(ControlPanel::new());
        let app = test::init_service(App::new().app_data(panel.clone()).service(upload)).await;

        let req = upload_request(b"not a workbook").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(panel.snapshot().terms, 0);
    }
}
