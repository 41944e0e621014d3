use std::net::TcpListener;

use actix_web::web;
use env_logger::Env;
use mandi::{configuration::get_configuration, services::ControlPanel, startup::run};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    log::info!("Serving the control panel on http://{}", address);

    let panel = web::Data::new(ControlPanel::new());

    run(listener, configuration, panel)?.await
}
