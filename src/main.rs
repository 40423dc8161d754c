use docbridge::{api, config, logging, pipeline::WebhookPipeline};
use std::{net::Ipv4Addr, sync::Arc};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    config::init_config();

    let config = config::get_config();
    let pipeline = WebhookPipeline::from_config(config).expect("Failed to initialize pipeline");
    let app = api::create_router(Arc::new(pipeline));

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);
    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "Server terminated");
    }
}
