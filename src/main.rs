use std::env;

use log::{error, info};

use faultbridge::api;

#[tokio::main]
async fn main() {
    // ロガーの初期化
    env_logger::init();

    // アプリケーションの構築
    let app = match api::app() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to build application: {}", e);
            std::process::exit(1);
        }
    };

    let port = match env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse::<u16>() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error parsing port: {}", e);
            std::process::exit(1);
        }
    };
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    info!("Starting FaultBridge demo on {}:{}", host, port);
    if let Err(e) = faultbridge::cloudrun::run_cloud_run(app, &host, port).await {
        eprintln!("HTTP server error: {}", e);
        std::process::exit(1);
    }
}
