use std::sync::Arc;

use evlog::{meta, LogEventConsolePrinter, Logger};
use tokio::net::TcpListener;
use tokio::signal;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::db::dbclient::DBClient;
use crate::handler::AppState;
use crate::runtime::{get_logger, set_logger};
use crate::support::mailer::LogMailer;
use crate::support::password::BcryptHasher;

mod clock;
mod config;
mod db;
mod handler;
mod helpers;
mod routes;
mod runtime;
mod service;
mod support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let mut logger = Logger::default();
    logger.register(LogEventConsolePrinter::default());
    set_logger(logger);

    let config = Config::load()?;

    let db_client = DBClient::new(&config.database_url, config.max_connections).await?;
    get_logger().info("Connected to database.", meta! {
        "MaxConnections" => config.max_connections,
    });

    let mailer = LogMailer {
        from: config.mail_from.clone(),
    };

    let state = AppState::from_db(
        db_client,
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        Arc::new(mailer),
        Arc::new(SystemClock),
        &config,
    );

    let listener = TcpListener::bind(&config.bind).await?;
    get_logger().info("Server listening.", meta! {
        "Address" => config.bind,
    });

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    get_logger().info("Server stopped.", meta! {
        "Address" => config.bind,
    });

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            get_logger().error("Failed to install Ctrl+C handler.", meta! {
                "Error" => e,
            });
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                get_logger().error("Failed to install SIGTERM handler.", meta! {
                    "Error" => e,
                });
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    get_logger().info("Shutdown signal received.", meta! {
        "Signal" => received,
    });
}
