use clap::Parser;
use taskbook::cli::{
    Args, Command, ServeArgs, build_config, init_logging, load_jwt_secret, open_database,
    run_client,
};
use taskbook::{init_cleanup, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Command::Serve(serve) => {
            init_logging(&args.log_format, "info");
            serve_api(serve).await;
        }
        Command::Client(client) => {
            init_logging(&args.log_format, "warn");
            if let Err(e) = run_client(client).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn serve_api(args: ServeArgs) {
    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let config = build_config(db, jwt_secret, args.cors_origins, args.no_rate_limit);
    init_cleanup(&config.db, config.clock.clone()).await;

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(_) => info!(address = %addr, "Listening"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
