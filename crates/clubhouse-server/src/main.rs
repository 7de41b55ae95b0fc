//! Clubhouse Server
//!
//! gRPC server for member accounts and the premium membership workflow.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tonic::transport::Server;
use tracing::{info, warn};

use clubhouse_core::config::load_config;
use clubhouse_core::tracing_init::init_tracing;
use clubhouse_proto::v1::auth_service_server::AuthServiceServer;
use clubhouse_proto::v1::premium_admin_service_server::PremiumAdminServiceServer;
use clubhouse_proto::v1::premium_service_server::PremiumServiceServer;

use clubhouse_server::auth::JwtManager;
use clubhouse_server::blob::LocalBlobStore;
use clubhouse_server::premium::PremiumWorkflow;
use clubhouse_server::server::{
    AuthServiceImpl, PremiumAdminServiceImpl, PremiumServiceImpl, jwt_interceptor,
};
use clubhouse_server::storage::ClubhouseDatabase;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Parser, Debug)]
#[command(name = "clubhouse-server")]
#[command(version, about = "Clubhouse server - member accounts and premium workflow")]
struct Args {
    /// Path to a JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Directory where payment proofs are stored.
    #[arg(long)]
    blob_root: Option<PathBuf>,

    /// JWT secret key.
    #[arg(long, env = "CLUBHOUSE_JWT_SECRET", default_value = DEV_JWT_SECRET)]
    jwt_secret: String,

    /// Access token TTL in seconds.
    #[arg(long)]
    access_ttl: Option<i64>,

    /// Refresh token TTL in seconds.
    #[arg(long)]
    refresh_ttl: Option<i64>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,

    /// Grant the admin role to an existing user at startup.
    #[arg(long, value_name = "USERNAME")]
    bootstrap_admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(ttl) = args.access_ttl {
        config.auth.access_ttl_secs = ttl;
    }
    if let Some(ttl) = args.refresh_ttl {
        config.auth.refresh_ttl_secs = ttl;
    }
    if args.log_json {
        config.logging.json = true;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting clubhouse-server"
    );

    if args.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the built-in development JWT secret; set CLUBHOUSE_JWT_SECRET in production");
    }

    let db_path = match args.db_path.or_else(|| config.server.database_path.clone()) {
        Some(path) => path,
        None => default_data_dir()?.join("clubhouse.db"),
    };
    info!(path = %db_path.display(), "Opening clubhouse database");
    let db = ClubhouseDatabase::open(&db_path).await?;

    if let Some(username) = &args.bootstrap_admin {
        db.set_admin(username, true)
            .await
            .with_context(|| format!("Cannot grant admin role to {username}"))?;
        info!(username = %username, "Admin role granted");
    }

    let blob_root = match args.blob_root.or_else(|| config.server.blob_root.clone()) {
        Some(path) => path,
        None => default_data_dir()?.join("proofs"),
    };
    info!(path = %blob_root.display(), "Storing payment proofs");
    let blobs = Arc::new(LocalBlobStore::new(blob_root));

    let jwt = Arc::new(JwtManager::new(
        args.jwt_secret.as_bytes(),
        config.auth.access_ttl_secs,
        config.auth.refresh_ttl_secs,
    ));

    let workflow = Arc::new(PremiumWorkflow::new(db.clone(), blobs, config.premium));

    // Build services
    let auth = AuthServiceImpl::new(db, Arc::clone(&jwt));
    let premium = PremiumServiceImpl::new(Arc::clone(&workflow));
    let admin = PremiumAdminServiceImpl::new(workflow);

    let jwt_check = jwt_interceptor(jwt);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<AuthServiceServer<AuthServiceImpl>>()
        .await;
    health_reporter
        .set_serving::<PremiumServiceServer<PremiumServiceImpl>>()
        .await;
    health_reporter
        .set_serving::<PremiumAdminServiceServer<PremiumAdminServiceImpl>>()
        .await;

    let grpc_router = Server::builder()
        .http2_keepalive_interval(Some(Duration::from_secs(30)))
        .http2_keepalive_timeout(Some(Duration::from_secs(10)))
        .add_service(health_service)
        .add_service(AuthServiceServer::new(auth))
        .add_service(PremiumServiceServer::with_interceptor(
            premium,
            jwt_check.clone(),
        ))
        .add_service(PremiumAdminServiceServer::with_interceptor(
            admin, jwt_check,
        ));

    info!(addr = %config.server.addr, "Clubhouse server listening");

    tokio::select! {
        result = grpc_router.serve(config.server.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Clubhouse server stopped");
    Ok(())
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".clubhouse"))
}
