use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_marketplace::{
    blob_store::PgBlobStore,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    routes::build_app,
    services::auth_service::prune_revoked_tokens,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,course_marketplace=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pruned = prune_revoked_tokens(&orm).await?;
    tracing::info!(pruned, "expired token revocations removed");

    let state = AppState {
        blobs: Arc::new(PgBlobStore::new(orm.clone())),
        orm,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
    };
    let app = build_app(state, &config);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!(%addr, max_upload_bytes = config.max_upload_bytes, "listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
