use careerdesk::api::{self, AppState};
use careerdesk::config::Config;
use careerdesk::repositories::EventRepository;
use careerdesk::services::{
    EmailSender, EventService, HttpEmailSender, LocalFileStorage, LogEmailSender, SystemClock,
    UploadPolicy,
};

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "careerdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting careerdesk v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!("Database connected and migrated");

    let mailer: Arc<dyn EmailSender> = match &config.mail.api_url {
        Some(url) => Arc::new(HttpEmailSender::new(
            url.clone(),
            config.mail.api_key.clone(),
            config.mail.from.clone(),
        )?),
        None => {
            warn!("MAIL_API_URL not set; outgoing mail will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let images = LocalFileStorage::new(
        &config.upload_dir,
        UploadPolicy::event_images(config.max_upload_bytes),
    );
    let resumes = LocalFileStorage::new(
        &config.upload_dir,
        UploadPolicy::resumes(config.max_resume_bytes),
    );
    let events = EventService::new(
        Arc::new(EventRepository::new(pool.clone())),
        Arc::new(images),
        Arc::new(SystemClock),
    );

    let state = AppState {
        pool,
        events,
        mailer,
        resume_files: Arc::new(resumes),
        hr_inbox: config.mail.hr_inbox.clone(),
        max_upload_bytes: config.max_upload_bytes.max(config.max_resume_bytes),
    };

    let app = api::build_router(state)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = config.bind_addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
