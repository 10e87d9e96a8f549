//! Tabacaria API - order backend for the storefront and admin dashboard.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - Hosted `PostgreSQL` (Supabase) through sqlx; checkout runs in a stored
//!   procedure
//! - Supabase Auth for user tokens, static bearer tokens for machines
//! - Mercado Pago for payment confirmation, Spoke for delivery tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabacaria_api::config::ApiConfig;
use tabacaria_api::db::{self, PgStore};
use tabacaria_api::mercadopago::{MercadoPagoClient, PaymentLookup};
use tabacaria_api::routes;
use tabacaria_api::services::auth::SupabaseAuth;
use tabacaria_api::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let config = ApiConfig::from_env()?;

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tabacaria_api=info,tower_http=debug".into());

    // JSON on Fly.io for structured log parsing, text locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Migrations are NOT run on startup: cargo run -p tabacaria-cli -- migrate

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let auth = SupabaseAuth::new(http.clone(), &config.supabase)?;
    let payments = config.mercadopago().map(|mp| {
        Arc::new(MercadoPagoClient::new(http.clone(), mp)) as Arc<dyn PaymentLookup>
    });
    if payments.is_none() {
        tracing::warn!("MERCADOPAGO_ACCESS_TOKEN not set, payment webhook disabled");
    }
    if config.spoke_webhook_token.is_none() {
        tracing::warn!("SPOKE_WEBHOOK_TOKEN not set, courier webhook is unauthenticated");
    }

    let addr = config.socket_addr();
    let tls = config.tls.clone();
    let state = AppState::new(config, Arc::new(PgStore::new(pool)), Arc::new(auth), payments);
    let app = routes::router(state);

    if let Some(tls) = tls {
        let rustls_config = RustlsConfig::from_pem(
            tls.cert_pem.as_bytes().to_vec(),
            tls.key_pem.expose_secret().as_bytes().to_vec(),
        )
        .await?;

        tracing::info!("api listening on https://{}", addr);

        let handle = Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(30)));
        });

        axum_server::bind_rustls(addr, rustls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        tracing::info!("api listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
