use crate::config::{InvoicingConfig, PersistenceBackend};
use crate::handlers;
use crate::middleware::{auth_middleware, http_metrics_middleware};
use crate::render::{DocumentRenderer, RenderSettings};
use crate::services::{
    AuthService, DraftRepository, DraftService, InMemoryDraftRepository,
    InMemoryInvoiceRepository, InMemoryUserRepository, InvoiceRepository, InvoiceService,
    JwtService, MongoDb, TaxPolicy, TotalsCalculator, UserRepository,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: InvoicingConfig,
    pub jwt: JwtService,
    pub auth: AuthService,
    pub drafts: DraftService,
    pub invoices: InvoiceService,
    pub renderer: DocumentRenderer,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
}

/// Storage backends behind the service ports.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub drafts: Arc<dyn DraftRepository>,
}

impl Repositories {
    pub fn memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            invoices: Arc::new(InMemoryInvoiceRepository::new()),
            drafts: Arc::new(InMemoryDraftRepository::new()),
        }
    }

    pub fn mongo(db: MongoDb) -> Self {
        Self {
            users: Arc::new(db.clone()),
            invoices: Arc::new(db.clone()),
            drafts: Arc::new(db),
        }
    }

    /// Connect the backend selected in configuration.
    pub async fn from_config(config: &InvoicingConfig) -> Result<Self, AppError> {
        match config.persistence {
            PersistenceBackend::Memory => {
                tracing::warn!("Using in-memory persistence; data is lost on restart");
                Ok(Self::memory())
            }
            PersistenceBackend::Mongo => {
                let uri = config.mongodb.uri.as_deref().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("MONGODB_URI is not set"))
                })?;
                let db = MongoDb::connect(uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Ok(Self::mongo(db))
            }
        }
    }
}

impl AppState {
    pub fn new(config: InvoicingConfig, repos: Repositories) -> Self {
        let tax = TaxPolicy::new(config.tax.rate, config.tax.label.clone());
        let calculator = TotalsCalculator::new(tax.clone());
        let jwt = JwtService::new(&config.jwt);

        Self {
            auth: AuthService::new(repos.users, jwt.clone()),
            drafts: DraftService::new(repos.drafts, calculator.clone()),
            invoices: InvoiceService::new(repos.invoices, calculator),
            renderer: DocumentRenderer::new(RenderSettings::from(&config.document), tax),
            login_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.login_attempts,
                config.rate_limit.login_window_seconds,
            ),
            register_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.register_attempts,
                config.rate_limit.register_window_seconds,
            ),
            jwt,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/api/login", post(handlers::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/api/register", post(handlers::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/api/logout", post(handlers::logout))
        .route("/api/user", get(handlers::get_user))
        .route(
            "/api/items",
            get(handlers::list_items)
                .post(handlers::add_item)
                .delete(handlers::clear_items),
        )
        .route("/api/items/preview", get(handlers::preview_items))
        .route(
            "/api/items/:id",
            put(handlers::update_item).delete(handlers::remove_item),
        )
        .route(
            "/api/invoices",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route("/api/invoices/:id/pdf", get(handlers::download_invoice_pdf))
        .route("/api/invoices/:id/preview", get(handlers::preview_invoice))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(login_route)
        .merge(register_route)
        .merge(protected)
        .with_state(state)
        .layer(from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        let repos = Repositories::from_config(&config).await?;
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let app = build_router(AppState::new(config, repos));

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
