//! Application state - shared across all handlers.

use std::sync::Arc;

use pulse_core::ports::{
    AnalyticsRepository, Clock, PasswordService, PostPublisher, PostRepository, RateLimiter,
    SystemClock, TokenService, UserRepository,
};
use pulse_core::services::{AnalyticsService, PostService, PublishScheduler};
use pulse_infra::{
    Argon2PasswordService, InMemoryAnalyticsRepository, InMemoryPostRepository,
    InMemoryUserRepository, JwtTokenService, SimulatedPublisher, TracingEventSink,
};

use crate::config::AppConfig;

/// Repositories backing the services, all on the same backend.
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub backend: &'static str,
}

impl Stores {
    pub fn in_memory() -> Self {
        let posts = Arc::new(InMemoryPostRepository::new());
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            analytics: Arc::new(InMemoryAnalyticsRepository::new(posts.clone())),
            posts,
            backend: "memory",
        }
    }

    #[cfg(feature = "postgres")]
    pub async fn postgres(config: &pulse_infra::DatabaseConfig) -> anyhow::Result<Self> {
        use anyhow::Context;
        use pulse_infra::{
            PostgresAnalyticsRepository, PostgresPostRepository, PostgresUserRepository,
        };

        let conn = pulse_infra::database::connect(config)
            .await
            .context("failed to connect to PostgreSQL")?;

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            analytics: Arc::new(PostgresAnalyticsRepository::new(conn)),
            backend: "postgres",
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<PostService>,
    pub analytics: Arc<AnalyticsService>,
    pub scheduler: Arc<PublishScheduler>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub clock: Arc<dyn Clock>,
    pub storage: &'static str,
    pub scheduler_enabled: bool,
    pub allow_admin_registration: bool,
}

impl AppState {
    /// Build the production state: configured storage, wall clock and the
    /// simulated LinkedIn gateway.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let stores = Self::open_stores(config).await?;
        let publisher = Arc::new(SimulatedPublisher::new(config.publisher_delay));
        let state = Self::build(config, stores, Arc::new(SystemClock), publisher)?;

        tracing::info!(storage = state.storage, "Application state initialized");
        Ok(state)
    }

    /// Wire services over the given stores.
    pub fn build(
        config: &AppConfig,
        stores: Stores,
        clock: Arc<dyn Clock>,
        publisher: Arc<dyn PostPublisher>,
    ) -> anyhow::Result<Self> {
        let scheduler = PublishScheduler::new(
            stores.posts.clone(),
            publisher,
            Arc::new(TracingEventSink),
            clock.clone(),
            config.scheduler.settings.clone(),
        );

        Ok(Self {
            posts: Arc::new(PostService::new(stores.posts.clone(), clock.clone())),
            analytics: Arc::new(AnalyticsService::new(
                stores.analytics,
                stores.posts,
                stores.users.clone(),
                clock.clone(),
            )),
            users: stores.users,
            scheduler: Arc::new(scheduler),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            rate_limiter: Self::rate_limiter(config)?,
            clock,
            storage: stores.backend,
            scheduler_enabled: config.scheduler.enabled,
            allow_admin_registration: config.allow_admin_registration,
        })
    }

    async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
        match &config.database {
            #[cfg(feature = "postgres")]
            Some(db) => Stores::postgres(db).await,
            #[cfg(not(feature = "postgres"))]
            Some(_) => {
                tracing::warn!("DATABASE_URL set but postgres feature is disabled - using in-memory stores");
                Ok(Stores::in_memory())
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Ok(Stores::in_memory())
            }
        }
    }

    #[cfg(feature = "rate-limit")]
    fn rate_limiter(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn RateLimiter>>> {
        let limiter = pulse_infra::KeyedRateLimiter::new(config.rate_limit.clone())?;
        Ok(Some(Arc::new(limiter)))
    }

    #[cfg(not(feature = "rate-limit"))]
    fn rate_limiter(_config: &AppConfig) -> anyhow::Result<Option<Arc<dyn RateLimiter>>> {
        Ok(None)
    }
}
