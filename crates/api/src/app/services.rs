//! Service wiring: picks storage adapters from configuration.
//!
//! `DATABASE_URL` switches credentials and items to Postgres; `REDIS_URL`
//! switches sessions and the resource cache to Redis. Anything unset stays
//! in-memory.

use std::sync::Arc;
use std::time::Duration;

use postgate_auth::{
    Authenticator, AuthorizationGate, CredentialStore, LoginPolicy, SessionRegistry, SessionStore,
};
use postgate_infra::cache::{InMemoryResourceCache, RedisResourceCache, ResourceCache};
use postgate_infra::config::AppConfig;
use postgate_infra::credentials::{InMemoryCredentialStore, PostgresCredentialStore};
use postgate_infra::items::{InMemoryItemRepository, ItemRepository, ItemService, PostgresItemRepository};
use postgate_infra::pg;
use postgate_infra::sessions::{InMemorySessionStore, RedisSessionStore};

pub type DynSessionStore = Arc<dyn SessionStore>;
pub type DynCredentialStore = Arc<dyn CredentialStore>;

/// Session cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age: Duration,
}

pub struct AppServices {
    pub sessions: Arc<SessionRegistry<DynSessionStore>>,
    pub gate: AuthorizationGate<DynSessionStore>,
    pub auth: Authenticator<DynCredentialStore, DynSessionStore>,
    pub items: ItemService<dyn ItemRepository, dyn ResourceCache>,
    pub cookie: CookieSettings,
}

/// Storage backends for [`AppServices::assemble`].
pub struct Backends {
    pub sessions: DynSessionStore,
    pub credentials: DynCredentialStore,
    pub items: Arc<dyn ItemRepository>,
    pub cache: Arc<dyn ResourceCache>,
}

impl Backends {
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
            credentials: Arc::new(InMemoryCredentialStore::new()),
            items: Arc::new(InMemoryItemRepository::new()),
            cache: Arc::new(InMemoryResourceCache::new()),
        }
    }
}

impl AppServices {
    pub fn assemble(backends: Backends, config: &AppConfig) -> Self {
        let sessions = Arc::new(SessionRegistry::with_ttl(
            backends.sessions,
            config.session_ttl_chrono(),
        ));
        let gate = AuthorizationGate::new(Arc::clone(&sessions));
        let auth = Authenticator::new(
            backends.credentials,
            Arc::clone(&sessions),
            config.login_policy(),
        );
        let items = ItemService::new(backends.items, backends.cache).with_ttl(config.cache_ttl);

        Self {
            sessions,
            gate,
            auth,
            items,
            cookie: CookieSettings {
                secure: config.cookie_secure,
                max_age: config.session_ttl,
            },
        }
    }

    /// Everything in-memory. Used by tests and local runs without backends.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::assemble(Backends::in_memory(), config)
    }

    pub fn login_policy(&self) -> LoginPolicy {
        self.auth.policy()
    }
}

/// Connect the configured backends.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let mut backends = Backends::in_memory();

    if let Some(url) = &config.database_url {
        let pool = pg::connect(url, config.db_acquire_timeout).await?;
        pg::ensure_tables(&pool).await?;
        backends.credentials = Arc::new(PostgresCredentialStore::new(pool.clone()));
        backends.items = Arc::new(PostgresItemRepository::new(pool));
        tracing::info!("using postgres for credentials and items");
    }

    if let Some(url) = &config.redis_url {
        backends.sessions = Arc::new(RedisSessionStore::connect(url).await?);
        backends.cache = Arc::new(RedisResourceCache::connect(url).await?);
        tracing::info!("using redis for sessions and cache");
    }

    Ok(AppServices::assemble(backends, config))
}
