//! Application state - shared across all handlers.

use std::sync::Arc;

use agora_core::PostService;
use agora_core::ports::{PostRepository, UserRepository};
use agora_infra::{InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use agora_infra::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresUserRepository,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: PostService,
}

impl AppState {
    fn from_repositories(users: Arc<dyn UserRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self {
            users,
            posts: PostService::new(posts),
        }
    }

    /// State backed by process-local storage.
    pub fn in_memory() -> Self {
        Self::from_repositories(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryPostRepository::new()),
        )
    }

    /// Build the application state, falling back to in-memory storage when
    /// no database is configured or reachable.
    #[cfg(feature = "postgres")]
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::in_memory();
        };

        match DatabaseConnections::init(config).await {
            Ok(connections) => {
                tracing::info!("Application state initialized (postgres)");
                Self::from_repositories(
                    Arc::new(PostgresUserRepository::new(connections.main.clone())),
                    Arc::new(PostgresPostRepository::new(connections.main)),
                )
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Self::in_memory()
            }
        }
    }
}
