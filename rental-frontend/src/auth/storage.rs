use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tower_sessions::Session as TowerSession;

use crate::models::user::User;

/// The single key the portal owns in the browser-backed session.
pub const SESSION_RECORD_KEY: &str = "fleetbook.session";

/// What survives between requests: the identity and its bearer token,
/// serialized as one JSON record. There is no schema versioning; anything
/// unreadable is treated as "no session".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: User,
    pub token: String,
}

/// Durable client storage, as the session engine sees it.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Absent or malformed data reads as no session.
    async fn load(&self) -> Option<SessionRecord>;
    async fn save(&self, record: &SessionRecord) -> anyhow::Result<()>;
    /// Idempotent.
    async fn clear(&self);
}

#[async_trait]
impl<T: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<T> {
    async fn load(&self) -> Option<SessionRecord> {
        (**self).load().await
    }

    async fn save(&self, record: &SessionRecord) -> anyhow::Result<()> {
        (**self).save(record).await
    }

    async fn clear(&self) {
        (**self).clear().await
    }
}

/// Production storage over the tower session carried by the request.
pub struct CookieSessionStorage {
    session: TowerSession,
}

impl CookieSessionStorage {
    pub fn new(session: TowerSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SessionStorage for CookieSessionStorage {
    async fn load(&self) -> Option<SessionRecord> {
        match self.session.get::<SessionRecord>(SESSION_RECORD_KEY).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("Discarding unreadable session record: {}", err);
                None
            }
        }
    }

    async fn save(&self, record: &SessionRecord) -> anyhow::Result<()> {
        self.session
            .insert(SESSION_RECORD_KEY, record)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to persist session record: {}", e))
    }

    async fn clear(&self) {
        self.session.clear().await;
    }
}
