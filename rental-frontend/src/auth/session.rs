//! Session state and hydration.
//!
//! The store is an explicit context object: it is handed its storage and the
//! Auth API, so guards can be exercised against fakes. Hydration follows a
//! linear policy with exactly one retry: validate the persisted token, on
//! rejection refresh once, on refresh failure fall back to logout. Failures
//! are terminal and silent; the user is simply anonymous afterwards.

use tokio_util::sync::CancellationToken;

use crate::auth::storage::{SessionRecord, SessionStorage};
use crate::models::user::User;
use crate::services::auth_client::AuthApi;

/// Client-held view of the current identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Session::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    Completed,
    /// The caller was torn down mid-flight. No verdict was applied; the
    /// session still reads as loading and must not be trusted.
    Cancelled,
}

enum Resolution {
    Authenticated {
        user: User,
        token: String,
        persist: bool,
    },
    Anonymous {
        clear: bool,
    },
}

pub struct SessionStore<S> {
    session: Session,
    storage: S,
    offline_grace: bool,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(storage: S, offline_grace: bool) -> Self {
        Self {
            session: Session::anonymous(),
            storage,
            offline_grace,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.session.is_loading = loading;
    }

    /// Record a fresh authentication and persist it.
    pub async fn login(&mut self, user: User, token: String) -> anyhow::Result<()> {
        self.session = Session {
            user: Some(user.clone()),
            token: Some(token.clone()),
            is_authenticated: true,
            is_loading: false,
        };
        self.storage.save(&SessionRecord { user, token }).await
    }

    /// Clears the in-memory state and the persisted record. Idempotent.
    pub async fn logout(&mut self) {
        self.session = Session::anonymous();
        self.storage.clear().await;
    }

    /// Reconstruct the session from storage, verifying the persisted token
    /// against the Auth API. At most two sequential network calls are made:
    /// validate, then (only after a rejection) one refresh. A cancelled
    /// hydration applies no state change.
    pub async fn hydrate(
        &mut self,
        api: &dyn AuthApi,
        cancel: &CancellationToken,
    ) -> HydrationOutcome {
        self.set_loading(true);

        let Some(record) = self.storage.load().await else {
            self.session = Session::anonymous();
            return HydrationOutcome::Completed;
        };

        let resolution = tokio::select! {
            _ = cancel.cancelled() => return HydrationOutcome::Cancelled,
            resolution = resolve_record(api, record, self.offline_grace) => resolution,
        };

        match resolution {
            Resolution::Authenticated {
                user,
                token,
                persist,
            } => {
                if persist {
                    let record = SessionRecord {
                        user: user.clone(),
                        token: token.clone(),
                    };
                    if let Err(err) = self.storage.save(&record).await {
                        tracing::warn!("Failed to persist rehydrated session: {}", err);
                    }
                }
                self.session = Session {
                    user: Some(user),
                    token: Some(token),
                    is_authenticated: true,
                    is_loading: false,
                };
            }
            Resolution::Anonymous { clear } => {
                if clear {
                    self.logout().await;
                } else {
                    self.session = Session::anonymous();
                }
            }
        }

        HydrationOutcome::Completed
    }
}

async fn resolve_record(api: &dyn AuthApi, record: SessionRecord, offline_grace: bool) -> Resolution {
    match api.validate_session(&record.token).await {
        // The backend's view of the user is fresher than the cached one.
        Ok(user) => Resolution::Authenticated {
            user,
            token: record.token,
            persist: true,
        },
        Err(err) if offline_grace && err.is_transport() => {
            tracing::warn!(
                user_id = %record.user.id,
                "Auth service unreachable; keeping cached session unverified: {}",
                err
            );
            Resolution::Authenticated {
                user: record.user,
                token: record.token,
                persist: false,
            }
        }
        Err(validate_err) => match api.refresh_token(&record.token).await {
            Ok(refreshed) => Resolution::Authenticated {
                user: record.user,
                token: refreshed.access_token,
                persist: true,
            },
            Err(refresh_err) => {
                tracing::info!(
                    user_id = %record.user.id,
                    "Session rejected and refresh failed, treating as logged out: {}; {}",
                    validate_err,
                    refresh_err
                );
                Resolution::Anonymous { clear: true }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::testing::MemoryStorage;
    use crate::models::user::Role;
    use crate::services::auth_client::{
        AuthError, Credentials, LoginResponse, RefreshedToken, RegisterRequest,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_user() -> User {
        User {
            id: "u-7".into(),
            role: Role::VehicleOwner,
            first_name: "Jonas".into(),
            last_name: "Berg".into(),
            email: "jonas@example.com".into(),
            phone: Some("+4912345".into()),
        }
    }

    enum ValidateBehavior {
        Accept(User),
        Reject,
        Unreachable,
        Hang,
    }

    enum RefreshBehavior {
        Issue(String),
        Reject,
    }

    struct ScriptedAuthApi {
        validate: ValidateBehavior,
        refresh: RefreshBehavior,
        validate_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
    }

    impl ScriptedAuthApi {
        fn new(validate: ValidateBehavior, refresh: RefreshBehavior) -> Self {
            Self {
                validate,
                refresh,
                validate_calls: AtomicUsize::new(0),
                refresh_calls: AtomicUsize::new(0),
            }
        }
    }

    fn transport_error() -> AuthError {
        AuthError::Unreachable("connection refused".into())
    }

    #[async_trait]
    impl AuthApi for ScriptedAuthApi {
        async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, AuthError> {
            unimplemented!("hydration never logs in")
        }

        async fn validate_session(&self, _token: &str) -> Result<User, AuthError> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            match &self.validate {
                ValidateBehavior::Accept(user) => Ok(user.clone()),
                ValidateBehavior::Reject => Err(AuthError::Rejected {
                    status: 401,
                    code: Some("token_expired".into()),
                }),
                ValidateBehavior::Unreachable => Err(transport_error()),
                ValidateBehavior::Hang => std::future::pending().await,
            }
        }

        async fn refresh_token(&self, _token: &str) -> Result<RefreshedToken, AuthError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            match &self.refresh {
                RefreshBehavior::Issue(token) => Ok(RefreshedToken {
                    access_token: token.clone(),
                }),
                RefreshBehavior::Reject => Err(AuthError::Rejected {
                    status: 401,
                    code: None,
                }),
            }
        }

        async fn logout(&self, _token: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn register(&self, _request: &RegisterRequest) -> Result<(), AuthError> {
            Ok(())
        }
    }

    async fn store_with_record(user: User, token: &str) -> (SessionStore<Arc<MemoryStorage>>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .save(&SessionRecord {
                user,
                token: token.into(),
            })
            .await
            .unwrap();
        (SessionStore::new(storage.clone(), false), storage)
    }

    #[tokio::test]
    async fn login_round_trips_through_storage() {
        let storage = Arc::new(MemoryStorage::default());
        let mut store = SessionStore::new(storage.clone(), false);

        store.login(sample_user(), "tok-1".into()).await.unwrap();

        assert!(store.session().is_authenticated);
        assert!(!store.session().is_loading);
        assert_eq!(
            storage.load().await,
            Some(SessionRecord {
                user: sample_user(),
                token: "tok-1".into(),
            })
        );
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let storage = Arc::new(MemoryStorage::default());
        let mut store = SessionStore::new(storage.clone(), false);
        store.login(sample_user(), "tok-1".into()).await.unwrap();

        store.logout().await;
        let after_first = store.session().clone();
        store.logout().await;

        assert_eq!(store.session(), &after_first);
        assert_eq!(store.session(), &Session::anonymous());
        assert_eq!(storage.load().await, None);
    }

    #[tokio::test]
    async fn hydrate_without_record_is_anonymous_without_network_calls() {
        let storage = Arc::new(MemoryStorage::default());
        let mut store = SessionStore::new(storage, false);
        let api = ScriptedAuthApi::new(
            ValidateBehavior::Accept(sample_user()),
            RefreshBehavior::Reject,
        );

        let outcome = store.hydrate(&api, &CancellationToken::new()).await;

        assert_eq!(outcome, HydrationOutcome::Completed);
        assert_eq!(store.session(), &Session::anonymous());
        assert_eq!(api.validate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hydrate_with_valid_token_authenticates_with_backend_profile() {
        let mut fresher = sample_user();
        fresher.phone = Some("+4999999".into());
        let (mut store, _storage) = store_with_record(sample_user(), "tok-1").await;
        let api = ScriptedAuthApi::new(
            ValidateBehavior::Accept(fresher.clone()),
            RefreshBehavior::Reject,
        );

        store.hydrate(&api, &CancellationToken::new()).await;

        assert!(store.session().is_authenticated);
        assert!(!store.session().is_loading);
        assert_eq!(store.session().user, Some(fresher));
        assert_eq!(store.session().token.as_deref(), Some("tok-1"));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_token_refreshes_exactly_once_and_persists_new_token() {
        let (mut store, storage) = store_with_record(sample_user(), "tok-old").await;
        let api = ScriptedAuthApi::new(
            ValidateBehavior::Reject,
            RefreshBehavior::Issue("tok-new".into()),
        );

        store.hydrate(&api, &CancellationToken::new()).await;

        assert!(store.session().is_authenticated);
        assert_eq!(store.session().token.as_deref(), Some("tok-new"));
        assert_eq!(store.session().user, Some(sample_user()));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(storage.load().await.unwrap().token, "tok-new");
    }

    #[tokio::test]
    async fn refresh_failure_falls_back_to_logged_out_and_clears_storage() {
        let (mut store, storage) = store_with_record(sample_user(), "tok-old").await;
        let api = ScriptedAuthApi::new(ValidateBehavior::Reject, RefreshBehavior::Reject);

        let outcome = store.hydrate(&api, &CancellationToken::new()).await;

        assert_eq!(outcome, HydrationOutcome::Completed);
        assert_eq!(store.session(), &Session::anonymous());
        assert_eq!(storage.load().await, None);
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_record_hydrates_anonymous_without_panicking() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .inject_raw(serde_json::json!({"state": "not a session record"}))
            .await;
        let mut store = SessionStore::new(storage, false);
        let api = ScriptedAuthApi::new(ValidateBehavior::Reject, RefreshBehavior::Reject);

        let outcome = store.hydrate(&api, &CancellationToken::new()).await;

        assert_eq!(outcome, HydrationOutcome::Completed);
        assert_eq!(store.session(), &Session::anonymous());
        assert_eq!(api.validate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_service_without_grace_runs_the_refresh_ladder() {
        let (mut store, _storage) = store_with_record(sample_user(), "tok-1").await;
        let api = ScriptedAuthApi::new(ValidateBehavior::Unreachable, RefreshBehavior::Reject);

        store.hydrate(&api, &CancellationToken::new()).await;

        assert_eq!(store.session(), &Session::anonymous());
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_service_with_grace_keeps_cached_session() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .save(&SessionRecord {
                user: sample_user(),
                token: "tok-1".into(),
            })
            .await
            .unwrap();
        let mut store = SessionStore::new(storage.clone(), true);
        let api = ScriptedAuthApi::new(ValidateBehavior::Unreachable, RefreshBehavior::Reject);

        store.hydrate(&api, &CancellationToken::new()).await;

        assert!(store.session().is_authenticated);
        assert_eq!(store.session().user, Some(sample_user()));
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
        // Grace keeps the record untouched; nothing was re-persisted.
        assert_eq!(storage.load().await.unwrap().token, "tok-1");
    }

    #[tokio::test]
    async fn cancelled_hydration_applies_no_state() {
        let (mut store, storage) = store_with_record(sample_user(), "tok-1").await;
        let api = ScriptedAuthApi::new(ValidateBehavior::Hang, RefreshBehavior::Reject);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = store.hydrate(&api, &cancel).await;

        assert_eq!(outcome, HydrationOutcome::Cancelled);
        // Still loading: the verdict never arrived and must not be trusted.
        assert!(store.session().is_loading);
        assert!(!store.session().is_authenticated);
        assert_eq!(storage.load().await.unwrap().token, "tok-1");
    }
}
