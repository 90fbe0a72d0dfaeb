//! Backend client facade.
//!
//! The only part of the crate that talks to the hosted service. Two
//! implementations sit behind [`Backend`]:
//! - [`SupabaseBackend`]: the live client (auth + data API over [`HttpClient`])
//! - [`UnconfiguredBackend`]: the no-op stand-in used when credentials are missing
//!
//! [`Facade`] picks one from the configuration result.

mod query;
mod supabase;
mod unconfigured;

#[cfg(test)]
pub(crate) mod fake;

pub use query::{Direction, Query, RowScope};
pub use supabase::SupabaseBackend;
pub use unconfigured::UnconfiguredBackend;

use crate::config::{BackendConfig, ScopeMode};
use crate::error::ClubResult;
use crate::notify::Subscription;
use crate::request::HttpClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clubhub_shared::{Session, Table};
use uuid::Uuid;

// =========================================================
// 认证事件
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Pushed to subscribers on every session change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The project issued a session right away.
    SignedIn(Session),
    /// The account exists but the email address must be confirmed first.
    ConfirmationRequired,
}

// =========================================================
// 抽象接口
// =========================================================

/// Where the live backend keeps the session between page loads.
pub trait SessionPersistence {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session);
    fn clear(&self);
}

/// Contract of the hosted auth/database service as seen by the app.
#[async_trait(?Send)]
pub trait Backend {
    fn is_configured(&self) -> bool;

    /// The current session, restored from persistence if needed.
    async fn get_session(&self) -> ClubResult<Option<Session>>;

    /// Register for auth-state changes until the handle is dropped.
    fn subscribe(&self, on_change: impl Fn(&AuthChange) + 'static) -> Subscription;

    async fn sign_in(&self, email: &str, password: &str) -> ClubResult<Session>;

    async fn sign_up(&self, registration: &Registration) -> ClubResult<SignUpOutcome>;

    async fn sign_out(&self) -> ClubResult<()>;

    /// Refresh the access token if it expires within `margin_secs`.
    ///
    /// Returns the session that is current afterwards.
    async fn refresh_if_expiring(
        &self,
        now: DateTime<Utc>,
        margin_secs: i64,
    ) -> ClubResult<Option<Session>>;

    async fn select<T: Table>(&self, query: &Query) -> ClubResult<Vec<T>>;

    async fn insert<T: Table>(&self, row: &T::Insert) -> ClubResult<()>;

    async fn delete<T: Table>(&self, id: Uuid) -> ClubResult<()>;
}

// =========================================================
// Facade
// =========================================================

pub enum Facade<H: HttpClient, P: SessionPersistence> {
    Live(SupabaseBackend<H, P>),
    Unconfigured(UnconfiguredBackend),
}

impl<H: HttpClient, P: SessionPersistence> Facade<H, P> {
    /// Live client if `config` is usable, otherwise the stand-in.
    ///
    /// In the stand-in case `http` and `persistence` are dropped unused.
    pub fn new(config: ClubResult<BackendConfig>, http: H, persistence: P) -> Self {
        match config {
            Ok(config) => Facade::Live(SupabaseBackend::new(config, http, persistence)),
            Err(e) => {
                log::error!("{e}");
                Facade::Unconfigured(UnconfiguredBackend::new(e.message()))
            }
        }
    }

    /// The remediation message when running without configuration.
    pub fn configuration_error(&self) -> Option<&str> {
        match self {
            Facade::Live(_) => None,
            Facade::Unconfigured(b) => Some(b.reason()),
        }
    }

    pub fn scope_mode(&self) -> ScopeMode {
        match self {
            Facade::Live(b) => b.config().scope,
            Facade::Unconfigured(_) => ScopeMode::default(),
        }
    }
}

#[async_trait(?Send)]
impl<H: HttpClient, P: SessionPersistence> Backend for Facade<H, P> {
    fn is_configured(&self) -> bool {
        matches!(self, Facade::Live(_))
    }

    async fn get_session(&self) -> ClubResult<Option<Session>> {
        match self {
            Facade::Live(b) => b.get_session().await,
            Facade::Unconfigured(b) => b.get_session().await,
        }
    }

    fn subscribe(&self, on_change: impl Fn(&AuthChange) + 'static) -> Subscription {
        match self {
            Facade::Live(b) => b.subscribe(on_change),
            Facade::Unconfigured(b) => b.subscribe(on_change),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClubResult<Session> {
        match self {
            Facade::Live(b) => b.sign_in(email, password).await,
            Facade::Unconfigured(b) => b.sign_in(email, password).await,
        }
    }

    async fn sign_up(&self, registration: &Registration) -> ClubResult<SignUpOutcome> {
        match self {
            Facade::Live(b) => b.sign_up(registration).await,
            Facade::Unconfigured(b) => b.sign_up(registration).await,
        }
    }

    async fn sign_out(&self) -> ClubResult<()> {
        match self {
            Facade::Live(b) => b.sign_out().await,
            Facade::Unconfigured(b) => b.sign_out().await,
        }
    }

    async fn refresh_if_expiring(
        &self,
        now: DateTime<Utc>,
        margin_secs: i64,
    ) -> ClubResult<Option<Session>> {
        match self {
            Facade::Live(b) => b.refresh_if_expiring(now, margin_secs).await,
            Facade::Unconfigured(b) => b.refresh_if_expiring(now, margin_secs).await,
        }
    }

    async fn select<T: Table>(&self, query: &Query) -> ClubResult<Vec<T>> {
        match self {
            Facade::Live(b) => b.select::<T>(query).await,
            Facade::Unconfigured(b) => b.select::<T>(query).await,
        }
    }

    async fn insert<T: Table>(&self, row: &T::Insert) -> ClubResult<()> {
        match self {
            Facade::Live(b) => b.insert::<T>(row).await,
            Facade::Unconfigured(b) => b.insert::<T>(row).await,
        }
    }

    async fn delete<T: Table>(&self, id: Uuid) -> ClubResult<()> {
        match self {
            Facade::Live(b) => b.delete::<T>(id).await,
            Facade::Unconfigured(b) => b.delete::<T>(id).await,
        }
    }
}
