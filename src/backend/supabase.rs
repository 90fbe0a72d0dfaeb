use super::{
    AuthChange, AuthEvent, Backend, Query, Registration, SessionPersistence, SignUpOutcome,
};
use crate::config::BackendConfig;
use crate::error::{ClubError, ClubErrorKind, ClubResult};
use crate::notify::{Listeners, Subscription};
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clubhub_shared::{Identity, Session, Table};
use serde::Deserialize;
use serde_json::json;
use std::cell::RefCell;
use uuid::Uuid;

/// Token lifetime assumed when the auth service omits both expiry fields.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// =========================================================
// 认证服务响应
// =========================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserRecord,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self.expires_at.unwrap_or_else(|| {
            now.timestamp() + self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
        });
        Session {
            identity: Identity {
                id: self.user.id,
                email: self.user.email.unwrap_or_default(),
                display_name: self.user.user_metadata.full_name,
            },
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

// =========================================================
// 生产环境实现
// =========================================================

/// Live client for the hosted auth (`/auth/v1`) and data (`/rest/v1`) APIs.
pub struct SupabaseBackend<H: HttpClient, P: SessionPersistence> {
    config: BackendConfig,
    http: H,
    persistence: P,
    current: RefCell<Option<Session>>,
    listeners: Listeners<AuthChange>,
    clock: fn() -> DateTime<Utc>,
}

impl<H: HttpClient, P: SessionPersistence> SupabaseBackend<H, P> {
    pub fn new(config: BackendConfig, http: H, persistence: P) -> Self {
        Self {
            config,
            http,
            persistence,
            current: RefCell::new(None),
            listeners: Listeners::new(),
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for expiry checks.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Request carrying the project key, and the user's token when signed in.
    fn request(&self, url: &str, method: HttpMethod) -> HttpRequest {
        let bearer = self
            .current
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone());

        HttpRequest::new(url, method)
            .with_header("apikey", &self.config.anon_key)
            .with_header("Authorization", &format!("Bearer {bearer}"))
    }

    async fn send(&self, req: HttpRequest) -> ClubResult<HttpResponse> {
        log::debug!("{} {}", req.method.as_str(), req.url);
        self.http.send(req).await
    }

    fn establish(&self, session: Session, event: AuthEvent) {
        self.persistence.save(&session);
        *self.current.borrow_mut() = Some(session.clone());
        self.listeners.emit(&AuthChange {
            event,
            session: Some(session),
        });
    }

    /// Drop the session locally and tell subscribers.
    fn destroy(&self) {
        self.persistence.clear();
        self.current.borrow_mut().take();
        self.listeners.emit(&AuthChange {
            event: AuthEvent::SignedOut,
            session: None,
        });
    }

    async fn token_grant(&self, grant: &str, body: serde_json::Value) -> ClubResult<Session> {
        let url = self.config.auth_url(&format!("/token?grant_type={grant}"));
        let req = HttpRequest::new(&url, HttpMethod::Post)
            .with_header("apikey", &self.config.anon_key)
            .with_body(body);

        let resp = self.send(req).await?;
        if !resp.is_success() {
            return Err(ClubError::from_auth_response(resp.status, &resp.body));
        }
        Ok(resp.json::<TokenResponse>()?.into_session(self.now()))
    }

    async fn refresh(&self, session: &Session) -> ClubResult<Session> {
        self.token_grant(
            "refresh_token",
            json!({ "refresh_token": session.refresh_token }),
        )
        .await
        .map_err(|e| e.in_op("auth.refresh"))
    }

    /// Refresh `session`; a rejected refresh token ends the session.
    async fn renew(&self, session: &Session) -> ClubResult<Option<Session>> {
        match self.refresh(session).await {
            Ok(renewed) => {
                log::info!("session refreshed for {}", renewed.identity.email);
                self.establish(renewed.clone(), AuthEvent::TokenRefreshed);
                Ok(Some(renewed))
            }
            Err(e) if e.kind == ClubErrorKind::Auth => {
                log::warn!("session expired and could not be refreshed: {e}");
                self.destroy();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait(?Send)]
impl<H: HttpClient, P: SessionPersistence> Backend for SupabaseBackend<H, P> {
    fn is_configured(&self) -> bool {
        true
    }

    async fn get_session(&self) -> ClubResult<Option<Session>> {
        let known = self.current.borrow().clone();
        let session = match known {
            Some(session) => session,
            None => match self.persistence.load() {
                Some(restored) => {
                    *self.current.borrow_mut() = Some(restored.clone());
                    restored
                }
                None => return Ok(None),
            },
        };

        if session.is_expired(self.now()) {
            return self
                .renew(&session)
                .await
                .map_err(|e| e.in_op("auth.get_session"));
        }
        Ok(Some(session))
    }

    fn subscribe(&self, on_change: impl Fn(&AuthChange) + 'static) -> Subscription {
        self.listeners.subscribe(on_change)
    }

    async fn sign_in(&self, email: &str, password: &str) -> ClubResult<Session> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await
            .map_err(|e| e.in_op_with("auth.sign_in", email))?;

        log::info!("signed in as {}", session.identity.email);
        self.establish(session.clone(), AuthEvent::SignedIn);
        Ok(session)
    }

    async fn sign_up(&self, registration: &Registration) -> ClubResult<SignUpOutcome> {
        let url = self.config.auth_url("/signup");
        let req = HttpRequest::new(&url, HttpMethod::Post)
            .with_header("apikey", &self.config.anon_key)
            .with_body(json!({
                "email": registration.email,
                "password": registration.password,
                "data": { "full_name": registration.full_name },
            }));

        let resp = self.send(req).await?;
        if !resp.is_success() {
            return Err(ClubError::from_auth_response(resp.status, &resp.body)
                .in_op_with("auth.sign_up", &registration.email));
        }

        // With email confirmation on, the service answers with the bare user record.
        let body: serde_json::Value = resp.json()?;
        if body.get("access_token").is_none() {
            log::info!("sign-up for {} awaits email confirmation", registration.email);
            return Ok(SignUpOutcome::ConfirmationRequired);
        }

        let session = serde_json::from_value::<TokenResponse>(body)?.into_session(self.now());
        self.establish(session.clone(), AuthEvent::SignedIn);
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self) -> ClubResult<()> {
        let req = self.request(&self.config.auth_url("/logout"), HttpMethod::Post);
        let had_session = self.current.borrow().is_some();

        // 本地状态总是清除，远端注销失败只记录日志
        self.destroy();

        if had_session {
            match self.send(req).await {
                Ok(resp) if resp.is_success() => {}
                Ok(resp) => log::warn!(
                    "remote sign-out failed: {}",
                    ClubError::from_auth_response(resp.status, &resp.body)
                ),
                Err(e) => log::warn!("remote sign-out failed: {e}"),
            }
        }
        Ok(())
    }

    async fn refresh_if_expiring(
        &self,
        now: DateTime<Utc>,
        margin_secs: i64,
    ) -> ClubResult<Option<Session>> {
        let Some(session) = self.current.borrow().clone() else {
            return Ok(None);
        };
        if !session.expires_within(now, margin_secs) {
            return Ok(Some(session));
        }
        self.renew(&session).await
    }

    async fn select<T: Table>(&self, query: &Query) -> ClubResult<Vec<T>> {
        let qs = query.to_query_string::<T>();
        let url = format!("{}?{}", self.config.rest_url(T::NAME), qs);
        let op = format!("{}.select", T::NAME);

        let resp = self
            .send(self.request(&url, HttpMethod::Get))
            .await
            .map_err(|e| e.in_op_with(op.clone(), qs.clone()))?;

        if !resp.is_success() {
            let err = ClubError::from_data_response(resp.status, &resp.body).in_op_with(op, qs);
            log::warn!("{err}");
            return Err(err);
        }
        resp.json::<Vec<T>>().map_err(|e| e.in_op(op))
    }

    async fn insert<T: Table>(&self, row: &T::Insert) -> ClubResult<()> {
        let op = format!("{}.insert", T::NAME);
        let body = json!([serde_json::to_value(row)?]);
        let req = self
            .request(&self.config.rest_url(T::NAME), HttpMethod::Post)
            .with_header("Prefer", "return=minimal")
            .with_body(body);

        let resp = self.send(req).await.map_err(|e| e.in_op(op.clone()))?;
        if !resp.is_success() {
            let err = ClubError::from_data_response(resp.status, &resp.body).in_op(op);
            log::warn!("{err}");
            return Err(err);
        }
        Ok(())
    }

    async fn delete<T: Table>(&self, id: Uuid) -> ClubResult<()> {
        let op = format!("{}.delete", T::NAME);
        let url = format!("{}?id=eq.{}", self.config.rest_url(T::NAME), id);

        let resp = self
            .send(self.request(&url, HttpMethod::Delete))
            .await
            .map_err(|e| e.in_op_with(op.clone(), id.to_string()))?;
        if !resp.is_success() {
            let err = ClubError::from_data_response(resp.status, &resp.body)
                .in_op_with(op, id.to_string());
            log::warn!("{err}");
            return Err(err);
        }
        Ok(())
    }
}
