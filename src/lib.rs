//! ClubHub core
//!
//! Everything the club-management front-end does that does not touch the DOM:
//! - `backend`: the facade over the hosted auth/database service
//! - `session`: the session store fed by auth notifications
//! - `route`: routes and the guard deciding render or redirect
//! - `views`: per-page loading, mutations and derived values
//!
//! The browser crate supplies the platform adapters ([`request::HttpClient`],
//! [`backend::SessionPersistence`], [`config::EnvAdapter`]).

pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod request;
pub mod route;
pub mod session;
pub mod views;

pub use backend::{Backend, Facade};
pub use error::{ClubError, ClubErrorKind, ClubResult};
pub use route::{AppRoute, RouteAction, guard};
pub use session::{SessionStatus, SessionStore};

/// Seconds before expiry at which the access token is renewed.
pub const REFRESH_MARGIN_SECS: i64 = 300;
