//! 会话状态 (Session Store)
//!
//! Holds who is signed in, starting from `Loading` until the first answer
//! arrives. Auth notifications from the backend always win over the startup
//! lookup: once any notification has been applied, a `get_session` result
//! that resolves later is dropped.

use crate::backend::{AuthChange, Backend};
use crate::notify::{Listeners, Subscription};
use clubhub_shared::Session;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};


#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Loading,
    Authenticated(Session),
    Anonymous,
}

impl SessionStatus {
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => Self::Authenticated(session),
            None => Self::Anonymous,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

struct StoreState {
    status: RefCell<SessionStatus>,
    /// Set by the first auth notification.
    notified: Cell<bool>,
    observers: Listeners<SessionStatus>,
}

impl StoreState {
    fn set(&self, status: SessionStatus) {
        *self.status.borrow_mut() = status.clone();
        self.observers.emit(&status);
    }
}

/// Current session plus change notifications.
///
/// Dropping the store releases its backend subscription.
pub struct SessionStore {
    state: Rc<StoreState>,
    _auth_subscription: Subscription,
}

impl SessionStore {
    /// Subscribe to `backend` and start in `Loading`.
    ///
    /// Call [`SessionStore::restore`] afterwards to resolve the initial state.
    pub fn attach<B: Backend>(backend: &B) -> Self {
        let state = Rc::new(StoreState {
            status: RefCell::new(SessionStatus::Loading),
            notified: Cell::new(false),
            observers: Listeners::new(),
        });

        let weak: Weak<StoreState> = Rc::downgrade(&state);
        let subscription = backend.subscribe(move |change: &AuthChange| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            log::debug!("auth change: {:?}", change.event);
            state.notified.set(true);
            state.set(SessionStatus::from_session(change.session.clone()));
        });

        Self {
            state,
            _auth_subscription: subscription,
        }
    }

    /// Resolve the startup state from `backend.get_session()`.
    ///
    /// A failed lookup counts as signed out. The result is ignored if a
    /// notification arrived while it was pending.
    pub async fn restore<B: Backend>(&self, backend: &B) {
        let result = backend.get_session().await;

        if self.state.notified.get() {
            log::debug!("session lookup superseded by an auth notification");
            return;
        }

        let status = match result {
            Ok(session) => SessionStatus::from_session(session),
            Err(e) => {
                log::warn!("session lookup failed, continuing signed out: {e}");
                SessionStatus::Anonymous
            }
        };
        self.state.set(status);
    }

    /// [`SessionStore::attach`] followed by [`SessionStore::restore`].
    pub async fn start<B: Backend>(backend: &B) -> Self {
        let store = Self::attach(backend);
        store.restore(backend).await;
        store
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.status.borrow().session().cloned()
    }

    /// Call `observer` with every later status change.
    pub fn watch(&self, observer: impl Fn(&SessionStatus) + 'static) -> Subscription {
        self.state.observers.subscribe(observer)
    }
}
