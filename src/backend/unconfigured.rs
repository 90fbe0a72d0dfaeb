use super::{AuthChange, Backend, Query, Registration, SignUpOutcome};
use crate::error::{ClubError, ClubResult};
use crate::notify::Subscription;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clubhub_shared::{Session, Table};
use uuid::Uuid;

/// Stand-in used when the service URL or key is missing.
///
/// Never touches the network. Reads come back empty, there is never a
/// session, and every write fails with the configuration message.
#[derive(Debug, Clone)]
pub struct UnconfiguredBackend {
    reason: String,
}

impl UnconfiguredBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn not_configured(&self, op: &str) -> ClubError {
        ClubError::configuration(self.reason.clone()).in_op(op)
    }
}

#[async_trait(?Send)]
impl Backend for UnconfiguredBackend {
    fn is_configured(&self) -> bool {
        false
    }

    async fn get_session(&self) -> ClubResult<Option<Session>> {
        Ok(None)
    }

    fn subscribe(&self, _on_change: impl Fn(&AuthChange) + 'static) -> Subscription {
        Subscription::inert()
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> ClubResult<Session> {
        Err(self.not_configured("auth.sign_in"))
    }

    async fn sign_up(&self, _registration: &Registration) -> ClubResult<SignUpOutcome> {
        Err(self.not_configured("auth.sign_up"))
    }

    async fn sign_out(&self) -> ClubResult<()> {
        Ok(())
    }

    async fn refresh_if_expiring(
        &self,
        _now: DateTime<Utc>,
        _margin_secs: i64,
    ) -> ClubResult<Option<Session>> {
        Ok(None)
    }

    async fn select<T: Table>(&self, _query: &Query) -> ClubResult<Vec<T>> {
        Ok(Vec::new())
    }

    async fn insert<T: Table>(&self, _row: &T::Insert) -> ClubResult<()> {
        Err(self.not_configured(&format!("{}.insert", T::NAME)))
    }

    async fn delete<T: Table>(&self, _id: Uuid) -> ClubResult<()> {
        Err(self.not_configured(&format!("{}.delete", T::NAME)))
    }
}
