//! View logic shared by the pages: loading, mutating and deriving data.
//!
//! Each page owns a [`FetchGuard`]. Results are applied only when they come
//! from the latest request and the page is still mounted.

pub mod dashboard;
pub mod events;
pub mod members;

use crate::error::ClubResult;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

/// Shared flag flipped once when the owning view is torn down.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Sequence number of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Last request wins, and nothing lands after cancellation.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard {
    latest: Rc<Cell<u64>>,
    token: CancelToken,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request. Any ticket issued before this one becomes stale.
    pub fn issue(&self) -> Ticket {
        let next = self.latest.get() + 1;
        self.latest.set(next);
        Ticket(next)
    }

    pub fn accepts(&self, ticket: Ticket) -> bool {
        !self.token.is_cancelled() && ticket.0 == self.latest.get()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Await `request` under a fresh ticket; `None` if the result is stale.
    pub async fn run<T>(&self, request: impl Future<Output = T>) -> Option<T> {
        let ticket = self.issue();
        let output = request.await;
        if self.accepts(ticket) {
            Some(output)
        } else {
            log::debug!("dropping stale result for request #{}", ticket.0);
            None
        }
    }

    /// Apply `write`, then run `reload` under a fresh ticket.
    ///
    /// The write is never guarded: its error always reaches the caller.
    /// `Ok(None)` means the write landed but the reload is stale.
    pub async fn write_then_reload<T>(
        &self,
        write: impl Future<Output = ClubResult<()>>,
        reload: impl Future<Output = ClubResult<T>>,
    ) -> ClubResult<Option<T>> {
        write.await?;
        self.run(reload).await.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClubError;
    use futures::channel::oneshot;

    #[test]
    fn test_latest_ticket_wins() {
        let guard = FetchGuard::new();
        let first = guard.issue();
        let second = guard.issue();
        assert!(!guard.accepts(first));
        assert!(guard.accepts(second));
    }

    #[test]
    fn test_cancel_rejects_everything() {
        let guard = FetchGuard::new();
        let ticket = guard.issue();
        let token = guard.token();
        token.cancel();
        assert!(guard.is_cancelled());
        assert!(!guard.accepts(ticket));
        assert!(!guard.accepts(guard.issue()));
    }

    #[tokio::test]
    async fn test_slow_earlier_request_is_dropped() {
        let guard = FetchGuard::new();
        let (slow_tx, slow_rx) = oneshot::channel::<&str>();

        let (slow, fast) = futures::join!(
            guard.run(async { slow_rx.await.unwrap_or("gone") }),
            async {
                let fast = guard.run(async { "fresh" }).await;
                slow_tx.send("stale").unwrap();
                fast
            }
        );

        assert_eq!(slow, None);
        assert_eq!(fast, Some("fresh"));
    }

    #[tokio::test]
    async fn test_write_error_survives_newer_request() {
        let guard = FetchGuard::new();
        let (tx, rx) = oneshot::channel::<()>();

        let (written, other) = futures::join!(
            guard.write_then_reload(
                async {
                    let _ = rx.await;
                    Err::<(), _>(ClubError::constraint_violation("already marked"))
                },
                async { Ok::<_, ClubError>(vec![1]) }
            ),
            async {
                let other = guard.run(async { 2 }).await;
                tx.send(()).unwrap();
                other
            }
        );

        assert_eq!(other, Some(2));
        let err = written.unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(err.message(), "already marked");
    }

    #[tokio::test]
    async fn test_superseded_reload_still_reports_write() {
        let guard = FetchGuard::new();
        let (tx, rx) = oneshot::channel::<Vec<u32>>();

        let (written, other) = futures::join!(
            guard.write_then_reload(async { Ok::<_, ClubError>(()) }, async {
                Ok::<_, ClubError>(rx.await.unwrap_or_default())
            }),
            async {
                let other = guard.run(async { vec![7] }).await;
                tx.send(vec![1]).unwrap();
                other
            }
        );

        assert_eq!(written.unwrap(), None);
        assert_eq!(other, Some(vec![7]));
    }

    #[tokio::test]
    async fn test_write_after_unmount_still_fails_loudly() {
        let guard = FetchGuard::new();
        guard.cancel();
        let err = guard
            .write_then_reload(
                async { Err::<(), _>(ClubError::query("denied")) },
                async { Ok::<_, ClubError>(()) },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "denied");
    }

    #[tokio::test]
    async fn test_result_after_unmount_is_dropped() {
        let guard = FetchGuard::new();
        let token = guard.token();
        let result = guard
            .run(async move {
                token.cancel();
                vec![1, 2, 3]
            })
            .await;
        assert_eq!(result, None);
    }
}
