//! Scoped transactions
//!
//! `TransactionScope` is the begin-or-join guard around a session's
//! transaction. It either opens the session's transaction or a savepoint
//! inside the one the caller already holds, and rolls its level back unless
//! it is committed.

use tracing::debug;

use crate::context::{RequestContext, SessionId};
use crate::ports::Transactional;
use crate::segment::Result;

/// Guard over one transaction level of a session
///
/// ```rust,no_run
/// # use netseg_domain::{RequestContext, TransactionScope};
/// # use netseg_domain::ports::Transactional;
/// # async fn example<T: Transactional>(store: &T) -> netseg_domain::segment::Result<()> {
/// let ctx = RequestContext::new();
/// let scope = TransactionScope::begin_or_join(store, &ctx).await?;
/// // ... writes through `store` with `ctx` ...
/// scope.commit().await?;
/// # Ok(())
/// # }
/// ```
#[must_use = "dropping a scope without committing rolls it back"]
pub struct TransactionScope<'a, T: Transactional> {
    store: &'a T,
    session: SessionId,
    active: bool,
}

impl<'a, T: Transactional> TransactionScope<'a, T> {
    /// Begin a transaction, or join the one already open on the context
    pub async fn begin_or_join(store: &'a T, ctx: &RequestContext) -> Result<Self> {
        let session = *ctx.session();
        store.begin(&session).await?;
        Ok(Self {
            store,
            session,
            active: true,
        })
    }

    /// Commit this level
    pub async fn commit(mut self) -> Result<()> {
        self.active = false;
        self.store.commit(&self.session).await
    }

    /// Roll this level back explicitly
    pub fn rollback(mut self) {
        self.active = false;
        self.store.rollback(&self.session);
    }
}

impl<T: Transactional> Drop for TransactionScope<'_, T> {
    fn drop(&mut self) {
        if self.active {
            debug!(session = %self.session, "Rolling back uncommitted transaction scope");
            self.store.rollback(&self.session);
        }
    }
}
