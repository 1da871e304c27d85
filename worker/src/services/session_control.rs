//! `SessionControl` backed by the coordinator
//!
//! Lets any worker start and stop sibling sessions through the same
//! filesystem registry the CLI uses.

use async_trait::async_trait;

use coordinator::{Coordinator, ProcessLifecycle, SessionRegistry, StartOutcome, StopOutcome};
use shared::{SessionId, SessionSummary};

use crate::error::WorkerResult;
use crate::traits::SessionControl;

#[async_trait]
impl<R, P> SessionControl for Coordinator<R, P>
where
    R: SessionRegistry + 'static,
    P: ProcessLifecycle + 'static,
{
    async fn list(&self) -> Vec<SessionSummary> {
        self.list_sessions().await.iter().map(|status| status.to_summary()).collect()
    }

    async fn start(&self, preference: &str) -> WorkerResult<StartOutcome> {
        Ok(self.start_session(preference).await?)
    }

    async fn stop(&self, session_id: &SessionId) -> WorkerResult<StopOutcome> {
        Ok(self.stop_session(session_id).await?)
    }
}
