//! Server application state shared across handlers

use crate::advice::AdviceHandler;
use crate::feed::FeedStore;
use crate::shutdown::ShutdownState;
use std::sync::Arc;

/// Shared state for the server
#[derive(Clone)]
pub struct ServerAppState {
    /// Advice request handler (prompt + generator + timeout)
    pub advice: Arc<AdviceHandler>,

    /// Shared advice feed
    pub feed: Arc<dyn FeedStore>,

    /// Shutdown state
    pub shutdown_state: ShutdownState,
}

impl ServerAppState {
    pub fn new(
        advice: AdviceHandler,
        feed: Arc<dyn FeedStore>,
        shutdown_state: ShutdownState,
    ) -> Self {
        Self {
            advice: Arc::new(advice),
            feed,
            shutdown_state,
        }
    }
}
