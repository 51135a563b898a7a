//! Server state

use std::sync::Arc;

use crate::config::Config;
use crate::deploy::dispatcher::Dispatcher;
use crate::signature::SignatureVerifier;

/// Server state shared across handlers
pub struct ServerState {
    pub config: Arc<Config>,
    pub verifier: SignatureVerifier,
    pub dispatcher: Arc<Dispatcher>,
}

impl ServerState {
    pub fn new(
        config: Arc<Config>,
        verifier: SignatureVerifier,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            config,
            verifier,
            dispatcher,
        }
    }
}
