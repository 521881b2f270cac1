//! HTTP API so a chat bridge can drive the tracker

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::CommandRouter;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<CommandRouter>,
}

impl AppState {
    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }
}
