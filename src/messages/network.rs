//! Network messages - communication between the host UI and the dispatch actor

use crate::models::{ApiRequest, ApiResponse, Environment};

/// Commands sent to the dispatch actor
#[derive(Debug, Clone)]
pub enum DispatchCommand {
    /// Send a request, resolving placeholders from `environment` if given
    Send {
        id: u64,
        request: ApiRequest,
        environment: Option<Environment>,
    },
    /// Cancel a pending send
    Cancel(u64),
    /// Shutdown the dispatch actor
    Shutdown,
}

/// Events emitted by the dispatch actor
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A send finished; failures arrive here too as synthetic responses
    Completed { id: u64, response: ApiResponse },
    /// A send was cancelled before it finished
    Cancelled { id: u64 },
}

impl DispatchEvent {
    /// Get the send ID from the event
    pub fn id(&self) -> u64 {
        match self {
            DispatchEvent::Completed { id, .. } => *id,
            DispatchEvent::Cancelled { id } => *id,
        }
    }
}
