//! Network layer - request dispatch and the executor boundary
//!
//! The dispatcher resolves placeholders and normalizes outcomes; the executor
//! performs the actual HTTP exchange.

pub mod actor;
pub mod client;
pub mod dispatcher;
pub mod executor;

pub use actor::DispatchActor;
pub use client::ReqwestExecutor;
pub use dispatcher::Dispatcher;
pub use executor::{NormalizedRequest, RawResponse, RequestExecutor, TransportError};
