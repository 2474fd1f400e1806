//! Message types exchanged between a host UI and the dispatch actor.

pub mod network;

pub use network::{DispatchCommand, DispatchEvent};
