//! Dispatch actor - runs sends on the Tokio runtime for a UI that cannot await

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::messages::{DispatchCommand, DispatchEvent};
use crate::models::{ApiRequest, Environment};
use crate::network::dispatcher::Dispatcher;
use crate::network::executor::RequestExecutor;

type CancelHandles = Arc<Mutex<HashMap<u64, oneshot::Sender<()>>>>;

/// Processes dispatch commands; every send runs as its own task
pub struct DispatchActor<E> {
    dispatcher: Dispatcher<E>,
    event_tx: mpsc::UnboundedSender<DispatchEvent>,
    active_sends: JoinSet<()>,
    cancel_handles: CancelHandles,
}

impl<E: RequestExecutor + 'static> DispatchActor<E> {
    pub fn new(dispatcher: Dispatcher<E>, event_tx: mpsc::UnboundedSender<DispatchEvent>) -> Self {
        DispatchActor {
            dispatcher,
            event_tx,
            active_sends: JoinSet::new(),
            cancel_handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn take_handle(handles: &CancelHandles, id: u64) -> Option<oneshot::Sender<()>> {
        handles.lock().ok().and_then(|mut map| map.remove(&id))
    }

    fn spawn_send(&mut self, id: u64, request: ApiRequest, environment: Option<Environment>) {
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        if let Ok(mut handles) = self.cancel_handles.lock() {
            handles.insert(id, cancel_tx);
        }

        let dispatcher = self.dispatcher.clone();
        let event_tx = self.event_tx.clone();
        let handles = Arc::clone(&self.cancel_handles);

        self.active_sends.spawn(async move {
            tokio::select! {
                biased;

                _ = &mut cancel_rx => {
                    // Cancel event is emitted by the actor loop
                }
                response = dispatcher.send(&request, environment.as_ref()) => {
                    // A missing handle means a cancel won the race
                    if Self::take_handle(&handles, id).is_some() {
                        let _ = event_tx.send(DispatchEvent::Completed { id, response });
                    }
                }
            }
        });
    }

    /// Run the actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<DispatchCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(DispatchCommand::Send { id, request, environment }) => {
                            tracing::info!(id, url = %request.url, method = ?request.method, "Dispatching request");
                            self.spawn_send(id, request, environment);
                        }

                        Some(DispatchCommand::Cancel(id)) => {
                            if let Some(cancel_tx) = Self::take_handle(&self.cancel_handles, id) {
                                tracing::info!(id, "Cancelling request");
                                let _ = cancel_tx.send(());
                                let _ = self.event_tx.send(DispatchEvent::Cancelled { id });
                            }
                        }

                        Some(DispatchCommand::Shutdown) | None => {
                            let pending: Vec<_> = match self.cancel_handles.lock() {
                                Ok(mut handles) => handles.drain().collect(),
                                Err(_) => Vec::new(),
                            };
                            for (_, cancel_tx) in pending {
                                let _ = cancel_tx.send(());
                            }
                            break;
                        }
                    }
                }

                Some(_result) = self.active_sends.join_next() => {
                    // Task completed - events are sent by the tasks themselves
                }
            }
        }

        while self.active_sends.join_next().await.is_some() {}
    }
}
