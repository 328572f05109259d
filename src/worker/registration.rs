//! Worker registration
//!
//! Application-side view of the worker: which version controls requests,
//! which one waits, and the update flow between them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::client::HttpResponse;
use crate::error::Result;
use crate::worker::{
    ClientMessage, InterceptedRequest, Network, ServiceWorker, VersionReply, WorkerMessage,
    WorkerState,
};

const EVENT_CAPACITY: usize = 16;

// == Container Events ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContainerEvent {
    /// A new version installed while another one controls requests
    UpdateAvailable { version: String },
    ControllerChanged { version: String },
    /// The application should reload; emitted at most once
    ReloadRequested,
    InstallFailed { version: String, reason: String },
}

// == Worker Container ==
pub struct WorkerContainer {
    network: Arc<dyn Network>,
    controller: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
    events: broadcast::Sender<ContainerEvent>,
    reload_requested: AtomicBool,
    /// Serializes registration and controller handover
    handover: Mutex<()>,
}

impl WorkerContainer {
    /// `network` answers requests while no worker controls them.
    pub fn new(network: Arc<dyn Network>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            network,
            controller: RwLock::new(None),
            waiting: RwLock::new(None),
            events,
            reload_requested: AtomicBool::new(false),
            handover: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContainerEvent> {
        self.events.subscribe()
    }

    pub fn controller(&self) -> Option<Arc<ServiceWorker>> {
        self.controller
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update_available(&self) -> bool {
        self.waiting().is_some()
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested.load(Ordering::SeqCst)
    }

    fn emit(&self, event: ContainerEvent) {
        info!("[SW] {:?}", event);
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // == Register ==
    /// Installs `worker`. With no controller it activates and takes control
    /// at once; otherwise it waits and an update is announced. A failed
    /// install leaves the current controller in place.
    pub async fn register(&self, worker: Arc<ServiceWorker>) -> Result<()> {
        let _guard = self.handover.lock().await;

        if let Err(e) = worker.install().await {
            self.emit(ContainerEvent::InstallFailed {
                version: worker.version().to_string(),
                reason: e.to_string(),
            });
            return Err(e);
        }

        if self.controller().is_none() {
            worker.activate().await?;
            *self.controller.write().unwrap_or_else(|e| e.into_inner()) = Some(worker.clone());
            self.emit(ContainerEvent::ControllerChanged {
                version: worker.version().to_string(),
            });
            return Ok(());
        }

        let previous = self
            .waiting
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(worker.clone());
        if let Some(previous) = previous {
            if let Err(e) = previous.replace() {
                warn!("[SW] Superseded waiting worker: {}", e);
            }
        }
        self.emit(ContainerEvent::UpdateAvailable {
            version: worker.version().to_string(),
        });
        Ok(())
    }

    // == Update Flow ==
    /// Tells the waiting worker to skip waiting. Returns false when there
    /// is no update to accept.
    pub async fn accept_update(&self) -> Result<bool> {
        if !self.update_available() {
            return Ok(false);
        }
        self.post_message(ClientMessage::SkipWaiting).await?;
        Ok(true)
    }

    /// Delivers a wire message. `SKIP_WAITING` goes to the waiting worker
    /// when there is one; `GET_VERSION` is answered by the controller.
    pub async fn post_message(&self, message: ClientMessage) -> Result<Option<VersionReply>> {
        let _guard = self.handover.lock().await;
        let (message, reply) = WorkerMessage::from_client(message);

        match message {
            WorkerMessage::SkipWaiting => {
                let Some(target) = self.waiting().or_else(|| self.controller()) else {
                    return Ok(None);
                };
                target.post_message(WorkerMessage::SkipWaiting).await?;
                self.promote_waiting();
                Ok(None)
            }
            get_version @ WorkerMessage::GetVersion { .. } => {
                let Some(controller) = self.controller() else {
                    return Ok(None);
                };
                controller.post_message(get_version).await?;
                match reply {
                    Some(receiver) => Ok(receiver.await.ok()),
                    None => Ok(None),
                }
            }
        }
    }

    pub async fn get_version(&self) -> Result<Option<String>> {
        Ok(self
            .post_message(ClientMessage::GetVersion)
            .await?
            .map(|reply| reply.version))
    }

    /// Hands control to the waiting worker once it has activated.
    fn promote_waiting(&self) {
        let activated = {
            let mut waiting = self.waiting.write().unwrap_or_else(|e| e.into_inner());
            match waiting.as_ref() {
                Some(worker) if worker.state() == WorkerState::Activated => waiting.take(),
                _ => None,
            }
        };
        let Some(worker) = activated else {
            return;
        };

        let old = self
            .controller
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(worker.clone());
        if let Some(old) = old {
            if let Err(e) = old.replace() {
                warn!("[SW] Retiring controller {}: {}", old.version(), e);
            }
        }

        self.emit(ContainerEvent::ControllerChanged {
            version: worker.version().to_string(),
        });
        if !self.reload_requested.swap(true, Ordering::SeqCst) {
            self.emit(ContainerEvent::ReloadRequested);
        }
    }

    // == Fetch ==
    /// Routes a request through the controller, or straight to the
    /// network when nothing controls the page.
    pub async fn handle_fetch(&self, request: &InterceptedRequest) -> Result<HttpResponse> {
        match self.controller() {
            Some(worker) => worker.handle_fetch(request).await,
            None => self.network.fetch(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::worker::mock::FakeNetwork;
    use crate::worker::{GenerationStorage, MemoryGenerations, WorkerConfig};

    struct Fixture {
        network: Arc<FakeNetwork>,
        storage: Arc<MemoryGenerations>,
        container: WorkerContainer,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(FakeNetwork::new());
        network.serve("/index.html", HttpResponse::new(200, "<html>"));
        Fixture {
            container: WorkerContainer::new(network.clone()),
            storage: Arc::new(MemoryGenerations::new()),
            network,
        }
    }

    fn worker(f: &Fixture, version: &str, manifest: &[&str]) -> Arc<ServiceWorker> {
        let config = WorkerConfig {
            version: version.to_string(),
            static_manifest: manifest.iter().map(|s| s.to_string()).collect(),
            ..WorkerConfig::default()
        };
        Arc::new(ServiceWorker::new(config, f.storage.clone(), f.network.clone()))
    }

    fn drain(rx: &mut broadcast::Receiver<ContainerEvent>) -> Vec<ContainerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_first_worker_takes_control() {
        let f = fixture();
        let mut rx = f.container.subscribe();

        f.container.register(worker(&f, "v1", &["/index.html"])).await.unwrap();

        assert_eq!(f.container.controller().unwrap().state(), WorkerState::Activated);
        assert!(!f.container.update_available());
        assert_eq!(
            drain(&mut rx),
            vec![ContainerEvent::ControllerChanged {
                version: "v1".to_string()
            }]
        );
        assert!(!f.container.reload_requested());
    }

    #[tokio::test]
    async fn test_update_flow_reloads_exactly_once() {
        let f = fixture();
        f.container.register(worker(&f, "v1", &["/index.html"])).await.unwrap();
        let mut rx = f.container.subscribe();

        let v2 = worker(&f, "v2", &["/index.html"]);
        f.container.register(v2.clone()).await.unwrap();
        assert_eq!(v2.state(), WorkerState::Waiting);
        assert_eq!(f.container.get_version().await.unwrap().as_deref(), Some("v1"));

        assert!(f.container.accept_update().await.unwrap());
        assert!(!f.container.accept_update().await.unwrap());

        assert_eq!(
            drain(&mut rx),
            vec![
                ContainerEvent::UpdateAvailable {
                    version: "v2".to_string()
                },
                ContainerEvent::ControllerChanged {
                    version: "v2".to_string()
                },
                ContainerEvent::ReloadRequested,
            ]
        );
        assert_eq!(f.container.get_version().await.unwrap().as_deref(), Some("v2"));

        // The v1 generations are gone, the v2 ones remain
        let mut generations = f.storage.keys().await.unwrap();
        generations.sort();
        assert_eq!(generations, vec!["portfolio-static-v2"]);

        // A further update still swaps controllers but never reloads twice
        f.container.register(worker(&f, "v3", &[])).await.unwrap();
        f.container.accept_update().await.unwrap();
        let later = drain(&mut rx);
        assert!(!later.contains(&ContainerEvent::ReloadRequested));
        assert!(later.contains(&ContainerEvent::ControllerChanged {
            version: "v3".to_string()
        }));
    }

    #[tokio::test]
    async fn test_failed_install_keeps_controller() {
        let f = fixture();
        f.container.register(worker(&f, "v1", &["/index.html"])).await.unwrap();
        let mut rx = f.container.subscribe();

        let broken = worker(&f, "v2", &["/index.html", "/missing.css"]);
        let result = f.container.register(broken.clone()).await;

        assert!(matches!(result, Err(CacheError::InstallFailed { .. })));
        assert_eq!(broken.state(), WorkerState::Redundant);
        assert_eq!(f.container.controller().unwrap().version(), "v1");
        assert!(!f.container.update_available());
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ContainerEvent::InstallFailed { .. }]
        ));
    }

    #[tokio::test]
    async fn test_fetch_without_controller_goes_to_network() {
        let f = fixture();
        let response = f
            .container
            .handle_fetch(&InterceptedRequest::get("/index.html"))
            .await
            .unwrap();
        assert_eq!(response.body, b"<html>");
        assert_eq!(f.container.get_version().await.unwrap(), None);
    }
}
