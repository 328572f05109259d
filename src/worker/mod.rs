//! Interception Worker Module
//!
//! Versioned request-interception layer: lifecycle state machine, pure
//! routing policy, generation storage and the registration/update flow.

mod lifecycle;
mod messages;
mod network;
mod registration;
mod request;
mod routing;
mod service_worker;
mod storage;

pub use lifecycle::{transition, LifecycleEvent, WorkerState};
pub use messages::{ClientMessage, VersionReply, WorkerMessage};
pub use network::{Network, OriginNetwork};
pub use registration::{ContainerEvent, WorkerContainer};
pub use request::{Destination, InterceptedRequest, RequestMode};
pub use routing::{
    is_api_request, is_navigation_request, is_static_asset, RoutePolicy, Strategy,
    DEFAULT_API_ENDPOINTS,
};
pub use service_worker::{
    dynamic_generation_name, static_generation_name, Notification, NotificationAction,
    ServiceWorker, WorkerConfig, DEFAULT_STATIC_MANIFEST, IMAGE_FALLBACK, OFFLINE_API_BODY,
    OFFLINE_DOCUMENT,
};
pub use storage::{DiskGenerations, GenerationStorage, MemoryGenerations};

#[cfg(test)]
pub(crate) use network::mock;
