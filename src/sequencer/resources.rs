//! Trackable page resources
//!
//! A resource is anything the page waits on before it looks ready: images,
//! stylesheets and external scripts. Loading and failing are both terminal
//! ("settled"); a broken image must not hold the splash screen up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::oneshot;

/// Kind of tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Image,
    Stylesheet,
    Script,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Image => write!(f, "image"),
            ResourceKind::Stylesheet => write!(f, "stylesheet"),
            ResourceKind::Script => write!(f, "script"),
        }
    }
}

/// Terminal outcome of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Settlement {
    Loaded,
    Failed,
}

/// Position of a resource in the list enumerated at start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub usize);

/// What a resource is and where it comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub url: String,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

/// A resource the sequencer can wait on
#[async_trait]
pub trait ResourceSource: Send {
    fn descriptor(&self) -> &ResourceDescriptor;

    /// Outcome if the resource had already settled when tracking began
    fn already_settled(&self) -> Option<Settlement> {
        None
    }

    /// Resolve once the resource loads or fails
    async fn settled(self: Box<Self>) -> Settlement;
}

/// Resource with a fixed latency and outcome, for demos and tests
#[derive(Debug, Clone)]
pub struct SimulatedResource {
    descriptor: ResourceDescriptor,
    latency: Duration,
    outcome: Settlement,
}

impl SimulatedResource {
    pub fn new(descriptor: ResourceDescriptor, latency: Duration, outcome: Settlement) -> Self {
        Self {
            descriptor,
            latency,
            outcome,
        }
    }

    /// Already in cache: settled before tracking starts
    pub fn cached(descriptor: ResourceDescriptor) -> Self {
        Self::new(descriptor, Duration::ZERO, Settlement::Loaded)
    }
}

#[async_trait]
impl ResourceSource for SimulatedResource {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn already_settled(&self) -> Option<Settlement> {
        self.latency.is_zero().then_some(self.outcome)
    }

    async fn settled(self: Box<Self>) -> Settlement {
        tokio::time::sleep(self.latency).await;
        self.outcome
    }
}

/// Resource settled by the host through a [`ResourceNotifier`]
pub struct ChannelResource {
    descriptor: ResourceDescriptor,
    receiver: oneshot::Receiver<Settlement>,
}

/// Host-side handle reporting a resource's outcome
pub struct ResourceNotifier {
    sender: oneshot::Sender<Settlement>,
}

/// Create a host-driven resource and its notifier
pub fn resource_channel(descriptor: ResourceDescriptor) -> (ResourceNotifier, ChannelResource) {
    let (sender, receiver) = oneshot::channel();
    (
        ResourceNotifier { sender },
        ChannelResource {
            descriptor,
            receiver,
        },
    )
}

impl ResourceNotifier {
    pub fn loaded(self) {
        let _ = self.sender.send(Settlement::Loaded);
    }

    pub fn failed(self) {
        let _ = self.sender.send(Settlement::Failed);
    }
}

#[async_trait]
impl ResourceSource for ChannelResource {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    async fn settled(self: Box<Self>) -> Settlement {
        // A notifier dropped without reporting counts as a failed load.
        self.receiver.await.unwrap_or(Settlement::Failed)
    }
}

/// Settlement bookkeeping for the resources enumerated at start
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    kinds: Vec<ResourceKind>,
    settled: HashMap<ResourceId, Settlement>,
}

impl ResourceTracker {
    pub fn new(kinds: Vec<ResourceKind>) -> Self {
        Self {
            kinds,
            settled: HashMap::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.kinds.len()
    }

    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.count(Settlement::Loaded)
    }

    pub fn failed_count(&self) -> usize {
        self.count(Settlement::Failed)
    }

    pub fn kind(&self, id: ResourceId) -> Option<ResourceKind> {
        self.kinds.get(id.0).copied()
    }

    /// Record a settlement; unknown ids and repeats are ignored
    pub fn settle(&mut self, id: ResourceId, outcome: Settlement) -> bool {
        if id.0 >= self.kinds.len() || self.settled.contains_key(&id) {
            return false;
        }
        self.settled.insert(id, outcome);
        true
    }

    pub fn all_settled(&self) -> bool {
        self.settled.len() == self.kinds.len()
    }

    fn count(&self, outcome: Settlement) -> usize {
        self.settled.values().filter(|s| **s == outcome).count()
    }
}
