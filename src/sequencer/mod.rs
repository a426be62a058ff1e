//! Page-load sequencing
//!
//! The clock-free [`LoadingSequencer`] core, its state machine, progress
//! estimators and resource tracking, plus the tokio [`SequenceRunner`]
//! that drives it against a mount.

pub mod loader;
pub mod progress;
pub mod resources;
pub mod runtime;
pub mod state;

pub use loader::{LoadingSequencer, SequencerConfig, SettleOutcome};
pub use progress::{Easing, LoadProgress};
pub use resources::{
    resource_channel, ChannelResource, ResourceDescriptor, ResourceId, ResourceKind,
    ResourceNotifier, ResourceSource, ResourceTracker, Settlement, SimulatedResource,
};
pub use runtime::{PageInputs, SequenceReport, SequenceRunner};
pub use state::{CompletionCause, SequencerEvent, SequencerState};
