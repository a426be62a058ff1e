//! pageloader - page-load splash sequencing
//!
//! A loading sequencer that blends an elapsed-time estimate with resource
//! settlement into a never-stalling progress indicator, snaps it to 100%,
//! hands the page over and announces completion exactly once.
//!
//! # Architecture
//!
//! - **sequencer**: state machine, progress estimators, resource tracking
//!   and the tokio runner
//! - **mount**: the surface a sequence renders onto (headless or terminal)
//! - **events**: completion broadcast and diagnostics
//! - **entrance**: staggered element entrances after completion
//! - **widgets**: hero slider, simulated contact form, nav toggle

pub mod errors;
pub use errors::{LoaderError, Result};

pub mod cli;
pub mod config;
pub mod entrance;
pub mod events;
pub mod mount;
pub mod sequencer;
pub mod telemetry;
pub mod widgets;

pub use config::Config;
pub use events::{EventBus, LoaderEvent};
pub use mount::{LoaderMount, RecordingMount, TerminalMount};
pub use sequencer::{LoadingSequencer, PageInputs, SequenceReport, SequenceRunner, SequencerConfig};
