//! Recording system module
//!
//! - CaptureClock turns host ticks into fixed-cadence capture slots
//! - Key bindings start and stop a recording
//! - RecordingController owns the frame buffer and hands it to the exporter

pub mod clock;
pub mod controller;
pub mod input;
pub mod state;

pub use clock::CaptureClock;
pub use controller::{RecordingController, RecordingEvent, TickReport};
pub use input::{KeyEdges, KeyId, KeyInput, NoInput};
pub use state::{RecordingSession, RecordingState, StopOutcome};
