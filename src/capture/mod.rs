//! Frame capture
//!
//! The host supplies pixels through [`FrameSource`]; this module adapts raw
//! readbacks into RGB frames.

pub mod synthetic;
pub mod traits;

pub use synthetic::{ScrollingGradientSource, SolidColorSource};
pub use traits::{frame_from_bgra, frame_from_rgba, CaptureError, Frame, FrameSource, Resolution};
