//! Sonification of proximity data.
//!
//! Depth frames become a contour, the contour becomes a gain curve for the
//! synthesis engine, and the summed gain drives an enter/exit trigger.

pub mod contour;
pub mod engine;
pub mod sensor;
pub mod trigger;

pub use contour::{fill_alpha, GainContour, GainSummary, BASELINE};
pub use engine::{AnalysisEngine, SynthEngine, SyntheticFeed};
pub use sensor::{project_frame, DepthFrame, DepthSource, SimulatedDepth};
pub use trigger::{Trigger, TriggerState};
