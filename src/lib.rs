//! Animated glyph-field background: moving metaball forms drawn as a
//! character grid, with a centred logo and adaptive frame pacing.

pub mod animation;
pub mod color;
pub mod config;
pub mod emitter;
pub mod grid;
pub mod noise;
pub mod pacing;
pub mod render;
pub mod sim;
pub mod style;

pub use animation::{Animation, FrameOutcome, StopHandle};
pub use config::Config;
pub use sim::{Simulation, Viewport};
pub use style::RenderStyle;
