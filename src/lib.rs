//! Gesture engine for a tremolo stompbox panel.
//!
//! Two knobs, a shape knob and a bypass switch edit host-owned parameters
//! under a begin / edit / end protocol, and redraw from whatever value the
//! host pushes back. The engine never draws and never reads a platform event
//! queue: hosts hand it [`InputEvent`]s and give it [`Visual`] anchors.

pub mod capture;
pub mod error;
pub mod gesture;
pub mod input;
pub mod mapping;
pub mod model;
pub mod ownership;
pub mod parameter;
pub mod render;
pub mod rotary;
pub mod surface;
pub mod toggle;

#[cfg(test)]
mod testing;

pub use capture::{Capture, ControlId, InputRouter};
pub use error::ConfigError;
pub use gesture::{EditGesture, set_value_as_gesture};
pub use input::{InputEvent, Propagation, TouchPoint};
pub use mapping::{DEFAULT_MAX_ROTATION, RangeMapper};
pub use model::{EditPolicy, ParameterModel};
pub use ownership::{EditResolver, Ownership};
pub use parameter::{Listener, Parameter, Subscription, Unbound};
pub use render::{Negated, UpdateHandle, Visual, VisualState};
pub use rotary::{DragSpeed, RotaryConfig, RotaryControl, RotaryState};
pub use surface::{AnchorSource, ControlSurface, Options, Parameters, SURFACE_MAX_ROTATION, Slot};
pub use toggle::ToggleControl;
