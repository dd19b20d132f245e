//! Host-side scene model.
//!
//! The host owns its objects and sensors and mutates them freely; the world only
//! holds shared handles to them and reads their change flags once per sync.
//!
//! - [`SceneObject`]: a mesh instance (shared vertex buffer + tracked transform)
//! - [`Sensor`]: a virtual ray emitter (tracked transform + [`SensorParams`])
//! - [`TrackedTransform`]: a world matrix with a "moved since last read" flag
//! - [`ObjectSource`]: where a world gets its objects from at registration

pub mod object;
pub mod sensor;
pub mod transform;

pub use object::{ObjectSource, SceneCollection, SceneObject, collect_objects};
pub use sensor::{Sensor, SensorParams, SensorSnapshot};
pub use transform::{TrackedTransform, TransformHandle};
