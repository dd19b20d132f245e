//! Host-to-engine scene synchronisation.
//!
//! [`ObjectRegistry`] and [`SensorRegistry`] work out what changed since the last
//! sync; [`SyncProtocol`] turns that into the smallest set of boundary calls.

mod objects;
mod protocol;
mod sensors;

pub use objects::{
    DistanceCulling, EnabledDelta, ObjectDelta, ObjectEntry, ObjectRegistry, TransformDelta,
};
pub use protocol::{SyncProtocol, SyncStats};
pub use sensors::SensorRegistry;
