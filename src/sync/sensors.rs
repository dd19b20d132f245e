use crate::scene::{Sensor, SensorSnapshot};
use std::sync::Arc;

/// The active sensor set.
///
/// Sensors are never diffed individually: if any one of them is dirty the whole set
/// is sent again.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: Vec<Arc<Sensor>>,
    force_push: bool,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole set. The next [`evaluate`](Self::evaluate) reports it
    /// changed, whatever the sensors' own dirty flags say.
    pub fn set_sensors(&mut self, sensors: Vec<Arc<Sensor>>) {
        self.sensors = sensors;
        self.force_push = true;
    }

    pub fn clear(&mut self) {
        self.sensors.clear();
        self.force_push = false;
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn sensors(&self) -> &[Arc<Sensor>] {
        &self.sensors
    }

    /// Returns the full current set if anything changed since the last call.
    ///
    /// Every sensor's dirty flag is consumed, not just the first dirty one.
    pub fn evaluate(&mut self) -> Option<Vec<SensorSnapshot>> {
        let mut changed = std::mem::take(&mut self.force_push);
        for sensor in &self.sensors {
            changed |= sensor.take_dirty();
        }

        if !changed || self.sensors.is_empty() {
            return None;
        }

        Some(self.sensors.iter().map(|sensor| sensor.snapshot()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec3};
    use crate::scene::SensorParams;

    fn sensor(name: &str) -> Arc<Sensor> {
        Sensor::new(name, Mat4::IDENTITY, SensorParams::default())
            .unwrap()
            .into_shared()
    }

    #[test]
    fn test_new_set_is_pushed_once() {
        let mut registry = SensorRegistry::new();
        registry.set_sensors(vec![sensor("a"), sensor("b")]);

        let pushed = registry.evaluate().expect("initial push");
        assert_eq!(pushed.len(), 2);
        assert!(registry.evaluate().is_none());
    }

    #[test]
    fn test_one_dirty_sensor_sends_the_whole_set() {
        let a = sensor("a");
        let b = sensor("b");
        let mut registry = SensorRegistry::new();
        registry.set_sensors(vec![a.clone(), b.clone()]);
        registry.evaluate();

        b.transform().set_position(Vec3::new(0.0, 0.0, 3.0));
        let pushed = registry.evaluate().expect("b moved");
        assert_eq!(pushed.len(), 2);
        assert_eq!(pushed[1].transform, Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0)));
        assert!(registry.evaluate().is_none());
    }

    #[test]
    fn test_all_dirty_flags_are_consumed() {
        let a = sensor("a");
        let b = sensor("b");
        let mut registry = SensorRegistry::new();
        registry.set_sensors(vec![a.clone(), b.clone()]);
        registry.evaluate();

        a.transform().set_position(Vec3::X);
        b.set_params(SensorParams {
            radius: 90.0,
            ..Default::default()
        })
        .unwrap();
        assert!(registry.evaluate().is_some());
        assert!(!a.is_dirty());
        assert!(!b.is_dirty());
    }

    #[test]
    fn test_empty_set_never_pushes() {
        let mut registry = SensorRegistry::new();
        registry.set_sensors(Vec::new());
        assert!(registry.evaluate().is_none());
    }
}
