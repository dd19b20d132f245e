use crate::backend::{BufferHandle, RawHits, RayEngine};
use crate::math::Vec3;

/// Scoped view of an engine-owned hit buffer.
///
/// Holds the engine mutably for as long as it lives, so no other boundary call can
/// run while the points are readable. The handle is released exactly once: by
/// [`release`](Self::release) or on drop, whichever comes first.
pub struct HitBuffer<'e, E: RayEngine + ?Sized> {
    engine: &'e mut E,
    handle: Option<BufferHandle>,
    points: *const Vec3,
    count: usize,
}

impl<'e, E: RayEngine + ?Sized> HitBuffer<'e, E> {
    pub(crate) fn new(engine: &'e mut E, raw: RawHits) -> Self {
        Self {
            engine,
            handle: Some(raw.handle),
            points: raw.points,
            count: raw.count,
        }
    }

    pub fn len(&self) -> usize {
        if self.points.is_null() { 0 } else { self.count }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The hit points, valid until this buffer is released.
    pub fn points(&self) -> &[Vec3] {
        if self.points.is_null() || self.count == 0 {
            return &[];
        }
        // SAFETY: `RayEngine` implementors keep `count` points alive behind
        // `points` until the handle is released, and the handle is only released
        // through `self`, which this borrow outlives.
        unsafe { std::slice::from_raw_parts(self.points, self.count) }
    }

    /// Copies the points into host-owned storage.
    pub fn to_vec(&self) -> Vec<Vec3> {
        self.points().to_vec()
    }

    /// Releases the handle now. Returns the engine's answer.
    pub fn release(mut self) -> bool {
        self.release_inner()
    }

    fn release_inner(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };
        let raw = handle.raw();
        self.points = std::ptr::null();
        self.count = 0;

        let known = self.engine.release(handle);
        if !known {
            log::warn!("Engine did not recognise hit buffer handle {}", raw);
        }
        known
    }
}

impl<E: RayEngine + ?Sized> Drop for HitBuffer<'_, E> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<E: RayEngine + ?Sized> std::fmt::Debug for HitBuffer<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HitBuffer")
            .field("handle", &self.handle)
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{Call, MockEngine};

    #[test]
    fn test_drop_releases_once() {
        let mut engine = MockEngine::with_hits(vec![Vec3::X, Vec3::Y]);
        let state = engine.state.clone();

        {
            let raw = engine.fire_sensors().unwrap();
            let buffer = HitBuffer::new(&mut engine, raw);
            assert_eq!(buffer.len(), 2);
            assert_eq!(buffer.points(), &[Vec3::X, Vec3::Y]);
        }

        let state = state.lock().unwrap();
        assert_eq!(state.releases(), 1);
        assert_eq!(state.calls.last(), Some(&Call::Release { handle: 1, known: true }));
        assert!(state.outstanding.is_empty());
    }

    #[test]
    fn test_explicit_release_is_not_repeated_on_drop() {
        let mut engine = MockEngine::with_hits(vec![Vec3::Z]);
        let state = engine.state.clone();

        let raw = engine.fire_sensors().unwrap();
        let buffer = HitBuffer::new(&mut engine, raw);
        let copied = buffer.to_vec();
        assert!(buffer.release());

        assert_eq!(copied, vec![Vec3::Z]);
        assert_eq!(state.lock().unwrap().releases(), 1);
    }

    #[test]
    fn test_empty_buffer_reads_as_empty_slice() {
        let mut engine = MockEngine::new();
        let state = engine.state.clone();

        let raw = engine.fire_sensors().unwrap();
        assert!(raw.points.is_null());
        let buffer = HitBuffer::new(&mut engine, raw);
        assert!(buffer.is_empty());
        assert!(buffer.points().is_empty());
        drop(buffer);

        assert_eq!(state.lock().unwrap().releases(), 1);
    }

    #[test]
    fn test_release_during_unwind() {
        let mut engine = MockEngine::with_hits(vec![Vec3::ONE]);
        let state = engine.state.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let raw = engine.fire_sensors().unwrap();
            let buffer = HitBuffer::new(&mut engine, raw);
            if !buffer.points().is_empty() {
                panic!("consumer failed");
            }
        }));

        assert!(result.is_err());
        assert_eq!(state.lock().unwrap().releases(), 1);
    }
}
