use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Control value used until the first successful fetch.
pub const DEFAULT_CONTROL_VALUE: f32 = 0.5;

/// Shared, lock-free holder for the normalized control value.
///
/// Clones share the same slot. The poller is the only writer and the render
/// loop only reads, so a relaxed atomic holding the `f32` bit pattern is all
/// the coordination needed.
#[derive(Clone, Debug)]
pub struct ControlCell {
    bits: Arc<AtomicU32>,
}

impl ControlCell {
    /// Creates a cell holding `initial`, clamped to `[0, 1]`.
    ///
    /// Non-finite values fall back to [`DEFAULT_CONTROL_VALUE`].
    pub fn new(initial: f32) -> Self {
        let value = sanitize(initial).unwrap_or(DEFAULT_CONTROL_VALUE);
        Self {
            bits: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Stores `value` clamped to `[0, 1]`. NaN and infinities are ignored.
    pub fn set(&self, value: f32) {
        if let Some(value) = sanitize(value) {
            self.bits.store(value.to_bits(), Ordering::Relaxed);
        }
    }
}

impl Default for ControlCell {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROL_VALUE)
    }
}

fn sanitize(value: f32) -> Option<f32> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_half() {
        assert_eq!(ControlCell::default().get(), 0.5);
    }

    #[test]
    fn clones_share_the_same_value() {
        let writer = ControlCell::default();
        let reader = writer.clone();
        writer.set(0.25);
        assert_eq!(reader.get(), 0.25);
    }

    #[test]
    fn set_clamps_and_rejects_non_finite() {
        let cell = ControlCell::new(0.3);
        cell.set(f32::NAN);
        assert_eq!(cell.get(), 0.3);
        cell.set(4.0);
        assert_eq!(cell.get(), 1.0);
        cell.set(-1.0);
        assert_eq!(cell.get(), 0.0);
        assert_eq!(ControlCell::new(f32::INFINITY).get(), DEFAULT_CONTROL_VALUE);
    }
}
