use rand::Rng;

/// Source of uniform draws in `[0, 1)` used by weighted selection
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Draws from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Maps a draw in `[0, 1)` onto an index of a collection of `len` items
///
/// `len` must be non-zero. Draws at or above 1.0 are clamped to the last index.
pub fn pick_index(draw: f64, len: usize) -> usize {
    let index = (draw * len as f64).floor() as usize;
    index.min(len - 1)
}
