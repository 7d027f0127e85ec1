use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Counter for long running batches, reported once the batch completes.
pub struct ProgressBar {
    desc: RwLock<&'static str>,
    steps_done: AtomicUsize,
    step_count: AtomicUsize,
}

impl ProgressBar {
    pub const fn new() -> Self {
        Self {
            desc: RwLock::new("???"),
            steps_done: AtomicUsize::new(0),
            step_count: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, desc: &'static str, step_count: usize) {
        *self.desc.write().unwrap_or_else(PoisonError::into_inner) = desc;
        self.step_count.store(step_count, Ordering::SeqCst);
        self.steps_done.store(0, Ordering::SeqCst);
    }

    pub fn step(&self) {
        self.steps_done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn step_n(&self, n: usize) {
        self.steps_done.fetch_add(n, Ordering::Relaxed);
    }

    /// Fraction of steps done, between zero and one.
    pub fn progress(&self) -> f64 {
        let steps_done = self.steps_done.load(Ordering::Relaxed);
        let step_count = self.step_count.load(Ordering::Relaxed);

        if step_count == 0 {
            return 1.0;
        }

        (steps_done as f64 / step_count as f64).clamp(0.0, 1.0)
    }

    pub fn summary(&self) -> String {
        let desc = self.desc.read().unwrap_or_else(PoisonError::into_inner);
        let steps_done = self.steps_done.load(Ordering::Relaxed);
        let step_count = self.step_count.load(Ordering::Relaxed);

        format!("{desc}: {steps_done}/{step_count} ({:.1}%)", self.progress() * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_steps() {
        let bar = ProgressBar::new();
        bar.set("Transcoding", 4);
        bar.step();
        bar.step_n(2);

        assert_eq!(bar.progress(), 0.75);
        assert_eq!(bar.summary(), "Transcoding: 3/4 (75.0%)");
    }

    #[test]
    fn empty_batches_are_done() {
        let bar = ProgressBar::new();
        bar.set("Nothing", 0);

        assert_eq!(bar.progress(), 1.0);
    }
}
