use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a "running" flag for the duration of a run. The flag is cleared on
/// drop, including early returns and panics.
pub struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    /// `None` when another run already holds the flag.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rejects_overlap_and_releases_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = RunGuard::acquire(&flag).unwrap();
        assert!(RunGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(RunGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn released_when_the_holding_task_panics() {
        let flag = Arc::new(AtomicBool::new(false));
        let held = flag.clone();
        let task = tokio::spawn(async move {
            let _guard = RunGuard::acquire(&held).unwrap();
            panic!("job failed mid-run");
        });

        assert!(task.await.is_err());
        assert!(!flag.load(Ordering::Acquire));
        assert!(RunGuard::acquire(&flag).is_some());
    }
}
