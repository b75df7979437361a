use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight flag shared by every cash-spending action of one account.
///
/// Not a queue: a caller that finds the lock held is expected to skip its
/// action, and the next natural trigger re-evaluates from scratch.
#[derive(Clone, Debug, Default)]
pub struct ActionLock {
    held: Arc<AtomicBool>,
}

impl ActionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock if free. Released when the returned guard drops,
    /// on every exit path including panics and `?` returns.
    pub fn try_acquire(&self) -> Option<ActionGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActionGuard {
                held: Arc::clone(&self.held),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ActionGuard {
    held: Arc<AtomicBool>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let lock = ActionLock::new();

        let guard = lock.try_acquire().expect("free lock");
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());

        drop(guard);
        assert!(!lock.is_held());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let a = ActionLock::new();
        let b = a.clone();

        let _g = a.try_acquire().unwrap();
        assert!(b.is_held());
        assert!(b.try_acquire().is_none());
    }

    #[test]
    fn released_on_early_return() {
        fn failing(lock: &ActionLock) -> Result<(), &'static str> {
            let _guard = lock.try_acquire().ok_or("held")?;
            Err("remote call failed")
        }

        let lock = ActionLock::new();
        assert!(failing(&lock).is_err());
        assert!(!lock.is_held());
    }

    #[test]
    fn only_one_thread_wins() {
        let lock = ActionLock::new();
        let start = Arc::new(std::sync::Barrier::new(8));
        let tried = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let start = Arc::clone(&start);
                let tried = Arc::clone(&tried);
                std::thread::spawn(move || {
                    start.wait();
                    let g = lock.try_acquire();
                    // Winner keeps the guard until everyone has tried.
                    tried.wait();
                    g.is_some()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
