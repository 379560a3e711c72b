//! Bounded, cancellable fan-out over independent documents.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Run `work` over `items` on at most `jobs` scoped worker threads.
///
/// Results come back in input order. Once `cancel` is set no further item
/// is started; items already in flight run to completion, and items never
/// started are `None`. A `jobs` of zero is treated as one.
pub fn run_bounded<T, R, F>(items: &[T], jobs: usize, cancel: &AtomicBool, work: F) -> Vec<Option<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = jobs.clamp(1, items.len().max(1));
    let next = AtomicUsize::new(0);
    let next = &next;
    let work = &work;

    let finished: Vec<Vec<(usize, R)>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    while !cancel.load(Ordering::SeqCst) {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(item) = items.get(index) else {
                            break;
                        };
                        done.push((index, work(item)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });

    let mut results: Vec<Option<R>> = items.iter().map(|_| None).collect();
    for (index, result) in finished.into_iter().flatten() {
        results[index] = Some(result);
    }
    results
}
