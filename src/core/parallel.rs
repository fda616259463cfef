//! Per-player map phase on scoped worker threads.
//!
//! Items are split into contiguous chunks, each worker sends its
//! `(index, result)` pairs back over a channel, and results are put back in
//! input order before any reduction happens.

use crossbeam_channel::unbounded;
use std::thread;

/// Below this many items the work runs on the calling thread.
const MIN_PARALLEL_ITEMS: usize = 64;

/// Default worker count: available parallelism, or 1 if unknown.
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Map `f` over `items`, preserving order.
pub fn par_map<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = workers.max(1).min(items.len().max(1));
    if workers == 1 || items.len() < MIN_PARALLEL_ITEMS {
        return items.iter().map(f).collect();
    }

    let chunk_size = items.len().div_ceil(workers);
    let (sender, receiver) = unbounded();
    let f = &f;

    thread::scope(|scope| {
        for (chunk_index, chunk) in items.chunks(chunk_size).enumerate() {
            let sender = sender.clone();
            scope.spawn(move || {
                let offset = chunk_index * chunk_size;
                for (i, item) in chunk.iter().enumerate() {
                    // The receiver outlives the scope
                    let _ = sender.send((offset + i, f(item)));
                }
            });
        }
    });
    drop(sender);

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    for (index, result) in receiver {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_input_runs_inline() {
        let out = par_map(&[1, 2, 3], 8, |x| x * 2);
        assert_eq!(out, vec![2, 4, 6]);
    }

    #[test]
    fn test_order_is_preserved() {
        let items: Vec<u64> = (0..1_000).collect();
        let out = par_map(&items, 4, |x| x * x);
        let expected: Vec<u64> = items.iter().map(|x| x * x).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_input() {
        let out: Vec<i32> = par_map(&[] as &[i32], 4, |x| *x);
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        let items: Vec<u32> = (0..100).collect();
        assert_eq!(par_map(&items, 0, |x| x + 1).len(), 100);
    }
}
