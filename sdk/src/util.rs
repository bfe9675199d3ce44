use {
    crate::error::Result,
    std::{num::NonZeroUsize, panic, thread},
    tokio::{
        runtime::{Handle, RuntimeFlavor},
        task::block_in_place,
    },
};

#[inline]
pub(crate) fn byte_len(bytes: &[u8]) -> u64 {
    bytes.len().try_into().unwrap_or(u64::MAX)
}

#[inline]
pub(crate) fn to_usize(value: u64) -> Option<usize> {
    value.try_into().ok()
}

/// Runs CPU-heavy work without stalling other tasks on a multi-thread runtime.
///
/// `block_in_place` panics on a current-thread runtime, so there the closure
/// runs inline.
pub(crate) fn maybe_block_in_place<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => block_in_place(f),
        _ => f(),
    }
}

/// Applies `f` to every item on a set of scoped threads.
///
/// Items are split into contiguous groups, one per thread, so each thread owns
/// whatever mutable state its items carry. Returns the first error in item order.
pub(crate) fn run_parallel<T, F>(items: &mut [T], f: F) -> Result<()>
where
    T: Send,
    F: Fn(&mut T) -> Result<()> + Sync,
{
    let threads = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(items.len());
    if threads <= 1 {
        return items.iter_mut().try_for_each(&f);
    }
    let group_len = items.len().div_ceil(threads);
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks_mut(group_len)
            .map(|group| scope.spawn(move || group.iter_mut().try_for_each(f)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|err| panic::resume_unwind(err)))
            .collect::<Result<()>>()
    })
}
