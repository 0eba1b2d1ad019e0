//! Bounded pool (§5): a fixed-capacity set of reusable handles guarded by a
//! lock and condvar, the standard library idiom for this contract since the
//! corpus carries no direct precedent — `Mutex` serializes access to the
//! idle list, `Condvar` parks a caller that finds the pool both empty and
//! already at capacity instead of spinning.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

struct PoolState<T> {
	idle: Vec<T>,
	live: usize,
}

/// A pool of up to `max_size` values of `T`, created lazily up to that bound
/// and kept warm in an idle list between checkouts. `min_size` values are
/// built eagerly at construction so the first `min_size` concurrent callers
/// never pay construction cost on the hot path.
pub struct Pool<T> {
	state: Mutex<PoolState<T>>,
	available: Condvar,
	max_size: usize,
}

impl<T> Pool<T> {
	pub fn new(min_size: usize, max_size: usize, mut make: impl FnMut() -> T) -> Self {
		assert!(min_size <= max_size, "pool min_size ({min_size}) must not exceed max_size ({max_size})");
		let idle: Vec<T> = (0..min_size).map(|_| make()).collect();
		Self { state: Mutex::new(PoolState { idle, live: min_size }), available: Condvar::new(), max_size }
	}

	/// Blocks until a value is available: either already idle, or the pool
	/// has room to grow past `min_size` up to `max_size`. A caller parked
	/// here wakes when `release` (via `PooledGuard`'s `Drop`) returns a value.
	pub fn acquire(&self, mut make: impl FnMut() -> T) -> PooledGuard<'_, T> {
		let mut state = self.state.lock().unwrap();
		loop {
			if let Some(value) = state.idle.pop() {
				return PooledGuard { pool: self, value: Some(value) };
			}
			if state.live < self.max_size {
				state.live += 1;
				return PooledGuard { pool: self, value: Some(make()) };
			}
			state = self.available.wait(state).unwrap();
		}
	}

	pub fn max_size(&self) -> usize {
		self.max_size
	}

	/// Values currently checked out or warming in the idle list.
	pub fn live_count(&self) -> usize {
		self.state.lock().unwrap().live
	}

	fn release(&self, value: T) {
		let mut state = self.state.lock().unwrap();
		state.idle.push(value);
		drop(state);
		self.available.notify_one();
	}
}

/// A checked-out pool value. Returned to the idle list on drop rather than
/// destroyed, so the pool's `live` count only ever shrinks by process exit.
pub struct PooledGuard<'a, T> {
	pool: &'a Pool<T>,
	value: Option<T>,
}

impl<T> Deref for PooledGuard<'_, T> {
	type Target = T;

	fn deref(&self) -> &T {
		self.value.as_ref().expect("value is only taken in Drop")
	}
}

impl<T> DerefMut for PooledGuard<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		self.value.as_mut().expect("value is only taken in Drop")
	}
}

impl<T> Drop for PooledGuard<'_, T> {
	fn drop(&mut self) {
		if let Some(value) = self.value.take() {
			self.pool.release(value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;
	use std::thread;

	#[test]
	fn eagerly_builds_min_size_up_front() {
		let built = Arc::new(AtomicUsize::new(0));
		let counter = built.clone();
		let pool: Pool<usize> = Pool::new(3, 5, move || counter.fetch_add(1, Ordering::SeqCst));
		assert_eq!(built.load(Ordering::SeqCst), 3);
		assert_eq!(pool.live_count(), 3);
	}

	#[test]
	fn checked_out_value_returns_to_the_idle_list_on_drop() {
		let pool: Pool<usize> = Pool::new(1, 1, || 0);
		{
			let mut guard = pool.acquire(|| 0);
			*guard += 1;
		}
		let guard = pool.acquire(|| panic!("pool should have reused the idle value"));
		assert_eq!(*guard, 1);
	}

	#[test]
	fn never_grows_past_max_size() {
		let pool: Arc<Pool<usize>> = Arc::new(Pool::new(0, 2, || 0));
		let first = pool.acquire(|| 1);
		let second = pool.acquire(|| 1);
		assert_eq!(pool.live_count(), 2);

		let pool_for_thread = pool.clone();
		let handle = thread::spawn(move || {
			let _third = pool_for_thread.acquire(|| 1);
		});

		thread::sleep(std::time::Duration::from_millis(20));
		assert_eq!(pool.live_count(), 2, "a third acquire must block while both slots are checked out");
		drop(first);
		handle.join().unwrap();
		drop(second);
	}
}
