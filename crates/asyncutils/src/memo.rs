//! Lazily computed values with shared in-flight computation.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

type SharedFuture<T> = Shared<BoxFuture<'static, T>>;

enum State<T> {
    Uninitialized,
    Computing(SharedFuture<T>),
    Done(T),
}

enum Step<T> {
    Ready(T),
    Wait(SharedFuture<T>),
}

/// A memoized value that is computed on first access and kept until
/// [`reset()`](Self::reset) is called.
///
/// The cache has three states: *uninitialized*, *computing* (holding a
/// shared handle to the in-flight future) and *done*. Concurrent callers that
/// arrive while a computation is in flight await the same future instead of
/// starting their own, so the initializer runs at most once per reset.
///
/// The lock is only held while inspecting or swapping the state, never
/// across an `.await`.
///
/// # Examples
///
/// ```
/// use iconsprite_asyncutils::Memo;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let memo: Memo<u32> = Memo::new();
/// assert_eq!(memo.get_or_init(|| async { 7 }).await, 7);
/// // Already computed: the new initializer is never called.
/// assert_eq!(memo.get_or_init(|| async { 8 }).await, 7);
/// memo.reset();
/// assert_eq!(memo.get_or_init(|| async { 9 }).await, 9);
/// # }
/// ```
pub struct Memo<T> {
    state: Mutex<State<T>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { state: Mutex::new(State::Uninitialized) }
    }
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside the initializer happens outside the lock, so a poisoned
    // mutex still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the cached value (or detach from the in-flight computation).
    ///
    /// Callers already awaiting an in-flight computation still receive its
    /// result, but that result is no longer stored.
    pub fn reset(&self) {
        *self.lock() = State::Uninitialized;
    }
}

impl<T: Clone + Send + Sync + 'static> Memo<T> {
    /// Returns the memoized value, computing it with `init` if necessary.
    ///
    /// Every outcome of `init` is stored; use
    /// [`try_get_or_init()`](Memo::try_get_or_init) when failures should be
    /// retried on the next call.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = match self.begin(init) {
            Step::Ready(value) => return value,
            Step::Wait(shared) => shared,
        };
        let value = shared.clone().await;
        self.settle(&shared, &value, true);
        value
    }

    fn begin<F, Fut>(&self, init: F) -> Step<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut state = self.lock();
        if let State::Done(value) = &*state {
            return Step::Ready(value.clone());
        }
        if let State::Computing(shared) = &*state {
            return Step::Wait(shared.clone());
        }
        let shared = init().boxed().shared();
        *state = State::Computing(shared.clone());
        Step::Wait(shared)
    }

    /// Moves the state out of `Computing`, but only if the computation that
    /// just finished is still the current one (no reset happened meanwhile).
    fn settle(&self, shared: &SharedFuture<T>, value: &T, keep: bool) {
        let mut state = self.lock();
        if let State::Computing(current) = &*state
            && current.ptr_eq(shared)
        {
            *state = match keep {
                true => State::Done(value.clone()),
                false => State::Uninitialized,
            };
        }
    }
}

impl<V, E> Memo<Result<V, E>>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Like [`get_or_init()`](Memo::get_or_init), but only successful results
    /// are stored. A failed computation returns the cache to its
    /// uninitialized state so the next caller tries again.
    pub async fn try_get_or_init<F, Fut>(&self, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = match self.begin(init) {
            Step::Ready(value) => return value,
            Step::Wait(shared) => shared,
        };
        let value = shared.clone().await;
        self.settle(&shared, &value, value.is_ok());
        value
    }
}
