//! Single-use completion object with a cached outcome and multicast replay.
//!
//! A [`Deferred`] is held by whoever owns a unit of asynchronous work and is
//! the only handle able to complete it. Consumers get a [`Promise`], a
//! cloneable registration-only view. Callbacks registered after completion
//! fire immediately with the cached outcome, which is what distinguishes this
//! type from a one-shot future.
//!
//! Callbacks are never invoked while the internal lock is held, so a callback
//! may freely register further callbacks on the same promise. Such a
//! registration is appended to the live queue and fires after everything that
//! was already queued.
//!
//! At most one thread runs callbacks at a time. A registration that arrives
//! from another thread while callbacks are running is queued and run by that
//! thread, which keeps registration order and puts every callback of the
//! terminal state before the `always` callbacks.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

/// Observable state of a deferred computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not completed yet.
    Pending,
    /// Completed successfully.
    Resolved,
    /// Completed with a failure.
    Rejected,
}

enum Outcome<T, E> {
    Resolved(Arc<T>),
    Rejected(Arc<E>),
}

impl<T, E> Clone for Outcome<T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Resolved(value) => Self::Resolved(Arc::clone(value)),
            Self::Rejected(reason) => Self::Rejected(Arc::clone(reason)),
        }
    }
}

impl<T, E> Outcome<T, E> {
    fn queue(&self) -> Queue {
        match self {
            Self::Resolved(_) => Queue::Resolved,
            Self::Rejected(_) => Queue::Rejected,
        }
    }

    fn state(&self) -> State {
        match self {
            Self::Resolved(_) => State::Resolved,
            Self::Rejected(_) => State::Rejected,
        }
    }

    fn to_result(&self) -> Result<Arc<T>, Arc<E>> {
        match self {
            Self::Resolved(value) => Ok(Arc::clone(value)),
            Self::Rejected(reason) => Err(Arc::clone(reason)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queue {
    Resolved,
    Rejected,
    Always,
}

type Callback<T, E> = Box<dyn FnOnce(&Outcome<T, E>) + Send>;

struct Inner<T, E> {
    outcome: Option<Outcome<T, E>>,
    resolved: VecDeque<Callback<T, E>>,
    rejected: VecDeque<Callback<T, E>>,
    always: VecDeque<Callback<T, E>>,
    // Set while one thread runs callbacks; only that thread pops the queues.
    draining: bool,
}

impl<T, E> Inner<T, E> {
    fn queue_mut(&mut self, queue: Queue) -> &mut VecDeque<Callback<T, E>> {
        match queue {
            Queue::Resolved => &mut self.resolved,
            Queue::Rejected => &mut self.rejected,
            Queue::Always => &mut self.always,
        }
    }

    /// Next callback to run: the terminal state's queue first, then `always`.
    fn next_callback(&mut self) -> Option<(Callback<T, E>, Outcome<T, E>)> {
        let outcome = self.outcome.clone()?;
        let callback = self
            .queue_mut(outcome.queue())
            .pop_front()
            .or_else(|| self.always.pop_front())?;
        Some((callback, outcome))
    }
}

struct Shared<T, E> {
    inner: Mutex<Inner<T, E>>,
}

/// Releases the drain if a callback unwinds, so later registrations still fire.
struct DrainGuard<'a, T, E> {
    shared: &'a Shared<T, E>,
}

impl<T, E> Drop for DrainGuard<'_, T, E> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.lock().draining = false;
        }
    }
}

impl<T, E> Shared<T, E> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                outcome: None,
                resolved: VecDeque::new(),
                rejected: VecDeque::new(),
                always: VecDeque::new(),
                draining: false,
            }),
        }
    }

    // Callbacks never run under this lock, so poisoning can only come from a
    // panic inside this module; the queues stay consistent either way.
    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> State {
        self.lock()
            .outcome
            .as_ref()
            .map_or(State::Pending, Outcome::state)
    }

    fn outcome(&self) -> Option<Outcome<T, E>> {
        self.lock().outcome.clone()
    }

    /// Runs queued callbacks one at a time until both the terminal state's
    /// queue and the `always` queue are empty.
    ///
    /// The caller must have set `draining` while holding the lock.
    fn drain(&self) {
        let _guard = DrainGuard { shared: self };
        loop {
            let next = {
                let mut inner = self.lock();
                let next = inner.next_callback();
                if next.is_none() {
                    inner.draining = false;
                }
                next
            };
            let Some((callback, outcome)) = next else {
                return;
            };
            callback(&outcome);
        }
    }

    fn register(&self, queue: Queue, callback: Callback<T, E>) {
        let start_drain = {
            let mut inner = self.lock();
            inner.queue_mut(queue).push_back(callback);
            let fires = match (&inner.outcome, queue) {
                (None, _) => false,
                (Some(_), Queue::Always) => true,
                (Some(outcome), queue) => outcome.queue() == queue,
            };
            // While another drain is running it picks this callback up.
            let start = fires && !inner.draining;
            if start {
                inner.draining = true;
            }
            start
        };
        if start_drain {
            self.drain();
        }
    }

    fn complete(&self, outcome: Outcome<T, E>) {
        {
            let mut inner = self.lock();
            if inner.outcome.is_some() {
                return;
            }
            inner.outcome = Some(outcome);
            inner.draining = true;
        }
        self.drain();
    }
}

/// Owner handle of a single-use completion.
///
/// Only the holder of the `Deferred` can resolve or reject it; hand out
/// [`Deferred::promise`] to everybody else.
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Deferred<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a pending deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
        }
    }

    /// Completes successfully with `value`, then runs the queued `done`
    /// callbacks followed by the queued `always` callbacks.
    ///
    /// Does nothing if the deferred has already been completed.
    pub fn resolve(&self, value: T) {
        self.shared.complete(Outcome::Resolved(Arc::new(value)));
    }

    /// Completes with a failure `reason`, then runs the queued `fail`
    /// callbacks followed by the queued `always` callbacks.
    ///
    /// Does nothing if the deferred has already been completed.
    pub fn reject(&self, reason: E) {
        self.shared.complete(Outcome::Rejected(Arc::new(reason)));
    }

    /// Returns a registration-only view sharing this deferred's state.
    #[must_use]
    pub fn promise(&self) -> Promise<T, E> {
        Promise {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }
}

impl<T, E> Default for Deferred<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.shared.state())
            .finish()
    }
}

/// Registration-only view of a [`Deferred`].
///
/// Every registration method returns `&Self` so calls can be chained.
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Registers a callback for successful completion.
    ///
    /// Fires before returning if the deferred is already resolved and no
    /// other thread is running callbacks. If it was rejected instead, the
    /// callback is kept but never invoked.
    pub fn done<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.shared.register(
            Queue::Resolved,
            Box::new(move |outcome| {
                if let Outcome::Resolved(value) = outcome {
                    callback(value);
                }
            }),
        );
        self
    }

    /// Registers a callback for failed completion.
    ///
    /// Fires before returning if the deferred is already rejected and no
    /// other thread is running callbacks. If it was resolved instead, the
    /// callback is kept but never invoked.
    pub fn fail<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        self.shared.register(
            Queue::Rejected,
            Box::new(move |outcome| {
                if let Outcome::Rejected(reason) = outcome {
                    callback(reason);
                }
            }),
        );
        self
    }

    /// Registers a callback that fires on either outcome.
    pub fn always<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(Result<&T, &E>) + Send + 'static,
    {
        self.shared.register(
            Queue::Always,
            Box::new(move |outcome| match outcome {
                Outcome::Resolved(value) => callback(Ok(value)),
                Outcome::Rejected(reason) => callback(Err(reason)),
            }),
        );
        self
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// Returns the cached outcome, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<Arc<T>, Arc<E>>> {
        self.shared.outcome().as_ref().map(Outcome::to_result)
    }

    /// Waits until the deferred completes and returns the shared outcome.
    ///
    /// Never returns if the owner neither resolves nor rejects.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason if the deferred was rejected.
    pub async fn settled(&self) -> Result<Arc<T>, Arc<E>> {
        let (tx, rx) = oneshot::channel();
        self.shared.register(
            Queue::Always,
            Box::new(move |outcome| {
                let _ = tx.send(outcome.to_result());
            }),
        );
        match rx.await {
            Ok(result) => result,
            // The sender is only dropped together with the shared state, which
            // `self` keeps alive, so this arm is unreachable in practice.
            Err(_) => std::future::pending().await,
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.shared.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::{Deferred, State};

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_resolve_runs_done_then_always_in_registration_order() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();
        let calls = log();
        for name in ["a", "b"] {
            let calls = Arc::clone(&calls);
            promise.always(move |_| calls.lock().unwrap().push(format!("always-{name}")));
        }
        for name in ["a", "b", "c"] {
            let calls = Arc::clone(&calls);
            promise.done(move |v| calls.lock().unwrap().push(format!("done-{name}-{v}")));
        }

        // Act
        deferred.resolve(7);

        // Assert
        assert_eq!(
            entries(&calls),
            vec!["done-a-7", "done-b-7", "done-c-7", "always-a", "always-b"]
        );
        assert_eq!(promise.state(), State::Resolved);
    }

    #[test]
    fn test_completion_is_idempotent() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();
        let calls = log();
        {
            let calls = Arc::clone(&calls);
            promise.done(move |v| calls.lock().unwrap().push(format!("done-{v}")));
        }
        {
            let calls = Arc::clone(&calls);
            promise.fail(move |e| calls.lock().unwrap().push(format!("fail-{e}")));
        }

        // Act
        deferred.resolve(1);
        deferred.resolve(2);
        deferred.reject("late".to_owned());

        // Assert
        assert_eq!(entries(&calls), vec!["done-1"]);
        assert_eq!(deferred.state(), State::Resolved);
        assert_eq!(*promise.outcome().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_late_subscriber_receives_cached_value_synchronously() {
        // Arrange
        let deferred: Deferred<String, String> = Deferred::new();
        deferred.resolve("cached".to_owned());
        let seen = log();

        // Act
        {
            let seen = Arc::clone(&seen);
            deferred
                .promise()
                .done(move |v| seen.lock().unwrap().push(v.clone()));
        }

        // Assert
        assert_eq!(entries(&seen), vec!["cached"]);
    }

    #[test]
    fn test_late_always_receives_rejection_reason() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        deferred.reject("boom".to_owned());
        let seen = log();

        // Act
        {
            let seen = Arc::clone(&seen);
            deferred.promise().always(move |outcome| {
                seen.lock().unwrap().push(format!("{outcome:?}"));
            });
        }

        // Assert
        assert_eq!(entries(&seen), vec![r#"Err("boom")"#]);
    }

    #[test]
    fn test_registration_for_other_state_never_fires() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();
        deferred.reject("nope".to_owned());
        let seen = log();

        // Act
        {
            let seen = Arc::clone(&seen);
            promise.done(move |v| seen.lock().unwrap().push(v.to_string()));
        }
        deferred.resolve(3);

        // Assert
        assert!(entries(&seen).is_empty());
        assert_eq!(promise.state(), State::Rejected);
    }

    #[test]
    fn test_registration_inside_callback_runs_after_already_queued() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();
        let calls = log();
        {
            let calls = Arc::clone(&calls);
            let inner_promise = promise.clone();
            promise.done(move |_| {
                calls.lock().unwrap().push("a".to_owned());
                let calls = Arc::clone(&calls);
                inner_promise.done(move |_| calls.lock().unwrap().push("d".to_owned()));
            });
        }
        for name in ["b", "c"] {
            let calls = Arc::clone(&calls);
            promise.done(move |_| calls.lock().unwrap().push(name.to_owned()));
        }

        // Act
        deferred.resolve(0);

        // Assert
        assert_eq!(entries(&calls), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_chained_registration_returns_same_promise() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let calls = log();
        let (done_calls, always_calls) = (Arc::clone(&calls), Arc::clone(&calls));

        // Act
        deferred
            .promise()
            .done(move |_| done_calls.lock().unwrap().push("done".to_owned()))
            .fail(|_| unreachable!("resolved deferred must not fail"))
            .always(move |_| always_calls.lock().unwrap().push("always".to_owned()));
        deferred.resolve(5);

        // Assert
        assert_eq!(entries(&calls), vec!["done", "always"]);
    }

    #[test]
    fn test_pending_promise_has_no_outcome() {
        let deferred: Deferred<u32, String> = Deferred::default();
        assert_eq!(deferred.promise().state(), State::Pending);
        assert!(deferred.promise().outcome().is_none());
    }

    #[test]
    fn test_registration_from_other_thread_waits_for_running_callbacks() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();
        let calls = log();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        {
            let calls = Arc::clone(&calls);
            promise.done(move |_| {
                calls.lock().unwrap().push("cb1-start".to_owned());
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                calls.lock().unwrap().push("cb1-end".to_owned());
            });
        }
        {
            let calls = Arc::clone(&calls);
            promise.done(move |_| calls.lock().unwrap().push("cb2".to_owned()));
        }
        {
            let calls = Arc::clone(&calls);
            promise.always(move |_| calls.lock().unwrap().push("always-early".to_owned()));
        }

        // Act
        let resolver = thread::spawn(move || deferred.resolve(1));
        started_rx.recv().unwrap();
        {
            let calls = Arc::clone(&calls);
            promise.always(move |_| calls.lock().unwrap().push("always-late".to_owned()));
        }
        {
            let calls = Arc::clone(&calls);
            promise.done(move |_| calls.lock().unwrap().push("cb3".to_owned()));
        }
        let before_release = entries(&calls);
        release_tx.send(()).unwrap();
        resolver.join().unwrap();

        // Assert
        assert_eq!(before_release, vec!["cb1-start"]);
        assert_eq!(
            entries(&calls),
            vec!["cb1-start", "cb1-end", "cb2", "cb3", "always-early", "always-late"]
        );
    }

    #[test]
    fn test_concurrent_registrations_each_fire_once_in_thread_order() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let calls = log();
        let registrars: Vec<_> = (0..4)
            .map(|t| {
                let promise = deferred.promise();
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    for i in 0..50 {
                        let calls = Arc::clone(&calls);
                        promise.done(move |_| calls.lock().unwrap().push(format!("{t}-{i}")));
                    }
                })
            })
            .collect();

        // Act
        deferred.resolve(9);
        for registrar in registrars {
            registrar.join().unwrap();
        }

        // Assert
        let seen = entries(&calls);
        assert_eq!(seen.len(), 200);
        for t in 0..4 {
            let order: Vec<usize> = seen
                .iter()
                .filter_map(|e| e.strip_prefix(&format!("{t}-")))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(order, (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_panicking_callback_does_not_block_later_registrations() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();
        promise.done(|_| panic!("callback failed"));
        let resolved = thread::spawn(move || deferred.resolve(4)).join();
        let calls = log();

        // Act
        {
            let calls = Arc::clone(&calls);
            promise.done(move |v| calls.lock().unwrap().push(v.to_string()));
        }

        // Assert
        assert!(resolved.is_err());
        assert_eq!(entries(&calls), vec!["4"]);
    }

    #[tokio::test]
    async fn test_settled_waits_for_completion_from_another_task() {
        // Arrange
        let deferred: Deferred<u32, String> = Deferred::new();
        let promise = deferred.promise();

        // Act
        let handle = tokio::spawn(async move {
            tokio::task::yield_now().await;
            deferred.reject("failed".to_owned());
        });
        let result = promise.settled().await;
        handle.await.unwrap();

        // Assert
        assert_eq!(result.unwrap_err().as_str(), "failed");
    }
}
