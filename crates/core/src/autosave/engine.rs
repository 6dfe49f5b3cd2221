use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::config::AutoSaveConfig;
use super::persist::Persist;
use super::state::{AutoSaveError, AutoSaveState, SaveStatus, DEFAULT_FAILURE_MESSAGE};

type Waiter = oneshot::Sender<Result<(), AutoSaveError>>;

/// Debounced, retrying auto-save for one editing session.
///
/// Feed every new snapshot to [`AutoSave::update`]. After `debounce` without
/// further edits the latest snapshot is handed to the [`Persist`]
/// implementation; a failed attempt is retried with the same snapshot after
/// `retry_delay`, up to `max_retries` attempts per cycle. At most one attempt
/// is in flight at any time.
///
/// Timers run as tokio tasks, so the engine must be driven from inside a
/// runtime. Dropping the handle shuts the engine down.
pub struct AutoSave<S> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    persist: Box<dyn Persist<S>>,
    debounce: Duration,
    max_retries: u32,
    retry_delay: Duration,
    session: Mutex<Session<S>>,
    state: watch::Sender<AutoSaveState>,
}

struct Session<S> {
    current: S,
    /// Last snapshot known to be persisted, or the initial one.
    baseline: S,
    enabled: bool,
    closed: bool,
    /// Bumped whenever the pending debounce is cancelled, so a timer that
    /// already fired cannot start a stale cycle.
    generation: u64,
    debounce: Option<JoinHandle<()>>,
    cycle: Option<JoinHandle<()>>,
    /// An edit arrived while a cycle was running.
    follow_up: bool,
    /// `save_now` was called while a cycle was running.
    immediate: bool,
    waiters: Vec<Waiter>,
    queued: Vec<Waiter>,
}

impl<S> Session<S> {
    fn cancel_debounce(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Session<S>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        let mut session = self.lock();
        if session.closed {
            return;
        }
        session.closed = true;
        session.cancel_debounce();
        if let Some(cycle) = session.cycle.take() {
            cycle.abort();
        }
        // Dropped senders resolve pending save_now calls as Closed.
        session.waiters.clear();
        session.queued.clear();
        tracing::debug!("auto-save shut down");
    }
}

impl<S> AutoSave<S>
where
    S: Clone + PartialEq + Send + 'static,
{
    pub fn new(initial: S, persist: impl Persist<S>, config: AutoSaveConfig) -> Self {
        let (state, _) = watch::channel(AutoSaveState::default());
        let session = Session {
            current: initial.clone(),
            baseline: initial,
            enabled: config.enabled,
            closed: false,
            generation: 0,
            debounce: None,
            cycle: None,
            follow_up: false,
            immediate: false,
            waiters: Vec::new(),
            queued: Vec::new(),
        };
        Self {
            shared: Arc::new(Shared {
                persist: Box::new(persist),
                debounce: config.debounce,
                max_retries: config.max_retries.max(1),
                retry_delay: config.retry_delay,
                session: Mutex::new(session),
                state,
            }),
        }
    }

    /// Record the latest editable state.
    ///
    /// A snapshot equal to the last persisted one clears the dirty flag and
    /// cancels the pending debounce; anything else (re)starts it. While a save
    /// is in flight the edit is only noted, and a new debounce starts once
    /// that save settles.
    pub fn update(&self, snapshot: S) {
        let mut session = self.shared.lock();
        if session.closed {
            return;
        }
        session.current = snapshot;
        let dirty = session.current != session.baseline;
        self.shared.state.send_if_modified(|state| {
            let changed = state.is_dirty != dirty;
            state.is_dirty = dirty;
            changed
        });
        if dirty {
            schedule(&self.shared, &mut session);
        } else {
            session.cancel_debounce();
        }
    }

    /// Save the current snapshot right away, skipping the debounce window.
    ///
    /// Resolves once that save cycle settles, retries included. Called while
    /// another cycle is in flight, a fresh cycle starts as soon as it ends.
    pub async fn save_now(&self) -> Result<(), AutoSaveError> {
        let receiver = {
            let mut session = self.shared.lock();
            if session.closed {
                return Err(AutoSaveError::Closed);
            }
            if !session.enabled {
                return Err(AutoSaveError::Disabled);
            }
            session.cancel_debounce();
            let (sender, receiver) = oneshot::channel();
            if session.cycle.is_some() {
                session.immediate = true;
                session.queued.push(sender);
            } else {
                session.waiters.push(sender);
                start_cycle(&self.shared, &mut session);
            }
            receiver
        };
        receiver.await.unwrap_or(Err(AutoSaveError::Closed))
    }

    /// Manual retry after a failed cycle: a fresh cycle for the latest
    /// snapshot with the retry budget reset.
    pub async fn retry(&self) -> Result<(), AutoSaveError> {
        tracing::debug!("manual save retry");
        self.save_now().await
    }

    /// Suspend or resume automatic saving. Edits still update the dirty flag
    /// while disabled, but nothing is persisted.
    pub fn set_enabled(&self, enabled: bool) {
        let mut session = self.shared.lock();
        if session.closed || session.enabled == enabled {
            return;
        }
        session.enabled = enabled;
        if enabled {
            if session.current != session.baseline {
                schedule(&self.shared, &mut session);
            }
        } else {
            session.cancel_debounce();
        }
        tracing::debug!(enabled, "auto-save toggled");
    }
}

impl<S> AutoSave<S> {
    /// Cancel pending timers and any running cycle. No persistence call
    /// starts after this returns.
    pub fn shutdown(&self) {
        self.shared.close();
    }

    pub fn state(&self) -> AutoSaveState {
        self.shared.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AutoSaveState> {
        self.shared.state.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.state.borrow().is_dirty
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.lock().enabled
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<S> Drop for AutoSave<S> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

fn schedule<S>(shared: &Arc<Shared<S>>, session: &mut Session<S>)
where
    S: Clone + PartialEq + Send + 'static,
{
    if session.closed || !session.enabled {
        return;
    }
    if session.cycle.is_some() {
        session.follow_up = true;
        return;
    }
    session.cancel_debounce();
    let generation = session.generation;
    let delay = shared.debounce;
    let timer_shared = Arc::clone(shared);
    session.debounce = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        debounce_elapsed(&timer_shared, generation);
    }));
}

fn debounce_elapsed<S>(shared: &Arc<Shared<S>>, generation: u64)
where
    S: Clone + PartialEq + Send + 'static,
{
    let mut session = shared.lock();
    if session.closed
        || !session.enabled
        || session.generation != generation
        || session.cycle.is_some()
    {
        return;
    }
    // The timer task is finishing on its own; detach rather than abort it.
    session.debounce = None;
    start_cycle(shared, &mut session);
}

fn start_cycle<S>(shared: &Arc<Shared<S>>, session: &mut Session<S>)
where
    S: Clone + PartialEq + Send + 'static,
{
    let snapshot = session.current.clone();
    shared.state.send_modify(|state| {
        state.status = SaveStatus::Saving;
        state.error = None;
        state.retry_count = 0;
    });
    session.follow_up = false;
    session.cycle = Some(tokio::spawn(run_cycle(Arc::clone(shared), snapshot)));
}

async fn run_cycle<S>(shared: Arc<Shared<S>>, snapshot: S)
where
    S: Clone + PartialEq + Send + 'static,
{
    let mut retry_count = 0;
    loop {
        if shared.lock().closed {
            return;
        }

        let error = match shared.persist.save(snapshot.clone()).await {
            Ok(()) => {
                let mut session = shared.lock();
                if !session.closed {
                    settle(&shared, &mut session, Ok(snapshot));
                }
                return;
            }
            Err(err) => failure_message(&err),
        };

        {
            let mut session = shared.lock();
            if session.closed {
                return;
            }
            if !session.enabled || retry_count + 1 >= shared.max_retries {
                settle(&shared, &mut session, Err(error));
                return;
            }
            retry_count += 1;
            shared
                .state
                .send_modify(|state| state.retry_count = retry_count);
            tracing::warn!(attempt = retry_count, error = %error, "save failed, retrying");
        }

        tokio::time::sleep(shared.retry_delay).await;

        {
            let mut session = shared.lock();
            if session.closed {
                return;
            }
            if !session.enabled {
                settle(&shared, &mut session, Err(error));
                return;
            }
        }
    }
}

/// Finish the running cycle, wake its waiters and decide what runs next.
fn settle<S>(shared: &Arc<Shared<S>>, session: &mut Session<S>, result: Result<S, String>)
where
    S: Clone + PartialEq + Send + 'static,
{
    session.cycle = None;
    let succeeded = result.is_ok();
    let outcome = match result {
        Ok(saved) => {
            session.baseline = saved;
            let dirty = session.current != session.baseline;
            shared.state.send_modify(|state| {
                state.status = SaveStatus::Saved;
                state.is_dirty = dirty;
                state.last_saved_at = Some(Utc::now());
                state.error = None;
                state.retry_count = 0;
            });
            tracing::info!(dirty, "changes saved");
            Ok(())
        }
        Err(message) => {
            shared.state.send_modify(|state| {
                state.status = SaveStatus::Error;
                state.error = Some(message.clone());
            });
            tracing::error!(error = %message, "save failed, giving up");
            Err(AutoSaveError::Failed(message))
        }
    };
    for waiter in session.waiters.drain(..) {
        let _ = waiter.send(outcome.clone());
    }

    if mem::take(&mut session.immediate) {
        let queued = mem::take(&mut session.queued);
        if succeeded && session.current == session.baseline {
            // The cycle that just finished already covers the request.
            session.follow_up = false;
            for waiter in queued {
                let _ = waiter.send(Ok(()));
            }
            return;
        }
        session.waiters = queued;
        if session.enabled {
            start_cycle(shared, session);
        } else {
            for waiter in session.waiters.drain(..) {
                let _ = waiter.send(Err(AutoSaveError::Disabled));
            }
        }
        return;
    }

    // A failed cycle only restarts on a fresh edit; a successful one also
    // picks up edits made while it was running.
    let follow_up = mem::take(&mut session.follow_up);
    if session.current != session.baseline && (succeeded || follow_up) {
        schedule(shared, session);
    }
}

fn failure_message(err: &anyhow::Error) -> String {
    let message = format!("{err:#}");
    if message.trim().is_empty() {
        DEFAULT_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::persist::persist_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Instant};
    use tokio_test::{assert_err, assert_ok};

    struct Recorder {
        start: Instant,
        calls: Mutex<Vec<(u32, Duration)>>,
        failures: AtomicUsize,
        latency: Duration,
    }

    impl Recorder {
        fn new(failures: usize, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                calls: Mutex::new(Vec::new()),
                failures: AtomicUsize::new(failures),
                latency,
            })
        }

        async fn save(&self, value: u32) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push((value, self.start.elapsed()));
            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                anyhow::bail!("disk full");
            }
            Ok(())
        }

        fn calls(&self) -> Vec<(u32, Duration)> {
            self.calls.lock().unwrap().clone()
        }

        fn values(&self) -> Vec<u32> {
            self.calls().into_iter().map(|(value, _)| value).collect()
        }
    }

    fn engine(recorder: &Arc<Recorder>, config: AutoSaveConfig) -> AutoSave<u32> {
        let recorder = Arc::clone(recorder);
        AutoSave::new(
            0,
            persist_fn(move |value: u32| {
                let recorder = Arc::clone(&recorder);
                async move { recorder.save(value).await }
            }),
            config,
        )
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn bursts_of_edits_coalesce_into_one_save_of_the_latest_value() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(500)).await;
        autosave.update(2);
        sleep(ms(400)).await;
        autosave.update(3);
        assert!(autosave.is_dirty());

        sleep(ms(5000)).await;
        assert_eq!(recorder.calls(), vec![(3, ms(2900))]);

        let state = autosave.state();
        assert_eq!(state.status, SaveStatus::Saved);
        assert!(!state.is_dirty);
        assert!(state.last_saved_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_with_the_same_snapshot() {
        let recorder = Recorder::new(2, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default().with_max_retries(3));

        autosave.update(7);
        sleep(ms(10_000)).await;

        assert_eq!(
            recorder.calls(),
            vec![(7, ms(2000)), (7, ms(3000)), (7, ms(4000))]
        );
        let state = autosave.state();
        assert_eq!(state.status, SaveStatus::Saved);
        assert_eq!(state.retry_count, 0);
        assert!(!state.is_dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_an_error_until_manual_retry() {
        let recorder = Recorder::new(3, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(10_000)).await;

        assert_eq!(recorder.values(), vec![1, 1, 1]);
        let state = autosave.state();
        assert_eq!(state.status, SaveStatus::Error);
        assert_eq!(state.error.as_deref(), Some("disk full"));
        assert_eq!(state.retry_count, 2);
        assert!(state.is_dirty);

        // Nothing else happens on its own.
        sleep(ms(10_000)).await;
        assert_eq!(recorder.calls().len(), 3);

        assert_ok!(autosave.retry().await);
        assert_eq!(recorder.values(), vec![1, 1, 1, 1]);
        assert_eq!(autosave.state().status, SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_reports_terminal_failure() {
        let recorder = Recorder::new(5, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default().with_max_retries(2));

        autosave.update(4);
        let err = assert_err!(autosave.save_now().await);
        assert_eq!(err, AutoSaveError::Failed("disk full".into()));
        assert_eq!(recorder.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_cancels_the_pending_debounce() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(500)).await;
        assert_ok!(autosave.save_now().await);
        assert_eq!(recorder.calls(), vec![(1, ms(500))]);

        sleep(ms(10_000)).await;
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_during_a_save_schedule_a_follow_up() {
        let recorder = Recorder::new(0, ms(300));
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(2100)).await;
        assert_eq!(autosave.state().status, SaveStatus::Saving);
        autosave.update(2);

        sleep(ms(10_000)).await;
        // The in-flight save keeps its snapshot; the next one starts a full
        // debounce after it settles at 2300ms.
        assert_eq!(recorder.calls(), vec![(1, ms(2000)), (2, ms(4300))]);
        assert!(!autosave.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_during_a_save_runs_right_after_it() {
        let recorder = Recorder::new(0, ms(300));
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(2100)).await;
        autosave.update(2);
        assert_ok!(autosave.save_now().await);

        assert_eq!(recorder.calls(), vec![(1, ms(2000)), (2, ms(2300))]);
        sleep(ms(10_000)).await;
        assert_eq!(recorder.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_during_a_save_of_the_latest_value_waits_for_it() {
        let recorder = Recorder::new(0, ms(300));
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(2100)).await;
        assert_ok!(autosave.save_now().await);

        assert_eq!(recorder.calls(), vec![(1, ms(2000))]);
        assert_eq!(Instant::now() - recorder.start, ms(2300));
        assert!(!autosave.is_dirty());
        sleep(ms(10_000)).await;
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reverting_to_the_saved_value_clears_dirty() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        assert!(autosave.is_dirty());
        autosave.update(0);
        assert!(!autosave.is_dirty());

        sleep(ms(10_000)).await;
        assert!(recorder.calls().is_empty());
        assert_eq!(autosave.state().summary(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_engine_never_persists() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default().with_enabled(false));

        autosave.update(1);
        sleep(ms(10_000)).await;
        assert!(recorder.calls().is_empty());
        assert!(autosave.is_dirty());
        assert_eq!(autosave.save_now().await, Err(AutoSaveError::Disabled));

        autosave.set_enabled(true);
        sleep(ms(10_000)).await;
        assert_eq!(recorder.values(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_cancels_the_pending_debounce() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(1000)).await;
        autosave.set_enabled(false);
        sleep(ms(10_000)).await;
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_debounce_timer() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(500)).await;
        autosave.shutdown();
        autosave.update(2);

        sleep(ms(10_000)).await;
        assert!(recorder.calls().is_empty());
        assert!(autosave.is_closed());
        assert_eq!(autosave.save_now().await, Err(AutoSaveError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_retry_timer() {
        let recorder = Recorder::new(1, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        sleep(ms(2500)).await;
        assert_eq!(recorder.calls().len(), 1);
        assert_eq!(autosave.state().retry_count, 1);

        autosave.shutdown();
        sleep(ms(10_000)).await;
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_shuts_down() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());

        autosave.update(1);
        drop(autosave);
        sleep(ms(10_000)).await;
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_observe_transitions() {
        let recorder = Recorder::new(0, Duration::ZERO);
        let autosave = engine(&recorder, AutoSaveConfig::default());
        let mut rx = autosave.subscribe();

        autosave.update(1);
        assert_ok!(rx.changed().await);
        assert!(rx.borrow_and_update().is_dirty);

        sleep(ms(5000)).await;
        assert_ok!(rx.changed().await);
        assert_eq!(rx.borrow_and_update().status, SaveStatus::Saved);
    }
}
