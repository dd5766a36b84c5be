//! Integration tests for running intervals through the tick loop.
//!
//! Most tests run on a paused tokio clock, so every one-second tick completes
//! instantly while elapsed virtual time stays exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pomo_core::{
    Callbacks, Category, Error, FnCallbacks, Interval, IntervalConfig, IntervalId,
    MemoryRepository, Outcome, Repository, State, get_interval,
};
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep};

/// Records every callback invocation.
#[derive(Debug, Default)]
struct Recorder {
    started: Vec<Interval>,
    ticks: Vec<Interval>,
    ended: Vec<Interval>,
}

impl Recorder {
    fn tick_seconds(&self) -> Vec<u64> {
        self.ticks
            .iter()
            .map(|interval| interval.actual_duration.as_secs())
            .collect()
    }
}

impl Callbacks for Recorder {
    fn on_start(&mut self, interval: &Interval) {
        self.started.push(interval.clone());
    }

    fn on_tick(&mut self, interval: &Interval) {
        self.ticks.push(interval.clone());
    }

    fn on_end(&mut self, interval: &Interval) {
        self.ended.push(interval.clone());
    }
}

fn config_with(repo: Arc<dyn Repository>, pomodoro_secs: u64) -> IntervalConfig {
    IntervalConfig::new(
        repo,
        Duration::from_secs(pomodoro_secs),
        Duration::from_secs(1),
        Duration::from_secs(2),
    )
}

#[tokio::test(start_paused = true)]
async fn interval_runs_to_completion() {
    let repo = Arc::new(MemoryRepository::new());
    let config = config_with(repo.clone(), 3);
    let interval = get_interval(&config).unwrap();
    let mut recorder = Recorder::default();

    let began = Instant::now();
    let outcome = interval
        .start(&config, &mut recorder, std::future::pending())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(began.elapsed(), Duration::from_secs(3));

    assert_eq!(recorder.started.len(), 1);
    assert_eq!(recorder.started[0].state, State::Running);
    assert!(recorder.started[0].start_time.is_some());
    // The deadline coincides with the last tick and takes precedence over it.
    assert_eq!(recorder.tick_seconds(), vec![1, 2]);
    assert_eq!(recorder.ended.len(), 1);
    assert_eq!(recorder.ended[0].state, State::Done);
    assert_eq!(recorder.ended[0].actual_duration, Duration::from_secs(3));

    let stored = repo.by_id(interval.id).unwrap();
    assert_eq!(stored.state, State::Done);
    assert_eq!(stored.actual_duration, stored.planned_duration);
}

#[tokio::test(start_paused = true)]
async fn actual_duration_never_exceeds_planned() {
    let repo = Arc::new(MemoryRepository::new());
    let config = config_with(repo.clone(), 4);
    let interval = get_interval(&config).unwrap();
    let mut recorder = Recorder::default();

    interval
        .start(&config, &mut recorder, std::future::pending())
        .await
        .unwrap();

    for tick in &recorder.ticks {
        assert!(tick.actual_duration <= tick.planned_duration);
        assert_eq!(
            tick.state == State::Done,
            tick.actual_duration == tick.planned_duration
        );
    }
}

#[tokio::test(start_paused = true)]
async fn paused_interval_resumes_with_remaining_time() {
    let repo = Arc::new(MemoryRepository::new());
    let config = config_with(repo.clone(), 5);
    let interval = get_interval(&config).unwrap();
    let id = interval.id;
    let mut first_run = Recorder::default();

    let pauser = async {
        sleep(Duration::from_millis(2500)).await;
        let running = config.repo().by_id(id).unwrap();
        running.pause(&config).unwrap();
    };
    let (outcome, ()) = tokio::join!(
        interval.start(&config, &mut first_run, std::future::pending()),
        pauser
    );

    assert_eq!(outcome.unwrap(), Outcome::Paused);
    assert_eq!(first_run.tick_seconds(), vec![1, 2]);
    assert!(first_run.ended.is_empty());

    let paused = repo.by_id(id).unwrap();
    assert_eq!(paused.state, State::Paused);
    assert_eq!(paused.actual_duration, Duration::from_secs(2));

    // The paused interval is still the active one.
    let resumed = get_interval(&config).unwrap();
    assert_eq!(resumed.id, id);

    let mut second_run = Recorder::default();
    let began = Instant::now();
    let outcome = resumed
        .start(&config, &mut second_run, std::future::pending())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(began.elapsed(), Duration::from_secs(3));
    assert_eq!(second_run.tick_seconds(), vec![3, 4]);
    assert_eq!(second_run.ended.len(), 1);
    assert_eq!(
        second_run.started[0].start_time,
        first_run.started[0].start_time
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_keeps_last_completed_tick() {
    let repo = Arc::new(MemoryRepository::new());
    let config = config_with(repo.clone(), 10);
    let interval = get_interval(&config).unwrap();
    let mut recorder = Recorder::default();
    let (tx, rx) = oneshot::channel::<()>();

    let canceller = async move {
        sleep(Duration::from_millis(2500)).await;
        tx.send(()).unwrap();
    };
    let cancel = async move {
        let _ = rx.await;
    };
    let (outcome, ()) = tokio::join!(interval.start(&config, &mut recorder, cancel), canceller);

    assert_eq!(outcome.unwrap(), Outcome::Cancelled);
    assert!(recorder.ended.is_empty());

    let stored = repo.by_id(interval.id).unwrap();
    assert_eq!(stored.state, State::Cancelled);
    assert_eq!(stored.actual_duration, Duration::from_secs(2));

    // A cancelled interval is terminal and cannot be restarted.
    let err = stored
        .start(&config, &mut (), std::future::pending())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IntervalCompleted));
    assert_eq!(get_interval(&config).unwrap().category, Category::ShortBreak);
}

/// Fails every update after the first `allowed` ones.
struct FlakyRepository {
    inner: MemoryRepository,
    allowed: usize,
    updates: AtomicUsize,
}

impl Repository for FlakyRepository {
    fn create(&self, interval: &Interval) -> Result<IntervalId, Error> {
        self.inner.create(interval)
    }

    fn update(&self, interval: &Interval) -> Result<(), Error> {
        if self.updates.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(Error::storage("update interval", "disk I/O error"));
        }
        self.inner.update(interval)
    }

    fn by_id(&self, id: IntervalId) -> Result<Interval, Error> {
        self.inner.by_id(id)
    }

    fn last(&self) -> Result<Interval, Error> {
        self.inner.last()
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>, Error> {
        self.inner.breaks(n)
    }
}

#[tokio::test(start_paused = true)]
async fn repository_failure_aborts_loop() {
    // One update to mark it running, one for the first tick, then failure.
    let repo = Arc::new(FlakyRepository {
        inner: MemoryRepository::new(),
        allowed: 2,
        updates: AtomicUsize::new(0),
    });
    let config = config_with(repo.clone(), 10);
    let interval = get_interval(&config).unwrap();
    let mut recorder = Recorder::default();

    let began = Instant::now();
    let err = interval
        .start(&config, &mut recorder, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Storage { action: "update interval", .. }));
    assert_eq!(began.elapsed(), Duration::from_secs(2));
    assert_eq!(recorder.tick_seconds(), vec![1]);

    let stored = repo.by_id(interval.id).unwrap();
    assert_eq!(stored.state, State::Running);
    assert_eq!(stored.actual_duration, Duration::from_secs(1));
}

/// Adds a fixed blocking delay to every repository call.
struct SlowRepository {
    inner: MemoryRepository,
    latency: Duration,
}

impl SlowRepository {
    fn wait(&self) {
        std::thread::sleep(self.latency);
    }
}

impl Repository for SlowRepository {
    fn create(&self, interval: &Interval) -> Result<IntervalId, Error> {
        self.wait();
        self.inner.create(interval)
    }

    fn update(&self, interval: &Interval) -> Result<(), Error> {
        self.wait();
        self.inner.update(interval)
    }

    fn by_id(&self, id: IntervalId) -> Result<Interval, Error> {
        self.wait();
        self.inner.by_id(id)
    }

    fn last(&self) -> Result<Interval, Error> {
        self.wait();
        self.inner.last()
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>, Error> {
        self.wait();
        self.inner.breaks(n)
    }
}

/// Persistence latency delays ticks but does not drop or duplicate them.
#[tokio::test]
async fn slow_repository_throttles_but_completes() {
    let repo = Arc::new(SlowRepository {
        inner: MemoryRepository::new(),
        latency: Duration::from_millis(40),
    });
    let config = config_with(repo.clone(), 2);
    let interval = get_interval(&config).unwrap();
    let mut recorder = Recorder::default();

    let began = std::time::Instant::now();
    let outcome = interval
        .start(&config, &mut recorder, std::future::pending())
        .await
        .unwrap();
    let elapsed = began.elapsed();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(recorder.tick_seconds(), vec![1]);
    assert_eq!(recorder.ended.len(), 1);
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");

    let stored = repo.by_id(interval.id).unwrap();
    assert_eq!(stored.state, State::Done);
    assert_eq!(stored.actual_duration, Duration::from_secs(2));
}

/// A deadline that passes while slow persistence keeps ticks behind schedule
/// ends the interval at the next step instead of waiting for every tick.
#[tokio::test]
async fn deadline_overtakes_lagging_ticks() {
    // Each step costs a fetch and an update, 1.8s in total, so ticks lag the clock.
    let repo = Arc::new(SlowRepository {
        inner: MemoryRepository::new(),
        latency: Duration::from_millis(900),
    });
    let config = config_with(repo.clone(), 4);
    let id = repo
        .inner
        .create(&Interval::draft(Category::Pomodoro, Duration::from_secs(4)))
        .unwrap();
    let interval = repo.inner.by_id(id).unwrap();
    let mut recorder = Recorder::default();

    let began = std::time::Instant::now();
    let outcome = interval
        .start(&config, &mut recorder, std::future::pending())
        .await
        .unwrap();
    let elapsed = began.elapsed();

    assert_eq!(outcome, Outcome::Completed);
    // Ticks at 1s and 2.8s after the loop starts; the 4s deadline is serviced at 4.6s.
    assert_eq!(recorder.tick_seconds(), vec![1, 2]);
    assert_eq!(recorder.ended.len(), 1);
    assert_eq!(recorder.ended[0].state, State::Done);
    assert_eq!(recorder.ended[0].actual_duration, Duration::from_secs(4));
    // Counting all four ticks would take 10s.
    assert!(elapsed >= Duration::from_millis(8100), "took {elapsed:?}");
    assert!(elapsed < Duration::from_millis(9100), "took {elapsed:?}");

    let stored = repo.inner.by_id(interval.id).unwrap();
    assert_eq!(stored.state, State::Done);
    assert_eq!(stored.actual_duration, stored.planned_duration);
}

#[tokio::test(start_paused = true)]
async fn closure_callbacks_receive_progress() {
    let repo = Arc::new(MemoryRepository::new());
    let config = config_with(repo.clone(), 3);
    let interval = get_interval(&config).unwrap();

    let mut started = Vec::new();
    let mut ticked = Vec::new();
    let mut ended = Vec::new();
    let mut callbacks = FnCallbacks {
        start: |i: &Interval| started.push(i.state),
        tick: |i: &Interval| ticked.push(i.actual_duration.as_secs()),
        end: |i: &Interval| ended.push((i.state, i.actual_duration.as_secs())),
    };

    let outcome = interval
        .start(&config, &mut callbacks, std::future::pending())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(started, vec![State::Running]);
    assert_eq!(ticked, vec![1, 2]);
    assert_eq!(ended, vec![(State::Done, 3)]);
}
