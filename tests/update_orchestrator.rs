use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::time::Instant;

use market_session::calendar::exchange_holidays::ExchangeHolidayCalendar;
use market_session::clock::{ClockReading, SessionClock};
use market_session::diagnostics::{DiagnosticEvent, RecordingSink};
use market_session::orchestrator::DataRefresher;
use market_session::orchestrator::update_orchestrator::UpdateOrchestrator;
use market_session::session::MarketSession;
use market_session::types::polling_policy::PollingIntervals;
use market_session::types::session_window::SessionWindow;

/// Wall clock that moves with tokio's (paused) time.
struct RuntimeClock {
    start: DateTime<Utc>,
    started: Instant,
    timezone: Tz,
}

impl SessionClock for RuntimeClock {
    fn now(&self) -> ClockReading {
        let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap();

        ClockReading::in_timezone(self.start + elapsed, self.timezone)
    }
}

#[derive(Default)]
struct CountingRefresher {
    prices: AtomicUsize,
    news: AtomicUsize,
}

#[async_trait]
impl DataRefresher for CountingRefresher {
    async fn refresh_prices(&self) -> Result<()> {
        self.prices.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh_news(&self) -> Result<()> {
        self.news.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("news feed rate limited")
    }
}

fn session_at(
    y: i32,
    m: u32,
    d: u32,
    h: u32,
    min: u32,
    s: u32,
) -> (Arc<MarketSession>, Arc<RecordingSink>) {
    session_from(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap(),
    )
}

fn session_from(local: NaiveDateTime) -> (Arc<MarketSession>, Arc<RecordingSink>) {
    let start = ClockReading::at_local(local, New_York).unwrap().utc;
    let clock = RuntimeClock {
        start,
        started: Instant::now(),
        timezone: New_York,
    };
    let sink = Arc::new(RecordingSink::new());
    let session = MarketSession::new(
        Arc::new(clock),
        Arc::new(ExchangeHolidayCalendar::default()),
        SessionWindow::default(),
        PollingIntervals::default(),
        sink.clone(),
    );

    (Arc::new(session), sink)
}

#[tokio::test(start_paused = true)]
async fn open_session_polls_prices_every_minute() {
    let (session, sink) = session_at(2025, 1, 6, 10, 0, 0);
    let refresher = Arc::new(CountingRefresher::default());
    let (shutdown, shutdown_receiver) = watch::channel(false);

    let orchestrator = UpdateOrchestrator::new(session, refresher.clone());
    let task = tokio::spawn(async move { orchestrator.run(shutdown_receiver).await });

    tokio::time::sleep(Duration::from_secs(150)).await;
    shutdown.send(true).unwrap();
    task.await.unwrap().unwrap();

    // ticks at 0s, 60s, 120s
    assert_eq!(refresher.prices.load(Ordering::SeqCst), 3);
    // failing news refreshes do not stop the loop
    assert_eq!(refresher.news.load(Ordering::SeqCst), 1);

    let events = sink.events();
    assert!(matches!(events.first(), Some(DiagnosticEvent::WakeArmed { .. })));
    assert!(matches!(events.last(), Some(DiagnosticEvent::WakeCancelled { .. })));
}

#[tokio::test(start_paused = true)]
async fn opening_bell_switches_to_live_polling() {
    let (session, sink) = session_at(2025, 1, 6, 9, 29, 59);
    let refresher = Arc::new(CountingRefresher::default());
    let (shutdown, shutdown_receiver) = watch::channel(false);

    let orchestrator = UpdateOrchestrator::new(session.clone(), refresher.clone());
    let task = tokio::spawn(async move { orchestrator.run(shutdown_receiver).await });

    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(session.session_state(), market_session::SessionState::Open);

    shutdown.send(true).unwrap();
    task.await.unwrap().unwrap();

    // price ticks start at the open (1s) and repeat at 61s and 121s
    assert_eq!(refresher.prices.load(Ordering::SeqCst), 3);
    // closed cadence fired once at start, open cadence once at the open
    assert_eq!(refresher.news.load(Ordering::SeqCst), 2);

    let armed = sink
        .events()
        .iter()
        .filter(|event| matches!(event, DiagnosticEvent::WakeArmed { .. }))
        .count();
    assert_eq!(armed, 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_shutdown_sender_stops_the_loop() {
    let (session, _sink) = session_at(2025, 1, 11, 12, 0, 0);
    let refresher = Arc::new(CountingRefresher::default());
    let (shutdown, shutdown_receiver) = watch::channel(false);

    let orchestrator = UpdateOrchestrator::new(session, refresher.clone());
    let task = tokio::spawn(async move { orchestrator.run(shutdown_receiver).await });

    tokio::time::sleep(Duration::from_secs(10)).await;
    drop(shutdown);
    task.await.unwrap().unwrap();

    assert_eq!(refresher.prices.load(Ordering::SeqCst), 0);
    assert_eq!(refresher.news.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn armed_wake_fires_into_predicted_state() {
    let (session, sink) = session_at(2025, 1, 6, 9, 29, 59);
    let plan = session.next_transition_plan();
    let (fired_sender, fired_receiver) = tokio::sync::oneshot::channel();

    let fire_session = session.clone();
    let handle = session.arm_once(&plan, move || {
        let _ = fired_sender.send(fire_session.session_state());
    });

    let state_on_fire = fired_receiver.await.unwrap();
    assert_eq!(state_on_fire, plan.predicted_next_state);
    assert_eq!(state_on_fire, market_session::SessionState::Open);

    // cancelling after the wake fired reports nothing
    session.cancel(&handle);
    session.cancel(&handle);
    assert!(matches!(
        sink.events().as_slice(),
        [DiagnosticEvent::WakeArmed { .. }]
    ));
}

fn just_before_open(micros: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 6)
        .unwrap()
        .and_hms_micro_opt(9, 29, 59, micros)
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn wake_armed_mid_millisecond_fires_into_open() {
    for micros in [400, 999_600] {
        let (session, sink) = session_from(just_before_open(micros));
        let plan = session.next_transition_plan();
        assert!(!plan.degraded, "{plan:?}");

        let (fired_sender, fired_receiver) = tokio::sync::oneshot::channel();
        let fire_session = session.clone();
        session.arm_once(&plan, move || {
            let _ = fired_sender.send((
                fire_session.session_state(),
                fire_session.next_transition_plan(),
            ));
        });

        let (state_on_fire, next_plan) = fired_receiver.await.unwrap();
        assert_eq!(state_on_fire, market_session::SessionState::Open);
        assert_eq!(state_on_fire, plan.predicted_next_state);
        assert!(!next_plan.degraded, "{next_plan:?}");
        assert_eq!(
            next_plan.predicted_next_state,
            market_session::SessionState::Closed
        );
        assert!(
            !sink
                .events()
                .iter()
                .any(|event| matches!(event, DiagnosticEvent::SchedulerDegraded { .. }))
        );
    }
}

#[tokio::test(start_paused = true)]
async fn opening_bell_from_mid_millisecond_start_is_not_degraded() {
    let (session, sink) = session_from(just_before_open(400));
    let refresher = Arc::new(CountingRefresher::default());
    let (shutdown, shutdown_receiver) = watch::channel(false);

    let orchestrator = UpdateOrchestrator::new(session.clone(), refresher.clone());
    let task = tokio::spawn(async move { orchestrator.run(shutdown_receiver).await });

    tokio::time::sleep(Duration::from_secs(150)).await;
    shutdown.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(refresher.prices.load(Ordering::SeqCst), 3);
    assert_eq!(refresher.news.load(Ordering::SeqCst), 2);

    let events = sink.events();
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, DiagnosticEvent::SchedulerDegraded { .. }))
    );
    let armed: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            DiagnosticEvent::WakeArmed {
                predicted_next_state,
                ..
            } => Some(*predicted_next_state),
            _ => None,
        })
        .collect();
    assert_eq!(
        armed,
        [
            market_session::SessionState::Open,
            market_session::SessionState::Closed
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_wake_never_fires() {
    let (session, sink) = session_at(2025, 1, 6, 9, 0, 0);
    let plan = session.next_transition_plan();
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = fired.clone();
    let handle = session.arm_once(&plan, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    session.cancel(&handle);
    session.cancel(&handle);

    tokio::time::sleep(plan.until_change() * 2).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(matches!(
        sink.events().as_slice(),
        [DiagnosticEvent::WakeArmed { .. }, DiagnosticEvent::WakeCancelled { .. }]
    ));
}
