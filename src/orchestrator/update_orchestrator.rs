use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::orchestrator::DataRefresher;
use crate::scheduling::wake::TransitionTimer;
use crate::session::MarketSession;

/// Re-fetches prices and news at the cadence of the current session, and
/// re-plans exactly when the session changes state.
pub struct UpdateOrchestrator {
    session: Arc<MarketSession>,
    refresher: Arc<dyn DataRefresher>,
}

impl UpdateOrchestrator {
    pub fn new(session: Arc<MarketSession>, refresher: Arc<dyn DataRefresher>) -> Self {
        Self { session, refresher }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped. The
    /// outstanding transition wake is cancelled on the way out.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let (wake_sender, mut wake_receiver) = mpsc::channel::<()>(4);
        let mut timer = TransitionTimer::new();

        let mut state = self.session.session_state();
        let mut policy = self.session.policy_for(state);
        let mut price_ticker = policy.price_interval().map(ticker);
        let mut news_ticker = ticker(policy.news_interval());
        self.arm(&mut timer, &wake_sender);

        info!(%state, ?policy, "update orchestrator started");

        loop {
            tokio::select! {
                Some(()) = wake_receiver.recv() => {
                    let next_state = self.session.session_state();
                    if next_state != state {
                        info!(from = %state, to = %next_state, "session state changed");
                        state = next_state;
                    }

                    let next_policy = self.session.policy_for(state);
                    if next_policy != policy {
                        info!(?next_policy, "polling policy changed");
                        policy = next_policy;
                        price_ticker = policy.price_interval().map(ticker);
                        news_ticker = ticker(policy.news_interval());
                    }

                    self.arm(&mut timer, &wake_sender);
                }

                _ = tick_optional(&mut price_ticker) => {
                    if let Err(error) = self.refresher.refresh_prices().await {
                        warn!("price refresh failed: {error:#}");
                    }
                }

                _ = news_ticker.tick() => {
                    if let Err(error) = self.refresher.refresh_news().await {
                        warn!("news refresh failed: {error:#}");
                    }
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.session.disarm(&mut timer);
        info!("update orchestrator stopped");

        Ok(())
    }

    fn arm(&self, timer: &mut TransitionTimer, wake_sender: &mpsc::Sender<()>) {
        let plan = self.session.next_transition_plan();
        debug!(
            millis = plan.milliseconds_until_change,
            next = %plan.predicted_next_state,
            description = %plan.description,
            "next session transition"
        );

        let wake_sender = wake_sender.clone();
        self.session.rearm(timer, &plan, move || {
            let _ = wake_sender.try_send(());
        });
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    interval
}

async fn tick_optional(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
