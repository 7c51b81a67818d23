use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::workflows::custody::{
    ActiveDashboard, DayState, StatusFailurePolicy, StatusPoller, DEFAULT_POLL_INTERVAL,
};

#[tokio::test(start_paused = true)]
async fn first_refresh_is_immediate_then_every_interval() {
    let source = Arc::new(ScriptedSource::open_day());
    let monitor = Arc::new(monitor(source.clone(), StatusFailurePolicy::FailOpen));
    let mut poller = StatusPoller::new(monitor.clone(), DEFAULT_POLL_INTERVAL);

    poller.start();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.refreshes(), 1);
    assert_eq!(
        monitor.latest().map(|snapshot| snapshot.day_state),
        Some(DayState::Open)
    );

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.refreshes(), 3);
    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent() {
    let source = Arc::new(ScriptedSource::open_day());
    let monitor = Arc::new(monitor(source.clone(), StatusFailurePolicy::FailOpen));
    let mut poller = StatusPoller::new(monitor, Duration::from_secs(30));

    poller.start();
    poller.start();
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert!(poller.is_running());
    assert_eq!(source.refreshes(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_future_refreshes() {
    let source = Arc::new(ScriptedSource::open_day());
    let monitor = Arc::new(monitor(source.clone(), StatusFailurePolicy::FailOpen));
    let mut poller = StatusPoller::new(monitor, Duration::from_secs(30));

    poller.start();
    tokio::time::sleep(Duration::from_millis(1)).await;
    poller.stop();
    assert!(!poller.is_running());

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.refreshes(), 1);
}

#[tokio::test(start_paused = true)]
async fn leaving_the_dashboard_stops_polling() {
    let source = Arc::new(ScriptedSource::open_day());
    let monitor = Arc::new(monitor(source.clone(), StatusFailurePolicy::FailOpen));

    let dashboard = ActiveDashboard::enter(monitor, Duration::from_secs(30));
    assert!(dashboard.is_polling());
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(source.refreshes(), 2);

    dashboard.leave();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.refreshes(), 2);
}

#[tokio::test(start_paused = true)]
async fn second_dashboard_on_the_same_monitor_shares_one_timer() {
    let source = Arc::new(ScriptedSource::open_day());
    let monitor = Arc::new(monitor(source.clone(), StatusFailurePolicy::FailOpen));

    let first = ActiveDashboard::enter(monitor.clone(), Duration::from_secs(30));
    let second = ActiveDashboard::enter(monitor.clone(), Duration::from_secs(30));
    assert!(first.is_polling());
    assert!(!second.is_polling());
    assert!(monitor.is_polled());

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(source.refreshes(), 2);

    second.leave();
    assert!(monitor.is_polled());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.refreshes(), 3);

    first.leave();
    assert!(!monitor.is_polled());
    let reopened = ActiveDashboard::enter(monitor, Duration::from_secs(30));
    assert!(reopened.is_polling());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.refreshes(), 4);
}
