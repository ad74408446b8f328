//! Integration tests for the listening session lifecycle
//!
//! Time-dependent tests run on a paused tokio clock, so backoff delays are
//! measured exactly through the mock broker's call instants.

use std::sync::Arc;
use std::time::Duration;

use otp_event_manager::{
    BrokerStartError, OtpListenerManager, RetrieverConfig, RetrieverIntent, SessionState,
    SmsEvent, StartError,
};
use parking_lot::Mutex;
use rstest::rstest;
use sms_retriever::mock::MockBroker;
use sms_retriever::{Status, ERROR_NULL_EXTRAS, SMS_RETRIEVED_ACTION, TIMEOUT_MESSAGE};

fn recorded(manager: &OtpListenerManager<MockBroker>) -> Arc<Mutex<Vec<SmsEvent>>> {
    let events: Arc<Mutex<Vec<SmsEvent>>> = Arc::default();
    let sink = Arc::clone(&events);
    manager.on_event(move |event| sink.lock().push(event.clone()));
    events
}

async fn wait_for_calls(broker: &MockBroker, calls: usize) {
    while broker.call_count() < calls {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_backoff_doubles() {
    let manager = OtpListenerManager::new(MockBroker::failing_then_ok(2));

    let started = manager.start().await.unwrap();
    assert_eq!(started.attempts, 3);
    assert_eq!(
        started.backoffs,
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );

    let calls = manager.broker().call_instants();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
    assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
    assert!(manager.is_listening());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_after_max_attempts() {
    let manager = OtpListenerManager::new(MockBroker::failing_then_ok(3));

    let err = manager.start().await.unwrap_err();
    assert_eq!(
        err,
        StartError::Exhausted {
            attempts: 3,
            last_cause: BrokerStartError::Rejected("scripted failure 3".to_string()),
        }
    );
    assert_eq!(manager.broker().call_count(), 3);
    assert_eq!(manager.state(), SessionState::Idle);
    assert_eq!(manager.active_handles(), 0);
    assert_eq!(manager.router().receiver_count(), 0);

    // A fresh session can start once the broker recovers
    assert!(manager.start().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_fast_retry_preset() {
    let manager =
        OtpListenerManager::with_config(MockBroker::failing_then_ok(2), RetrieverConfig::fast_retry())
            .unwrap();

    let started = manager.start().await.unwrap();
    assert_eq!(
        started.backoffs,
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
}

#[tokio::test]
async fn test_second_start_does_not_touch_broker() {
    let manager = OtpListenerManager::new(MockBroker::new());
    manager.start().await.unwrap();

    let err = manager.start().await.unwrap_err();
    assert!(matches!(err, StartError::AlreadyActive { .. }));
    assert_eq!(manager.broker().call_count(), 1);
    assert_eq!(manager.router().receiver_count(), 1);
}

#[tokio::test]
async fn test_stop_while_broker_pending_cancels() {
    let manager = OtpListenerManager::new(MockBroker::new());
    manager.broker().hold_starts();

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start().await })
    };
    wait_for_calls(manager.broker(), 1).await;
    assert_eq!(manager.state(), SessionState::Starting);

    assert!(manager.stop());
    manager.broker().release();

    assert_eq!(task.await.unwrap(), Err(StartError::Cancelled));
    assert_eq!(manager.state(), SessionState::Idle);
    assert_eq!(manager.active_handles(), 0);
    assert_eq!(manager.router().receiver_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_backoff_cancels() {
    let manager = OtpListenerManager::new(MockBroker::failing_then_ok(1));

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start().await })
    };
    wait_for_calls(manager.broker(), 1).await;

    manager.stop();

    assert_eq!(task.await.unwrap(), Err(StartError::Cancelled));
    assert_eq!(manager.broker().call_count(), 1);
    assert_eq!(manager.router().receiver_count(), 0);
}

#[tokio::test]
async fn test_dropped_start_future_resets_session() {
    let manager = OtpListenerManager::new(MockBroker::new());
    manager.broker().hold_starts();

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start().await })
    };
    wait_for_calls(manager.broker(), 1).await;

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(manager.state(), SessionState::Idle);
    assert_eq!(manager.router().receiver_count(), 0);
}

#[tokio::test]
async fn test_broadcast_before_ack_still_counts() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let events = recorded(&manager);
    manager.broker().hold_starts();

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start().await })
    };
    wait_for_calls(manager.broker(), 1).await;

    manager.deliver(RetrieverIntent::retrieved(SMS_RETRIEVED_ACTION, "Your code is 5521"));
    manager.broker().release();

    let started = task.await.unwrap().unwrap();
    assert_eq!(started.attempts, 1);
    assert_eq!(events.lock().len(), 1);
    assert_eq!(manager.state(), SessionState::Idle);
    assert_eq!(manager.router().receiver_count(), 0);
}

#[tokio::test]
async fn test_end_to_end_otp() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let events = recorded(&manager);

    manager.start().await.unwrap();
    manager.deliver(RetrieverIntent::retrieved(
        SMS_RETRIEVED_ACTION,
        "Use 739201 to verify, ref AVAS_HASH_XYZ",
    ));

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        SmsEvent::received(
            "Use 739201 to verify, ref AVAS_HASH_XYZ",
            Some("739201".to_string())
        )
    );
    assert_eq!(manager.state(), SessionState::Idle);
    assert_eq!(manager.active_handles(), 0);
}

#[rstest]
#[case::timeout(RetrieverIntent::timed_out(SMS_RETRIEVED_ACTION), SmsEvent::timeout())]
#[case::broker_error(
    RetrieverIntent::with_status(SMS_RETRIEVED_ACTION, Status::new(13).with_message("ERROR")),
    SmsEvent::error("SMS retriever error: ERROR", 13)
)]
#[case::missing_extras(
    RetrieverIntent::without_extras(SMS_RETRIEVED_ACTION),
    SmsEvent::error("Intent extras are null", ERROR_NULL_EXTRAS)
)]
#[tokio::test]
async fn test_terminal_channels(#[case] intent: RetrieverIntent, #[case] expected: SmsEvent) {
    let manager = OtpListenerManager::new(MockBroker::new());
    let events = recorded(&manager);

    manager.start().await.unwrap();
    manager.deliver(intent);

    assert_eq!(*events.lock(), vec![expected]);
    assert_eq!(manager.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_timeout_listener_gets_fixed_message() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let messages = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&messages);
    manager.on_timeout(move |payload| sink.lock().push(payload.message.clone()));

    manager.start().await.unwrap();
    manager.deliver(RetrieverIntent::timed_out(SMS_RETRIEVED_ACTION));

    assert_eq!(*messages.lock(), vec![TIMEOUT_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_one_notification_per_session() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let events = recorded(&manager);
    manager.start().await.unwrap();

    let intent = RetrieverIntent::retrieved(SMS_RETRIEVED_ACTION, "Your code is 1234");
    let threads: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            let intent = intent.clone();
            std::thread::spawn(move || manager.deliver(intent))
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(events.lock().len(), 1);
    assert_eq!(manager.deliver(intent), 0);
    assert_eq!(events.lock().len(), 1);
}

#[tokio::test]
async fn test_stopped_session_ignores_late_broadcast() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let events = recorded(&manager);

    manager.start().await.unwrap();
    let first = manager.generation();
    manager.stop();

    assert_eq!(
        manager.deliver(RetrieverIntent::timed_out(SMS_RETRIEVED_ACTION)),
        0
    );
    assert!(events.lock().is_empty());

    manager.start().await.unwrap();
    assert!(manager.generation() > first);
    manager.deliver(RetrieverIntent::retrieved(SMS_RETRIEVED_ACTION, "code 9876"));

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].otp(), Some("9876"));
}

#[tokio::test]
async fn test_removed_listener_not_called() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let hits = Arc::new(Mutex::new(0));

    let counter = Arc::clone(&hits);
    let subscription = manager.on_sms_received(move |_| *counter.lock() += 1);
    assert!(subscription.remove());

    manager.start().await.unwrap();
    manager.deliver(RetrieverIntent::retrieved(SMS_RETRIEVED_ACTION, "code 1234"));

    assert_eq!(*hits.lock(), 0);
}

#[tokio::test]
async fn test_listener_can_stop_from_callback() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let stopper = manager.clone();
    manager.on_sms_received(move |_| {
        stopper.stop();
    });

    manager.start().await.unwrap();
    manager.deliver(RetrieverIntent::retrieved(SMS_RETRIEVED_ACTION, "code 1234"));

    assert_eq!(manager.state(), SessionState::Idle);
    assert_eq!(manager.router().receiver_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_from_callback_keeps_new_receiver() {
    let manager = OtpListenerManager::new(MockBroker::new());
    let runtime = tokio::runtime::Handle::current();
    let restarted = Arc::new(Mutex::new(None));

    let restarter = manager.clone();
    let result = Arc::clone(&restarted);
    let subscription = manager.on_timeout(move |_| {
        restarter.stop();
        *result.lock() = Some(runtime.block_on(restarter.start()).is_ok());
    });

    manager.start().await.unwrap();
    let platform = manager.clone();
    tokio::task::spawn_blocking(move || {
        platform.deliver(RetrieverIntent::timed_out(SMS_RETRIEVED_ACTION))
    })
    .await
    .unwrap();
    subscription.remove();

    assert_eq!(*restarted.lock(), Some(true));
    assert_eq!(manager.state(), SessionState::Listening);
    assert_eq!(manager.active_handles(), 1);
    assert_eq!(manager.router().receiver_count(), 1);

    let events = recorded(&manager);
    assert_eq!(
        manager.deliver(RetrieverIntent::retrieved(SMS_RETRIEVED_ACTION, "code 2468")),
        1
    );
    assert_eq!(events.lock()[0].otp(), Some("2468"));
    assert_eq!(manager.state(), SessionState::Idle);
}
