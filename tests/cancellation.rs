//! Records for invocations that never return normally.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::oneshot;

use invocation_instrumenter::{args, CallSite, Outcome};

mod common;

use common::NotFoundError;

#[tokio::test(start_paused = true)]
async fn test_timeout_records_cancelled() {
    let (instrumenter, sink) = common::memory_instrumenter();

    let result = instrumenter
        .instrument_with_timeout(
            CallSite::new("slowQuery"),
            args![],
            Duration::from_millis(100),
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, NotFoundError>(())
            },
        )
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.operation, "slowQuery");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, Outcome::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_inner_error_passes_through_deadline() {
    let (instrumenter, sink) = common::memory_instrumenter();

    let result = instrumenter
        .instrument_with_timeout(
            CallSite::new("deleteUser"),
            args![9u64],
            Duration::from_secs(1),
            async { Err::<(), _>(NotFoundError { id: 9 }) },
        )
        .await;

    assert_eq!(result, Ok(Err(NotFoundError { id: 9 })));
    assert_eq!(sink.records()[0].outcome.label(), "failure");
}

#[tokio::test]
async fn test_aborted_task_records_cancelled() {
    let (instrumenter, sink) = common::memory_instrumenter();
    let (started_tx, started_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        instrumenter
            .instrument_async(CallSite::new("longPoll"), args![], async move {
                let _ = started_tx.send(());
                std::future::pending::<Result<(), NotFoundError>>().await
            })
            .await
    });

    started_rx.await.unwrap();
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    common::wait_for_records(&sink, 1).await;
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, Outcome::Cancelled);
}

#[tokio::test]
async fn test_select_loser_records_cancelled() {
    let (instrumenter, sink) = common::memory_instrumenter();

    tokio::select! {
        _ = instrumenter.instrument_async(CallSite::new("never"), args![], std::future::pending::<Result<(), NotFoundError>>()) => {
            panic!("pending future completed");
        }
        _ = tokio::time::sleep(Duration::from_millis(10)) => {}
    }

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].operation, "never");
    assert_eq!(records[0].outcome, Outcome::Cancelled);
}

#[tokio::test]
async fn test_async_panic_records_once() {
    let (instrumenter, sink) = common::memory_instrumenter();

    let outcome = AssertUnwindSafe(instrumenter.instrument_async(
        CallSite::new("explode"),
        args![],
        async {
            tokio::task::yield_now().await;
            let armed = true;
            if armed {
                panic!("async boom");
            }
            Ok::<(), NotFoundError>(())
        },
    ))
    .catch_unwind()
    .await;
    assert!(outcome.is_err());

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].outcome,
        Outcome::Panicked { message: "async boom".into() }
    );
}

#[test]
fn test_unpolled_future_records_nothing() {
    let (instrumenter, sink) = common::memory_instrumenter();

    let fut = instrumenter.instrument_async(CallSite::new("neverStarted"), args![], async {
        Ok::<(), NotFoundError>(())
    });
    drop(fut);

    assert!(sink.is_empty());
    assert_eq!(instrumenter.stats().started, 0);
}
