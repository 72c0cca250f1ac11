//! Job runner contract against the real interactive thread
//!
//! Each test spawns its own event loop thread and runner.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use panelkit_core::application::runner::BodyError;
use panelkit_core::application::{Disposable, UiRef};
use panelkit_core::domain::JobState;
use panelkit_core::port::UiDispatcher;
use panelkit_core::{Job, JobError, JobOutcome, JobRunner, RunnerConfig, SchedulingError};
use panelkit_infra_ui::{EventLoopHandle, EventLoopThread, MessageArea, MessageLevel};

const GATE_TIMEOUT: Duration = Duration::from_secs(5);

fn setup(max_workers: usize, queue_capacity: usize) -> (JobRunner, EventLoopHandle, EventLoopThread) {
    let (ui, thread) = EventLoopHandle::spawn("ui-test").unwrap();
    let config = RunnerConfig {
        max_workers,
        queue_capacity,
    };
    let runner = JobRunner::new(config, Arc::new(ui.clone())).unwrap();
    (runner, ui, thread)
}

async fn teardown(ui: EventLoopHandle, thread: EventLoopThread) {
    ui.quit();
    tokio::task::spawn_blocking(move || thread.join()).await.unwrap();
}

#[derive(Default)]
struct Threads {
    body: Mutex<Option<ThreadId>>,
    finalize: Mutex<Option<(ThreadId, bool)>>,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_success_finalizes_on_ui_thread_without_error() {
    let (runner, ui, thread) = setup(2, 8);
    let threads = Arc::new(Threads::default());
    let area = Arc::new(MessageArea::new("General"));
    let formatter_calls = Arc::new(AtomicUsize::new(0));

    let (t_body, t_final, ui_final, calls) = (
        threads.clone(),
        threads.clone(),
        ui.clone(),
        formatter_calls.clone(),
    );
    let mut handle = runner.start(
        Job::new("Update comments", move |_| {
            *t_body.body.lock().unwrap() = Some(std::thread::current().id());
            Ok("saved")
        })
        .message_surface(&area)
        .error_message(move |e| {
            calls.fetch_add(1, Ordering::SeqCst);
            e.to_string()
        })
        .finalize(move |outcome| {
            assert_eq!(outcome.into_result().unwrap(), "saved");
            *t_final.finalize.lock().unwrap() =
                Some((std::thread::current().id(), ui_final.is_ui_thread()));
        }),
    );

    let snapshot = handle.wait_finalized().await;
    assert_eq!(snapshot.state, JobState::Finalized);
    assert_eq!(snapshot.succeeded, Some(true));

    let body_thread = threads.body.lock().unwrap().unwrap();
    let (finalize_thread, on_ui) = threads.finalize.lock().unwrap().unwrap();
    assert!(on_ui);
    assert_eq!(finalize_thread, ui.thread_id());
    assert_ne!(finalize_thread, body_thread);
    assert_eq!(formatter_calls.load(Ordering::SeqCst), 0);
    assert!(area.messages().is_empty());

    teardown(ui, thread).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connection_refused_is_shown_and_finalized() {
    let (runner, ui, thread) = setup(2, 8);
    let area = Arc::new(MessageArea::new("Access Control"));
    let seen_errors = Arc::new(Mutex::new(Vec::new()));
    let finalized = Arc::new(AtomicUsize::new(0));

    let (seen, fin) = (seen_errors.clone(), finalized.clone());
    let mut handle = runner.start(
        Job::new("Update access control list", |_| -> Result<(), BodyError> {
            Err("connection refused".into())
        })
        .message_surface(&area)
        .error_message(move |e| {
            seen.lock().unwrap().push(e.to_string());
            e.to_string()
        })
        .finalize(move |outcome| {
            assert!(!outcome.is_success());
            fin.fetch_add(1, Ordering::SeqCst);
        }),
    );

    assert_eq!(handle.wait_finalized().await.succeeded, Some(false));
    assert_eq!(*seen_errors.lock().unwrap(), vec!["connection refused".to_string()]);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);

    let messages = area.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert_eq!(messages[0].text, "connection refused");

    teardown(ui, thread).await;
}

struct Widget {
    enabled: Mutex<bool>,
}

impl Disposable for Widget {}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panel_closed_while_running() {
    let (runner, ui, thread) = setup(1, 1);
    let widget = Arc::new(Widget {
        enabled: Mutex::new(false),
    });
    let area = Arc::new(MessageArea::new("Proxy"));
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let touched = Arc::new(AtomicUsize::new(0));

    let widget_ref = UiRef::new(&widget);
    let touched_in_finalize = touched.clone();
    let mut handle = runner.start(
        Job::new("Change proxy", move |_| -> Result<(), BodyError> {
            let _ = gate_rx.recv_timeout(GATE_TIMEOUT);
            Err("server closed connection".into())
        })
        .message_surface(&area)
        .finalize(move |_| {
            if widget_ref.with_live(|w| *w.enabled.lock().unwrap() = true).is_some() {
                touched_in_finalize.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );

    handle.wait_until(JobState::Running).await;
    // operator closes the dialog
    area.dispose();
    drop(area);
    drop(widget);
    gate_tx.send(()).unwrap();

    let snapshot = handle.wait_finalized().await;
    assert_eq!(snapshot.state, JobState::Finalized);
    assert_eq!(snapshot.succeeded, Some(false));
    assert_eq!(touched.load(Ordering::SeqCst), 0);

    // the interactive thread survived
    assert_eq!(ui.call(|| 7).await, Ok(7));
    teardown(ui, thread).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_keep_their_own_outcomes() {
    let (runner, ui, thread) = setup(4, 64);
    let results = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..32usize {
        let results = results.clone();
        handles.push(runner.start(
            Job::new(format!("job-{}", i), move |_| {
                std::thread::sleep(Duration::from_millis((i % 4) as u64 * 5));
                if i % 3 == 0 {
                    return Err(format!("failure {}", i).into());
                }
                Ok(i * 10)
            })
            .finalize(move |outcome: JobOutcome<usize>| {
                let recorded = match outcome {
                    JobOutcome::Succeeded(value) => Ok(value),
                    JobOutcome::Failed(f) => Err(f.error.to_string()),
                };
                results.lock().unwrap().push((i, recorded));
            }),
        ));
    }
    for handle in &mut handles {
        handle.wait_finalized().await;
    }

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 32);
    for (i, recorded) in results.iter() {
        if i % 3 == 0 {
            assert_eq!(recorded, &Err(format!("failure {}", i)));
        } else {
            assert_eq!(recorded, &Ok(i * 10));
        }
    }
    assert_eq!(runner.active_jobs(), 0);

    teardown(ui, thread).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overflow_and_shutdown_still_finalize() {
    let (runner, ui, thread) = setup(1, 1);
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let errors = Arc::new(Mutex::new(Vec::new()));

    let record = |errors: &Arc<Mutex<Vec<String>>>| {
        let errors = errors.clone();
        move |outcome: JobOutcome<()>| {
            if let Some(failure) = outcome.failure() {
                let kind = match &failure.error {
                    JobError::Scheduling(SchedulingError::QueueFull { .. }) => "queue-full",
                    JobError::Scheduling(SchedulingError::ShutDown) => "shut-down",
                    _ => "other",
                };
                errors.lock().unwrap().push(kind.to_string());
            }
        }
    };

    let mut running = runner.start(
        Job::new("running", move |_| {
            let _ = gate_rx.recv_timeout(GATE_TIMEOUT);
            Ok(())
        })
        .finalize(record(&errors)),
    );
    running.wait_until(JobState::Running).await;

    let mut waiting = runner.start(Job::new("waiting", |_| Ok(())).finalize(record(&errors)));
    let mut overflow = runner.start(Job::new("overflow", |_| Ok(())).finalize(record(&errors)));
    overflow.wait_finalized().await;
    assert_eq!(*errors.lock().unwrap(), vec!["queue-full".to_string()]);

    // waiting job never got a worker
    runner.shutdown();
    waiting.wait_finalized().await;
    let mut late = runner.start(Job::new("late", |_| Ok(())).finalize(record(&errors)));
    late.wait_finalized().await;

    gate_tx.send(()).unwrap();
    assert_eq!(running.wait_finalized().await.succeeded, Some(true));
    assert_eq!(
        *errors.lock().unwrap(),
        vec![
            "queue-full".to_string(),
            "shut-down".to_string(),
            "shut-down".to_string()
        ]
    );

    teardown(ui, thread).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_finalize_does_not_break_ui_thread() {
    let (runner, ui, thread) = setup(2, 2);

    let mut first = runner.start(Job::new("first", |_| Ok(())).finalize(|_| panic!("widget is disposed")));
    assert_eq!(first.wait_finalized().await.state, JobState::Finalized);

    let second_ran = Arc::new(AtomicUsize::new(0));
    let ran = second_ran.clone();
    let mut second = runner.start(Job::new("second", |_| Ok(())).finalize(move |_| {
        ran.fetch_add(1, Ordering::SeqCst);
    }));
    second.wait_finalized().await;
    assert_eq!(second_ran.load(Ordering::SeqCst), 1);

    teardown(ui, thread).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_from_ui_thread_returns_immediately() {
    let (runner, ui, thread) = setup(1, 4);
    let (gate_tx, gate_rx) = mpsc::channel::<()>();

    // start is called on the interactive thread while the body blocks
    let r = runner.clone();
    let mut handle = ui
        .call(move || {
            r.start(Job::new("slow", move |_| {
                let _ = gate_rx.recv_timeout(GATE_TIMEOUT);
                Ok(())
            }))
        })
        .await
        .unwrap();

    // the interactive thread is still responsive
    assert_eq!(ui.call(|| "responsive").await, Ok("responsive"));
    gate_tx.send(()).unwrap();
    assert_eq!(handle.wait_finalized().await.succeeded, Some(true));

    teardown(ui, thread).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drain_before_quit_keeps_every_finalize() {
    let (runner, ui, thread) = setup(2, 8);
    let finalized = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..6u64 {
        let fin = finalized.clone();
        handles.push(runner.start(
            Job::new(format!("save-{}", i), move |_| {
                std::thread::sleep(Duration::from_millis(10 + i * 5));
                Ok(())
            })
            .finalize(move |_| {
                fin.fetch_add(1, Ordering::SeqCst);
            }),
        ));
    }

    // dialog closes while the changes are still being sent
    runner.drain().await;
    ui.quit();
    let processed = tokio::task::spawn_blocking(move || thread.join()).await.unwrap();

    assert_eq!(processed, 6);
    assert_eq!(finalized.load(Ordering::SeqCst), 6);
    for handle in &mut handles {
        assert_eq!(handle.wait_finalized().await.state, JobState::Finalized);
    }
}
