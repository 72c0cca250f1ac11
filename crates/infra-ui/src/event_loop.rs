// Interactive thread: a dedicated OS thread draining a callback queue
use panelkit_core::application::runner::execute_guarded;
use panelkit_core::port::{DispatchError, UiCallback, UiDispatcher};
use std::io;
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

enum LoopMessage {
    Run(UiCallback),
    Quit,
}

/// Handle to the interactive thread.
///
/// This struct is an actor handle: the thread spawned by `EventLoopHandle::spawn`
/// owns all UI state and runs callbacks one at a time, in the order they were
/// dispatched. Handles can be cloned freely and used from any thread.
#[derive(Clone)]
pub struct EventLoopHandle {
    sender: mpsc::UnboundedSender<LoopMessage>,
    thread_id: ThreadId,
}

/// Join handle of the interactive thread
pub struct EventLoopThread {
    join: JoinHandle<usize>,
}

impl EventLoopThread {
    /// Wait for the loop to exit; returns how many callbacks it ran
    pub fn join(self) -> usize {
        self.join.join().unwrap_or(0)
    }
}

impl EventLoopHandle {
    /// Spawn the interactive thread under `name`
    pub fn spawn(name: &str) -> io::Result<(Self, EventLoopThread)> {
        let (sender, inbox) = mpsc::unbounded_channel();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || EventLoop { inbox, processed: 0 }.run())?;
        let thread_id = join.thread().id();
        Ok((Self { sender, thread_id }, EventLoopThread { join }))
    }

    /// Ask the loop to exit once everything already queued has run.
    ///
    /// Callbacks dispatched before the loop reaches the quit request still
    /// run; once the loop has processed the quit request, dispatch fails with
    /// `DispatchError::Closed`. Finalize steps of jobs still in flight are
    /// lost at that point, so drain the runner first (`JobRunner::drain`).
    pub fn quit(&self) {
        let _ = self.sender.send(LoopMessage::Quit);
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Run `f` on the interactive thread and wait for its result
    pub async fn call<F, R>(&self, f: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.dispatch(Box::new(move || {
            let _ = tx.send(f());
        }))?;
        rx.await.map_err(|_| DispatchError::Closed)
    }
}

impl UiDispatcher for EventLoopHandle {
    fn dispatch(&self, callback: UiCallback) -> Result<(), DispatchError> {
        self.sender
            .send(LoopMessage::Run(callback))
            .map_err(|_| DispatchError::Closed)
    }

    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

struct EventLoop {
    inbox: mpsc::UnboundedReceiver<LoopMessage>,
    processed: usize,
}

impl EventLoop {
    fn run(mut self) -> usize {
        info!("Event loop started");
        while let Some(msg) = self.inbox.blocking_recv() {
            match msg {
                LoopMessage::Run(callback) => self.run_callback(callback),
                LoopMessage::Quit => break,
            }
        }

        // refuse new callbacks, then drain the ones already queued
        self.inbox.close();
        while let Ok(msg) = self.inbox.try_recv() {
            if let LoopMessage::Run(callback) = msg {
                self.run_callback(callback);
            }
        }
        info!(processed = self.processed, "Event loop stopped");
        self.processed
    }

    fn run_callback(&mut self, callback: UiCallback) {
        self.processed += 1;
        if execute_guarded("UI callback", callback).ok().is_none() {
            debug!("Event loop continuing after panicking callback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc as std_mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn test_callbacks_run_on_loop_thread_in_order() {
        let (handle, thread) = EventLoopHandle::spawn("ui-test").unwrap();
        let (tx, rx) = std_mpsc::channel();
        for i in 0..3 {
            let tx = tx.clone();
            let h = handle.clone();
            handle
                .dispatch(Box::new(move || {
                    tx.send((i, h.is_ui_thread())).unwrap();
                }))
                .unwrap();
        }
        let received: Vec<_> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(received, vec![(0, true), (1, true), (2, true)]);
        assert!(!handle.is_ui_thread());

        handle.quit();
        assert_eq!(thread.join(), 3);
    }

    #[test]
    fn test_quit_drains_then_closes() {
        let (handle, thread) = EventLoopHandle::spawn("ui-test").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let (gate_tx, gate_rx) = std_mpsc::channel::<()>();

        // hold the loop so the next callbacks queue up behind quit
        handle
            .dispatch(Box::new(move || {
                let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            }))
            .unwrap();
        handle.quit();
        for _ in 0..2 {
            let count = count.clone();
            handle
                .dispatch(Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        gate_tx.send(()).unwrap();

        assert_eq!(thread.join(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(
            handle.dispatch(Box::new(|| {})),
            Err(DispatchError::Closed)
        );
    }

    #[test]
    fn test_panicking_callback_does_not_stop_loop() {
        let (handle, thread) = EventLoopHandle::spawn("ui-test").unwrap();
        let (tx, rx) = std_mpsc::channel();
        handle
            .dispatch(Box::new(|| panic!("widget is disposed")))
            .unwrap();
        handle
            .dispatch(Box::new(move || tx.send("still alive").unwrap()))
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "still alive");
        handle.quit();
        thread.join();
    }

    #[tokio::test]
    async fn test_call_returns_value() {
        let (handle, thread) = EventLoopHandle::spawn("ui-test").unwrap();
        let h = handle.clone();
        let on_ui = handle.call(move || h.is_ui_thread()).await.unwrap();
        assert!(on_ui);

        handle.quit();
        let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        assert_eq!(handle.call(|| 1).await, Err(DispatchError::Closed));
    }
}
