// SPDX-License-Identifier: LGPL-3.0-only

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use super::DisplayId;

/// Shortest interval a pacer accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Looks up the refresh interval of a display.
pub trait RefreshSource: Send + Sync {
    /// Time between two refreshes of `display`.
    fn refresh_interval(&self, display: DisplayId) -> Duration;
}

/// A [RefreshSource] reporting the same interval for every display.
#[derive(Debug, Clone, Copy)]
pub struct FixedRefresh(pub Duration);

impl FixedRefresh {
    /// 60 frames per second.
    pub const HZ_60: FixedRefresh = FixedRefresh(Duration::from_nanos(16_666_667));
}

impl RefreshSource for FixedRefresh {
    fn refresh_interval(&self, _display: DisplayId) -> Duration {
        self.0
    }
}

enum Command {
    Start,
    Stop,
    SetDisplay(DisplayId),
    Close,
}

struct Shared {
    running: AtomicBool,
    closed: AtomicBool,
    // Held for the duration of every tick.
    tick: Mutex<()>,
    worker: OnceLock<ThreadId>,
}

/// Calls a function at the refresh cadence of a display.
///
/// No callback is delivered after [stop](Self::stop) or [close](Self::close)
/// return, and callbacks never overlap.
pub struct DisplayLink {
    tx: Sender<Command>,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DisplayLink {
    /// Spawns a stopped pacer bound to the default display.
    pub fn new(
        source: Arc<dyn RefreshSource>,
        callback: impl FnMut() + Send + 'static,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            running: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            tick: Mutex::new(()),
            worker: OnceLock::new(),
        });
        let thread_shared = shared.clone();
        let handle = thread::Builder::new()
            .name("tessera-display-link".into())
            .spawn(move || {
                let _ = thread_shared.worker.set(thread::current().id());
                run(rx, thread_shared, source, callback);
            })?;

        Ok(Self {
            tx,
            shared,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Begins periodic callbacks.
    pub fn start(&self) {
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }
        log::debug!("display link start");
        self.shared.running.store(true, Ordering::Release);
        let _ = self.tx.send(Command::Start);
    }

    /// Halts callbacks. Returns after any in-flight callback finished.
    pub fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        log::debug!("display link stop");
        let _ = self.tx.send(Command::Stop);
        self.wait_for_tick();
    }

    /// Follows the refresh cadence of another display.
    pub fn set_display(&self, display: DisplayId) {
        let _ = self.tx.send(Command::SetDisplay(display));
    }

    /// Permanently stops the pacer and its thread. Safe to call more than once.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.running.store(false, Ordering::Release);
        let _ = self.tx.send(Command::Close);
        self.wait_for_tick();
        if !self.on_worker() {
            if let Some(handle) = self.handle.lock().unwrap().take() {
                let _ = handle.join();
            }
        }
    }

    /// Whether callbacks are currently being delivered.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    fn on_worker(&self) -> bool {
        self.shared.worker.get() == Some(&thread::current().id())
    }

    fn wait_for_tick(&self) {
        // A callback stopping its own pacer must not wait for itself.
        if !self.on_worker() {
            drop(self.shared.tick.lock().unwrap());
        }
    }
}

impl Drop for DisplayLink {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(
    rx: Receiver<Command>,
    shared: Arc<Shared>,
    source: Arc<dyn RefreshSource>,
    mut callback: impl FnMut(),
) {
    let mut interval = source.refresh_interval(DisplayId::default()).max(MIN_INTERVAL);
    let mut next: Option<Instant> = None;

    loop {
        let command = match next {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match command {
            Ok(Command::Start) => {
                if next.is_none() {
                    next = Some(Instant::now() + interval);
                }
            },
            Ok(Command::Stop) => next = None,
            Ok(Command::SetDisplay(display)) => {
                interval = source.refresh_interval(display).max(MIN_INTERVAL);
                log::debug!("display link moved to display {:?}, interval {:?}", display, interval);
                // The old deadline may be far off on a slow display.
                if next.is_some() {
                    next = Some(Instant::now() + interval);
                }
            },
            Ok(Command::Close) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                {
                    let _tick = shared.tick.lock().unwrap();
                    if shared.running.load(Ordering::Acquire) {
                        callback();
                    }
                }
                let now = Instant::now();
                // Skip frames missed while the callback ran long.
                next = next.map(|deadline| {
                    let following = deadline + interval;
                    if following < now {
                        now + interval
                    } else {
                        following
                    }
                });
            },
        }
    }
    log::trace!("display link thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_link() -> (DisplayLink, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let link = DisplayLink::new(Arc::new(FixedRefresh(Duration::from_millis(2))), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (link, ticks)
    }

    #[test]
    fn test_ticks_only_while_running() {
        let (link, ticks) = counting_link();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        link.start();
        thread::sleep(Duration::from_millis(50));
        link.stop();
        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
        link.close();
    }

    struct TwoDisplays;

    impl RefreshSource for TwoDisplays {
        fn refresh_interval(&self, display: DisplayId) -> Duration {
            match display {
                DisplayId(1) => Duration::from_millis(2),
                _ => Duration::from_secs(10),
            }
        }
    }

    #[test]
    fn test_set_display_changes_cadence() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let link = DisplayLink::new(Arc::new(TwoDisplays), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        link.start();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        link.set_display(DisplayId(1));
        thread::sleep(Duration::from_millis(50));
        assert!(ticks.load(Ordering::SeqCst) > 0);

        link.set_display(DisplayId(0));
        thread::sleep(Duration::from_millis(20));
        let settled = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(ticks.load(Ordering::SeqCst), settled);
        link.close();
    }

    #[test]
    fn test_close_is_idempotent() {
        let (link, _ticks) = counting_link();
        link.start();
        link.close();
        link.close();
        link.start();
        assert!(!link.is_running());
    }

    #[test]
    fn test_stop_from_callback_does_not_deadlock() {
        let slot: Arc<Mutex<Option<Arc<DisplayLink>>>> = Arc::new(Mutex::new(None));
        let ticks = Arc::new(AtomicUsize::new(0));
        let link = {
            let slot = slot.clone();
            let ticks = ticks.clone();
            Arc::new(
                DisplayLink::new(Arc::new(FixedRefresh(Duration::from_millis(2))), move || {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    if let Some(link) = slot.lock().unwrap().as_ref() {
                        link.stop();
                    }
                })
                .unwrap(),
            )
        };
        *slot.lock().unwrap() = Some(link.clone());
        link.start();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(!link.is_running());
        slot.lock().unwrap().take();
        link.close();
    }
}
