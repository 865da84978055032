// SPDX-License-Identifier: LGPL-3.0-only

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use super::Callbacks;
use crate::config::{DriverKind, WindowOptions};
use crate::error::WindowError;

/// A backend able to create windows (Wayland, X11).
pub trait WindowDriver: Send + Sync {
    /// The family this driver belongs to.
    fn kind(&self) -> DriverKind;

    /// Creates a window delivering its events to `callbacks`.
    fn create_window(
        &self,
        callbacks: Arc<dyn Callbacks>,
        options: &WindowOptions,
    ) -> Result<(), WindowError>;
}

/// Reports windows opening and closing to [UnixPlatform::main].
#[derive(Clone)]
pub struct WindowCounter {
    tx: Sender<i32>,
}

impl WindowCounter {
    /// A window was created.
    pub fn opened(&self) {
        let _ = self.tx.send(1);
    }

    /// A window was destroyed.
    pub fn closed(&self) {
        let _ = self.tx.send(-1);
    }
}

/// Window creation over the configured drivers, in registration order.
pub struct UnixPlatform {
    drivers: Vec<Box<dyn WindowDriver>>,
    counter: WindowCounter,
    changes: Mutex<Receiver<i32>>,
}

impl UnixPlatform {
    /// A platform without drivers.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            drivers: Vec::new(),
            counter: WindowCounter { tx },
            changes: Mutex::new(rx),
        }
    }

    /// Appends a driver. Drivers are tried in the order they were registered.
    pub fn register(&mut self, driver: impl WindowDriver + 'static) {
        log::debug!("registered {} window driver", driver.kind().name());
        self.drivers.push(Box::new(driver));
    }

    /// Reorders the drivers to follow `order`. Kinds missing from `order`
    /// keep their relative order after the listed ones.
    pub fn prefer(&mut self, order: &[DriverKind]) {
        self.drivers.sort_by_key(|driver| {
            order
                .iter()
                .position(|kind| *kind == driver.kind())
                .unwrap_or(order.len())
        });
    }

    /// Kinds of the registered drivers, in trial order.
    pub fn drivers(&self) -> Vec<DriverKind> {
        self.drivers.iter().map(|driver| driver.kind()).collect()
    }

    /// A handle drivers use to report window lifetimes.
    pub fn counter(&self) -> WindowCounter {
        self.counter.clone()
    }

    /// Creates a window with the first driver that succeeds.
    ///
    /// When every driver fails the first error is returned.
    pub fn new_window(
        &self,
        callbacks: Arc<dyn Callbacks>,
        options: WindowOptions,
    ) -> Result<(), WindowError> {
        let mut first_err = None;
        for driver in &self.drivers {
            match driver.create_window(callbacks.clone(), &options) {
                Ok(()) => {
                    log::info!("window '{}' created by {} driver", options.title, driver.kind().name());
                    return Ok(());
                },
                Err(err) => {
                    log::warn!("{} driver failed to create window: {err}", driver.kind().name());
                    first_err.get_or_insert(err);
                },
            }
        }
        Err(first_err.unwrap_or(WindowError::NoDriver))
    }

    /// Blocks until the first window opened and then every window closed.
    pub fn main(&self) {
        let changes = self.changes.lock().unwrap();
        let Ok(mut count) = changes.recv() else {
            return;
        };
        while count > 0 {
            match changes.recv() {
                Ok(change) => count += change,
                Err(_) => break,
            }
        }
        log::debug!("last window closed");
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::platform::Driver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct Sink;

    impl Callbacks for Sink {
        fn set_driver(&self, _driver: Arc<dyn Driver>) {}
        fn event(&self, _event: Event) {}
    }

    struct Fake {
        kind: DriverKind,
        result: Result<(), WindowError>,
        calls: Arc<AtomicUsize>,
    }

    impl WindowDriver for Fake {
        fn kind(&self) -> DriverKind {
            self.kind
        }

        fn create_window(
            &self,
            _callbacks: Arc<dyn Callbacks>,
            _options: &WindowOptions,
        ) -> Result<(), WindowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn fake(kind: DriverKind, result: Result<(), WindowError>) -> (Fake, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Fake {
                kind,
                result,
                calls: calls.clone(),
            },
            calls,
        )
    }

    fn driver_err(driver: &'static str) -> WindowError {
        WindowError::Driver {
            driver,
            reason: "unavailable".into(),
        }
    }

    #[test]
    fn test_no_driver() {
        let platform = UnixPlatform::new();
        assert_eq!(
            platform.new_window(Arc::new(Sink), WindowOptions::default()),
            Err(WindowError::NoDriver)
        );
    }

    #[test]
    fn test_falls_through_to_next_driver() {
        let mut platform = UnixPlatform::new();
        let (wayland, wayland_calls) = fake(DriverKind::Wayland, Err(driver_err("wayland")));
        let (x11, x11_calls) = fake(DriverKind::X11, Ok(()));
        platform.register(wayland);
        platform.register(x11);

        assert_eq!(platform.new_window(Arc::new(Sink), WindowOptions::default()), Ok(()));
        assert_eq!(wayland_calls.load(Ordering::SeqCst), 1);
        assert_eq!(x11_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_error_wins() {
        let mut platform = UnixPlatform::new();
        platform.register(fake(DriverKind::Wayland, Err(driver_err("wayland"))).0);
        platform.register(fake(DriverKind::X11, Err(driver_err("x11"))).0);
        assert_eq!(
            platform.new_window(Arc::new(Sink), WindowOptions::default()),
            Err(driver_err("wayland"))
        );
    }

    #[test]
    fn test_prefer_reorders() {
        let mut platform = UnixPlatform::new();
        platform.register(fake(DriverKind::Wayland, Ok(())).0);
        platform.register(fake(DriverKind::X11, Ok(())).0);
        platform.prefer(&[DriverKind::X11]);
        assert_eq!(platform.drivers(), vec![DriverKind::X11, DriverKind::Wayland]);
    }

    #[test]
    fn test_main_returns_after_last_window() {
        let platform = Arc::new(UnixPlatform::new());
        let counter = platform.counter();
        let main = {
            let platform = platform.clone();
            thread::spawn(move || platform.main())
        };
        counter.opened();
        counter.opened();
        counter.closed();
        counter.closed();
        main.join().unwrap();
    }
}
