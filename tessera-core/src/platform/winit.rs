// SPDX-License-Identifier: LGPL-3.0-only

#![cfg(target_os = "linux")]

//! Winit based window driver.
//!
//! A single winit event loop runs on its own thread, started with the first
//! window. Creation requests travel to it through an [EventLoopProxy] and the
//! outcome comes back through an unbuffered channel.

use nalgebra::Vector2;
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Ime, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::platform::x11::EventLoopBuilderExtX11;
use winit::window::{Window as WinitWindow, WindowId};

use super::bridge;
use super::display_link::{DisplayLink, FixedRefresh};
use super::registry::WindowRegistry;
use super::unix::{UnixPlatform, WindowCounter, WindowDriver};
use super::{Callbacks, Driver, ViewHandle, WindowRequest};
use crate::config::{driver_order, DriverKind, WindowOptions};
use crate::error::WindowError;
use crate::event::{
    Buttons, ClipboardEvent, DestroyEvent, EditEvent, Event, FocusEvent, FrameEvent, KeyEvent,
    KeyName, Modifiers, PointerEvent, PointerKind, PointerSource, Stage, StageEvent,
};
use crate::unit::Metric;

/// Pixels scrolled per wheel line, before scaling.
const LINE_SCROLL: f32 = 20.0;

/// A [UnixPlatform] with every driver this build supports, ordered by
/// [driver_order].
///
/// This build ships only the X11 driver. A Wayland [WindowDriver] can be
/// added with [UnixPlatform::register], after which
/// [UnixPlatform::prefer] with [driver_order] puts it where the session
/// wants it.
pub fn default_platform() -> UnixPlatform {
    let mut platform = UnixPlatform::new();
    platform.register(WinitDriver::new(platform.counter()));
    platform.prefer(&driver_order());
    platform
}

enum UserEvent {
    Create {
        request: WindowRequest,
        reply: SyncSender<Result<(), WindowError>>,
    },
    ReadClipboard(ViewHandle),
}

/// Creates X11 windows through winit.
pub struct WinitDriver {
    proxy: Mutex<Option<EventLoopProxy<UserEvent>>>,
    counter: WindowCounter,
}

impl WinitDriver {
    /// A driver reporting window lifetimes to `counter`.
    pub fn new(counter: WindowCounter) -> Self {
        Self {
            proxy: Mutex::new(None),
            counter,
        }
    }

    fn proxy(&self) -> Result<EventLoopProxy<UserEvent>, WindowError> {
        let mut proxy = self.proxy.lock().unwrap();
        if let Some(proxy) = proxy.as_ref() {
            return Ok(proxy.clone());
        }

        let (tx, rx) = mpsc::sync_channel(0);
        let counter = self.counter.clone();
        thread::Builder::new()
            .name("tessera-winit".into())
            .spawn(move || {
                let event_loop = match EventLoop::<UserEvent>::with_user_event()
                    .with_any_thread(true)
                    .build()
                {
                    Ok(event_loop) => event_loop,
                    Err(err) => {
                        let _ = tx.send(Err(WindowError::EventLoop(err.to_string())));
                        return;
                    },
                };
                event_loop.set_control_flow(ControlFlow::Wait);
                let proxy = event_loop.create_proxy();
                let _ = tx.send(Ok(proxy.clone()));

                let mut app = WinitApp::new(counter, proxy);
                if let Err(err) = event_loop.run_app(&mut app) {
                    log::error!("winit event loop exited: {err}");
                }
            })
            .map_err(|err| WindowError::EventLoop(err.to_string()))?;

        let started = rx.recv().map_err(|_| WindowError::Disconnected)??;
        *proxy = Some(started.clone());
        Ok(started)
    }
}

impl WindowDriver for WinitDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::X11
    }

    /// Must not be called from the event loop thread itself.
    fn create_window(
        &self,
        callbacks: Arc<dyn Callbacks>,
        options: &WindowOptions,
    ) -> Result<(), WindowError> {
        let proxy = self.proxy()?;
        let (reply, outcome) = mpsc::sync_channel(0);
        proxy
            .send_event(UserEvent::Create {
                request: WindowRequest::new(callbacks, options.clone()),
                reply,
            })
            .map_err(|_| WindowError::Disconnected)?;
        outcome.recv().map_err(|_| WindowError::Disconnected)?
    }
}

/// Owns a native window until it is released.
///
/// Callbacks may keep the driver alive past a close, the native window must
/// not outlive it.
struct WindowSlot<W>(Mutex<Option<Arc<W>>>);

impl<W> WindowSlot<W> {
    fn new(window: Arc<W>) -> Self {
        Self(Mutex::new(Some(window)))
    }

    fn get(&self) -> Option<Arc<W>> {
        self.0.lock().unwrap().clone()
    }

    fn release(&self) -> Option<Arc<W>> {
        self.0.lock().unwrap().take()
    }
}

/// The [Driver] handed to the callbacks of a winit window.
struct WinitWindowDriver {
    view: ViewHandle,
    window: WindowSlot<WinitWindow>,
    display_link: DisplayLink,
    proxy: Mutex<EventLoopProxy<UserEvent>>,
    clipboard: Arc<Mutex<String>>,
}

impl WinitWindowDriver {
    fn request_redraw(&self) {
        if let Some(window) = self.window.get() {
            window.request_redraw();
        }
    }
}

impl Driver for WinitWindowDriver {
    fn read_clipboard(&self) {
        let _ = self
            .proxy
            .lock()
            .unwrap()
            .send_event(UserEvent::ReadClipboard(self.view));
    }

    fn write_clipboard(&self, text: String) {
        *self.clipboard.lock().unwrap() = text;
    }

    fn set_animating(&self, animating: bool) {
        if animating {
            self.display_link.start();
        } else {
            self.display_link.stop();
        }
    }

    fn show_text_input(&self, show: bool) {
        if let Some(window) = self.window.get() {
            window.set_ime_allowed(show);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Metrics {
    scale: f32,
    size: Vector2<i32>,
}

struct WindowState {
    callbacks: Arc<dyn Callbacks>,
    driver: Arc<WinitWindowDriver>,
    stage: Mutex<Stage>,
    metrics: Mutex<Metrics>,
    pointer: Mutex<PointerState>,
}

struct PointerState {
    position: Vector2<f32>,
    buttons: Buttons,
    modifiers: Modifiers,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            position: Vector2::zeros(),
            buttons: Buttons::empty(),
            modifiers: Modifiers::empty(),
        }
    }
}

impl WindowState {
    fn emit(&self, event: Event) {
        log::trace!("{} -> {:?}", self.driver.view, event);
        self.callbacks.event(event);
    }

    fn set_stage(&self, stage: Stage) {
        {
            let mut current = self.stage.lock().unwrap();
            if *current == stage {
                return;
            }
            *current = stage;
        }
        log::debug!("{} stage -> {}", self.driver.view, stage);
        self.emit(Event::Stage(StageEvent { stage }));
    }

    fn draw(&self) {
        let Metrics { scale, size } = *self.metrics.lock().unwrap();
        if size.x == 0 || size.y == 0 {
            return;
        }
        self.set_stage(Stage::Running);
        self.emit(Event::Frame(FrameEvent {
            size,
            metric: Metric::for_scale(scale),
            now: Instant::now(),
            sync: true,
        }));
    }
}

struct WinitApp {
    registry: WindowRegistry<WindowState>,
    proxy: EventLoopProxy<UserEvent>,
    counter: WindowCounter,
    clipboard: Arc<Mutex<String>>,
    start: Instant,
}

impl WinitApp {
    fn new(counter: WindowCounter, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            registry: WindowRegistry::new(),
            proxy,
            counter,
            clipboard: Arc::new(Mutex::new(String::new())),
            start: Instant::now(),
        }
    }

    fn create(
        &mut self,
        event_loop: &ActiveEventLoop,
        request: WindowRequest,
    ) -> Result<(), WindowError> {
        let options = &request.options;
        let attributes = WinitWindow::default_attributes()
            .with_title(options.title.clone())
            .with_inner_size(LogicalSize::new(options.size.x as f64, options.size.y as f64));
        let window = event_loop
            .create_window(attributes)
            .map(Arc::new)
            .map_err(|err| WindowError::Driver {
                driver: DriverKind::X11.name(),
                reason: err.to_string(),
            })?;

        let view = ViewHandle(u64::from(window.id()));
        let pacer_window = Arc::downgrade(&window);
        let display_link = DisplayLink::new(Arc::new(FixedRefresh::HZ_60), move || {
            if let Some(window) = pacer_window.upgrade() {
                window.request_redraw();
            }
        })
        .map_err(|err| WindowError::EventLoop(err.to_string()))?;
        let driver = Arc::new(WinitWindowDriver {
            view,
            window: WindowSlot::new(window.clone()),
            display_link,
            proxy: Mutex::new(self.proxy.clone()),
            clipboard: self.clipboard.clone(),
        });
        let size = window.inner_size();
        let state = Arc::new(WindowState {
            callbacks: request.callbacks.clone(),
            driver: driver.clone(),
            stage: Mutex::new(Stage::Paused),
            metrics: Mutex::new(Metrics {
                scale: window.scale_factor() as f32,
                size: Vector2::new(size.width as i32, size.height as i32),
            }),
            pointer: Mutex::new(PointerState::default()),
        });

        request.callbacks.set_driver(driver);
        self.registry.insert(view, state);
        self.counter.opened();
        window.request_redraw();
        log::info!("created winit window {} '{}'", view, options.title);
        Ok(())
    }

    fn destroy(&mut self, view: ViewHandle, state: Arc<WindowState>) {
        state.driver.display_link.close();
        self.registry.delete(view);
        // Dropping the last handle closes the native window.
        drop(state.driver.window.release());
        state.emit(Event::Destroy(DestroyEvent { err: None }));
        self.counter.closed();
    }

    fn pointer(&self, state: &WindowState, kind: PointerKind, scroll: Vector2<f32>) {
        let pointer = state.pointer.lock().unwrap();
        let event = PointerEvent {
            kind,
            source: PointerSource::Mouse,
            time: self.start.elapsed(),
            buttons: pointer.buttons,
            position: pointer.position,
            scroll,
            modifiers: pointer.modifiers,
        };
        drop(pointer);
        state.emit(Event::Pointer(event));
    }
}

impl ApplicationHandler<UserEvent> for WinitApp {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Create { request, reply } => {
                let outcome = self.create(event_loop, request);
                let _ = reply.send(outcome);
            },
            UserEvent::ReadClipboard(view) => {
                if let Some(state) = self.registry.lookup(view) {
                    let text = self.clipboard.lock().unwrap().clone();
                    state.emit(Event::Clipboard(ClipboardEvent { text }));
                }
            },
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let view = ViewHandle(u64::from(id));
        let Some(state) = self.registry.lookup(view) else {
            log::trace!("event for unknown {}: {:?}", view, event);
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                state.metrics.lock().unwrap().size =
                    Vector2::new(size.width as i32, size.height as i32);
                state.driver.request_redraw();
            },
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.metrics.lock().unwrap().scale = scale_factor as f32;
                state.driver.request_redraw();
            },
            WindowEvent::RedrawRequested => state.draw(),
            WindowEvent::CursorMoved { position, .. } => {
                state.pointer.lock().unwrap().position =
                    Vector2::new(position.x as f32, position.y as f32);
                self.pointer(&state, PointerKind::Move, Vector2::zeros());
            },
            WindowEvent::MouseInput {
                state: element,
                button,
                ..
            } => {
                let Some(bit) = convert_button(button) else {
                    return;
                };
                let kind = {
                    let mut pointer = state.pointer.lock().unwrap();
                    match element {
                        ElementState::Pressed => {
                            pointer.buttons |= bit;
                            PointerKind::Press
                        },
                        ElementState::Released => {
                            pointer.buttons.remove(bit);
                            PointerKind::Release
                        },
                    }
                };
                self.pointer(&state, kind, Vector2::zeros());
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let scale = state.metrics.lock().unwrap().scale;
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(x, y) => {
                        Vector2::new(-x * LINE_SCROLL * scale, -y * LINE_SCROLL * scale)
                    },
                    MouseScrollDelta::PixelDelta(p) => Vector2::new(-p.x as f32, -p.y as f32),
                };
                self.pointer(&state, PointerKind::Move, scroll);
            },
            WindowEvent::ModifiersChanged(modifiers) => {
                state.pointer.lock().unwrap().modifiers = convert_mods(modifiers.state());
            },
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let modifiers = state.pointer.lock().unwrap().modifiers;
                if let Some(name) = convert_key(&event.logical_key) {
                    state.emit(Event::Key(KeyEvent { name, modifiers }));
                }
                if let Some(text) = event.text {
                    if !modifiers.intersects(Modifiers::CONTROL | Modifiers::COMMAND)
                        && text.chars().all(|c| !c.is_control())
                    {
                        state.emit(Event::Edit(EditEvent {
                            text: text.to_string(),
                        }));
                    }
                }
            },
            WindowEvent::Ime(Ime::Commit(text)) => state.emit(Event::Edit(EditEvent { text })),
            WindowEvent::Focused(focus) => state.emit(Event::Focus(FocusEvent { focus })),
            WindowEvent::Occluded(occluded) => state.set_stage(if occluded {
                Stage::Paused
            } else {
                Stage::Running
            }),
            WindowEvent::CloseRequested => self.destroy(view, state),
            _ => (),
        }
    }
}

fn convert_button(button: MouseButton) -> Option<Buttons> {
    match button {
        MouseButton::Left => Some(Buttons::LEFT),
        MouseButton::Right => Some(Buttons::RIGHT),
        MouseButton::Middle => Some(Buttons::MIDDLE),
        _ => None,
    }
}

fn convert_mods(state: ModifiersState) -> Modifiers {
    let mut mods = Modifiers::empty();
    if state.alt_key() {
        mods |= Modifiers::ALT;
    }
    if state.control_key() {
        mods |= Modifiers::CONTROL;
    }
    if state.super_key() {
        mods |= Modifiers::COMMAND;
    }
    if state.shift_key() {
        mods |= Modifiers::SHIFT;
    }
    mods
}

fn convert_key(key: &Key) -> Option<KeyName> {
    let name = match key {
        Key::Named(named) => match named {
            NamedKey::Escape => KeyName::Escape,
            NamedKey::ArrowLeft => KeyName::LeftArrow,
            NamedKey::ArrowRight => KeyName::RightArrow,
            NamedKey::ArrowUp => KeyName::UpArrow,
            NamedKey::ArrowDown => KeyName::DownArrow,
            NamedKey::Enter => KeyName::Return,
            NamedKey::Home => KeyName::Home,
            NamedKey::End => KeyName::End,
            NamedKey::Backspace => KeyName::DeleteBackward,
            NamedKey::Delete => KeyName::DeleteForward,
            NamedKey::PageUp => KeyName::PageUp,
            NamedKey::PageDown => KeyName::PageDown,
            NamedKey::Tab => KeyName::Tab,
            NamedKey::Space => KeyName::Space,
            NamedKey::F1 => KeyName::F(1),
            NamedKey::F2 => KeyName::F(2),
            NamedKey::F3 => KeyName::F(3),
            NamedKey::F4 => KeyName::F(4),
            NamedKey::F5 => KeyName::F(5),
            NamedKey::F6 => KeyName::F(6),
            NamedKey::F7 => KeyName::F(7),
            NamedKey::F8 => KeyName::F(8),
            NamedKey::F9 => KeyName::F(9),
            NamedKey::F10 => KeyName::F(10),
            NamedKey::F11 => KeyName::F(11),
            NamedKey::F12 => KeyName::F(12),
            _ => return None,
        },
        Key::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => return bridge::convert_key(c),
                _ => return None,
            }
        },
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_named_keys() {
        assert_eq!(convert_key(&Key::Named(NamedKey::Enter)), Some(KeyName::Return));
        assert_eq!(convert_key(&Key::Named(NamedKey::F7)), Some(KeyName::F(7)));
        assert_eq!(convert_key(&Key::Named(NamedKey::CapsLock)), None);
        assert_eq!(convert_key(&Key::Character("q".into())), Some(KeyName::Char('Q')));
    }

    #[test]
    fn test_window_slot_release_drops_window() {
        let window = Arc::new(());
        let slot = WindowSlot::new(window.clone());
        assert_eq!(Arc::strong_count(&window), 2);
        assert!(slot.get().is_some());

        assert!(slot.release().is_some());
        assert_eq!(Arc::strong_count(&window), 1);
        assert!(slot.get().is_none());
        assert!(slot.release().is_none());
    }

    struct WaylandStub;

    impl WindowDriver for WaylandStub {
        fn kind(&self) -> DriverKind {
            DriverKind::Wayland
        }

        fn create_window(
            &self,
            _callbacks: Arc<dyn Callbacks>,
            _options: &WindowOptions,
        ) -> Result<(), WindowError> {
            Err(WindowError::NoDriver)
        }
    }

    #[test]
    fn test_default_platform_orders_added_drivers() {
        let mut platform = default_platform();
        assert_eq!(platform.drivers(), vec![DriverKind::X11]);

        platform.register(WaylandStub);
        platform.prefer(&crate::config::driver_order_from(None, true));
        assert_eq!(platform.drivers(), vec![DriverKind::Wayland, DriverKind::X11]);
        platform.prefer(&crate::config::driver_order_from(Some("x11"), true));
        assert_eq!(platform.drivers(), vec![DriverKind::X11, DriverKind::Wayland]);
    }

    #[test]
    fn test_convert_mods() {
        let state = ModifiersState::SHIFT | ModifiersState::SUPER;
        assert_eq!(convert_mods(state), Modifiers::SHIFT | Modifiers::COMMAND);
    }
}
