// SPDX-License-Identifier: LGPL-3.0-only

//! Native event bridge for hosts with a single native application instance.
//!
//! The native side (an AppKit view and its delegate) calls the `on_*` methods
//! of [Bridge] from the UI thread. The bridge resolves the [Window] of the
//! view, normalizes the callback into an [Event] and hands it to the
//! window's [Callbacks].

use nalgebra::Vector2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

use super::display_link::{DisplayLink, RefreshSource};
use super::registry::WindowRegistry;
use super::rendezvous::WindowRendezvous;
use super::{Callbacks, DisplayId, Driver, ViewHandle, WindowRequest};
use crate::config::WindowOptions;
use crate::error::{fatal, WindowError};
use crate::event::key::is_printable;
use crate::event::{
    Buttons, ClipboardEvent, DestroyEvent, EditEvent, Event, FocusEvent, FrameEvent, KeyEvent,
    KeyName, Modifiers, PointerEvent, PointerKind, PointerSource, Stage, StageEvent,
};
use crate::unit::{self, Metric};

/// Codes used by the AppKit side of the bridge.
pub mod appkit {
    #![allow(missing_docs)]

    /// Mouse moved or scrolled.
    pub const MOUSE_MOVE: i32 = 1;
    /// Mouse button released.
    pub const MOUSE_UP: i32 = 2;
    /// Mouse button pressed.
    pub const MOUSE_DOWN: i32 = 3;

    /// `NSShiftKeyMask`
    pub const SHIFT_KEY_MASK: u64 = 1 << 17;
    /// `NSControlKeyMask`
    pub const CONTROL_KEY_MASK: u64 = 1 << 18;
    /// `NSAlternateKeyMask`
    pub const ALTERNATE_KEY_MASK: u64 = 1 << 19;
    /// `NSCommandKeyMask`
    pub const COMMAND_KEY_MASK: u64 = 1 << 20;

    pub const UP_ARROW_FUNCTION_KEY: u32 = 0xF700;
    pub const DOWN_ARROW_FUNCTION_KEY: u32 = 0xF701;
    pub const LEFT_ARROW_FUNCTION_KEY: u32 = 0xF702;
    pub const RIGHT_ARROW_FUNCTION_KEY: u32 = 0xF703;
    /// `NSF1FunctionKey`; F2 through F12 follow consecutively.
    pub const F1_FUNCTION_KEY: u32 = 0xF704;
    pub const F12_FUNCTION_KEY: u32 = 0xF70F;
    pub const DELETE_FUNCTION_KEY: u32 = 0xF728;
    pub const HOME_FUNCTION_KEY: u32 = 0xF729;
    pub const END_FUNCTION_KEY: u32 = 0xF72B;
    pub const PAGE_UP_FUNCTION_KEY: u32 = 0xF72C;
    pub const PAGE_DOWN_FUNCTION_KEY: u32 = 0xF72D;
}

/// The native UI API behind a [Bridge].
///
/// Every method is called on the UI thread except
/// [run_on_main](Self::run_on_main), which exists to get there.
pub trait NativeHost: Send + Sync + 'static {
    /// Backing scale factor of the view's screen.
    fn backing_scale(&self, view: ViewHandle) -> f32;

    /// Width and height of the view in unscaled points.
    fn view_size(&self, view: ViewHandle) -> (f32, f32);

    /// Current clipboard text.
    fn read_clipboard(&self) -> String;

    /// Replaces the clipboard with UTF-16 text.
    fn write_clipboard(&self, chars: &[u16]);

    /// Runs `f` on the UI thread.
    fn run_on_main(&self, f: Box<dyn FnOnce() + Send>);

    /// Creates the content view of the main window.
    fn create_view(&self) -> Option<ViewHandle>;

    /// Shows a window around `view` and runs the native application loop.
    fn run(&self, view: ViewHandle, title: &str, width: f32, height: f32);

    /// Refresh intervals of the attached displays.
    fn refresh_source(&self) -> Arc<dyn RefreshSource>;
}

#[derive(Debug, Clone, Copy, Default)]
struct Metrics {
    scale: f32,
    width: f32,
    height: f32,
}

/// The bridge side of a native window.
pub struct Window<H: NativeHost> {
    view: ViewHandle,
    host: Arc<H>,
    callbacks: OnceLock<Arc<dyn Callbacks>>,
    stage: Mutex<Stage>,
    display_link: DisplayLink,
    metrics: Mutex<Metrics>,
}

impl<H: NativeHost> Window<H> {
    fn new(view: ViewHandle, host: Arc<H>, scale: f32) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let display_link = DisplayLink::new(host.refresh_source(), move || {
                if let Some(window) = weak.upgrade() {
                    window.draw(false);
                }
            })
            .unwrap_or_else(|err| fatal(&format!("failed to start display link: {err}")));

            Self {
                view,
                host,
                callbacks: OnceLock::new(),
                stage: Mutex::new(Stage::Paused),
                display_link,
                metrics: Mutex::new(Metrics {
                    scale,
                    ..Metrics::default()
                }),
            }
        })
    }

    /// The native view of this window.
    pub fn view(&self) -> ViewHandle {
        self.view
    }

    /// The current lifecycle stage.
    pub fn stage(&self) -> Stage {
        *self.stage.lock().unwrap()
    }

    /// The last known backing scale factor.
    pub fn scale(&self) -> f32 {
        self.metrics.lock().unwrap().scale
    }

    fn callbacks(&self) -> &Arc<dyn Callbacks> {
        match self.callbacks.get() {
            Some(callbacks) => callbacks,
            None => fatal(&format!("{} has no callbacks bound", self.view)),
        }
    }

    fn emit(&self, event: Event) {
        log::trace!("{} -> {:?}", self.view, event);
        self.callbacks().event(event);
    }

    fn set_stage(&self, stage: Stage) {
        {
            let mut current = self.stage.lock().unwrap();
            if *current == stage {
                return;
            }
            *current = stage;
        }
        log::debug!("{} stage -> {}", self.view, stage);
        self.emit(Event::Stage(StageEvent { stage }));
    }

    fn update_metrics(&self, scale: f32, width: f32, height: f32) {
        let mut metrics = self.metrics.lock().unwrap();
        metrics.scale = scale;
        metrics.width = width;
        metrics.height = height;
    }

    fn draw(&self, sync: bool) {
        let Metrics {
            scale,
            width,
            height,
        } = *self.metrics.lock().unwrap();
        if width == 0.0 || height == 0.0 {
            return;
        }
        let size = Vector2::new(unit::round(width * scale), unit::round(height * scale));
        self.set_stage(Stage::Running);
        self.emit(Event::Frame(FrameEvent {
            size,
            metric: Metric::for_scale(scale),
            now: Instant::now(),
            sync,
        }));
    }
}

impl<H: NativeHost> Driver for Window<H> {
    fn read_clipboard(&self) {
        let host = self.host.clone();
        let callbacks = self.callbacks().clone();
        self.host.run_on_main(Box::new(move || {
            let text = host.read_clipboard();
            callbacks.event(Event::Clipboard(ClipboardEvent { text }));
        }));
    }

    fn write_clipboard(&self, text: String) {
        let chars: Vec<u16> = text.encode_utf16().collect();
        let host = self.host.clone();
        self.host.run_on_main(Box::new(move || host.write_clipboard(&chars)));
    }

    fn set_animating(&self, animating: bool) {
        if animating {
            self.display_link.start();
        } else {
            self.display_link.stop();
        }
    }

    fn show_text_input(&self, _show: bool) {}
}

/// Routes native callbacks to windows.
///
/// The registry and rendezvous are injected so that several bridges (or
/// tests) never share ambient state.
pub struct Bridge<H: NativeHost> {
    host: Arc<H>,
    registry: Arc<WindowRegistry<Window<H>>>,
    rendezvous: Arc<WindowRendezvous>,
    claimed: AtomicBool,
}

impl<H: NativeHost> Bridge<H> {
    /// Creates a bridge with a fresh registry and rendezvous.
    pub fn new(host: Arc<H>) -> Self {
        Self::with_parts(
            host,
            Arc::new(WindowRegistry::new()),
            Arc::new(WindowRendezvous::new()),
        )
    }

    /// Creates a bridge around existing parts.
    pub fn with_parts(
        host: Arc<H>,
        registry: Arc<WindowRegistry<Window<H>>>,
        rendezvous: Arc<WindowRendezvous>,
    ) -> Self {
        Self {
            host,
            registry,
            rendezvous,
            claimed: AtomicBool::new(false),
        }
    }

    /// The window registry of this bridge.
    pub fn registry(&self) -> &Arc<WindowRegistry<Window<H>>> {
        &self.registry
    }

    /// Requests the main window. Callable from any thread; blocks until the UI
    /// thread created the view or failed to.
    pub fn new_window(
        &self,
        callbacks: Arc<dyn Callbacks>,
        options: WindowOptions,
    ) -> Result<(), WindowError> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return Err(WindowError::MultipleWindows);
        }
        let result = self.rendezvous.submit(WindowRequest::new(callbacks, options));
        if result.is_err() {
            self.claimed.store(false, Ordering::Release);
        }
        result
    }

    /// Runs the UI side. Must be called from the thread owning the native
    /// application; does not return while the native loop runs.
    pub fn main(&self) -> Result<(), WindowError> {
        let request = self.rendezvous.next_request();
        let Some(view) = self.host.create_view() else {
            let err = WindowError::ViewCreation("host returned no view".into());
            log::error!("{err}");
            self.rendezvous.complete(Err(err.clone()));
            return Err(err);
        };
        // Window sizes are in unscaled screen points, not device pixels.
        let size = request.options.size_px(&Metric::for_scale(1.0));
        log::info!(
            "creating window '{}' ({}x{}) for {}",
            request.options.title,
            size.x,
            size.y,
            view
        );
        self.host
            .run(view, &request.options.title, size.x as f32, size.y as f32);
        Ok(())
    }

    /// The native view was created.
    pub fn on_create(&self, view: ViewHandle) {
        let scale = self.host.backing_scale(view);
        let window = Window::new(view, self.host.clone(), scale);
        let request = self.rendezvous.take_request();
        let _ = window.callbacks.set(request.callbacks.clone());
        request.callbacks.set_driver(window.clone());
        self.registry.insert(view, window);
        log::debug!("{} registered", view);
        self.rendezvous.complete(Ok(()));
    }

    /// The view needs drawing.
    pub fn on_draw(&self, view: ViewHandle) {
        let window = self.registry.must(view);
        let scale = self.host.backing_scale(view);
        let (width, height) = self.host.view_size(view);
        window.update_metrics(scale, width, height);
        window.draw(true);
    }

    /// A mouse event. Coordinates are in unscaled points, `time` in seconds.
    #[allow(clippy::too_many_arguments)]
    pub fn on_mouse(
        &self,
        view: ViewHandle,
        dir: i32,
        buttons: u64,
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        time: f64,
        mods: u64,
    ) {
        let kind = match dir {
            appkit::MOUSE_MOVE => PointerKind::Move,
            appkit::MOUSE_UP => PointerKind::Release,
            appkit::MOUSE_DOWN => PointerKind::Press,
            _ => fatal(&format!("invalid mouse direction {dir}")),
        };
        let window = self.registry.must(view);
        let scale = window.scale();
        window.emit(Event::Pointer(PointerEvent {
            kind,
            source: PointerSource::Mouse,
            time: seconds_to_duration(time),
            buttons: convert_buttons(buttons),
            position: Vector2::new(x as f32 * scale, y as f32 * scale),
            scroll: Vector2::new(dx as f32 * scale, dy as f32 * scale),
            modifiers: convert_mods(mods),
        }));
    }

    /// Key presses. Each character of `chars` is one key.
    pub fn on_keys(&self, view: ViewHandle, chars: &str, _time: f64, mods: u64) {
        let modifiers = convert_mods(mods);
        let window = self.registry.must(view);
        for c in chars.chars() {
            if let Some(name) = convert_key(c) {
                window.emit(Event::Key(KeyEvent { name, modifiers }));
            }
        }
    }

    /// Text input.
    pub fn on_text(&self, view: ViewHandle, text: &str) {
        let window = self.registry.must(view);
        window.emit(Event::Edit(EditEvent {
            text: text.to_string(),
        }));
    }

    /// Keyboard focus changed.
    pub fn on_focus(&self, view: ViewHandle, focus: bool) {
        let window = self.registry.must(view);
        window.emit(Event::Focus(FocusEvent { focus }));
    }

    /// The view moved to another screen.
    pub fn on_change_screen(&self, view: ViewHandle, display: DisplayId) {
        let window = self.registry.must(view);
        window.display_link.set_display(display);
    }

    /// The window was hidden or minimized.
    pub fn on_hide(&self, view: ViewHandle) {
        self.registry.must(view).set_stage(Stage::Paused);
    }

    /// The window became visible.
    pub fn on_show(&self, view: ViewHandle) {
        self.registry.must(view).set_stage(Stage::Running);
    }

    /// The window closed normally.
    pub fn on_terminate(&self, view: ViewHandle) {
        self.terminate(view, None);
    }

    /// The host killed the window.
    pub fn on_terminate_with_error(&self, view: ViewHandle, reason: &str) {
        self.terminate(view, Some(WindowError::Terminated(reason.to_string())));
    }

    fn terminate(&self, view: ViewHandle, err: Option<WindowError>) {
        let window = self.registry.must(view);
        window.display_link.close();
        self.registry.delete(view);
        log::debug!("{} removed", view);
        window.emit(Event::Destroy(DestroyEvent { err }));
    }
}

/// Converts a native timestamp in seconds, rounding to the nearest nanosecond.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if !(seconds > 0.0) {
        return Duration::ZERO;
    }
    Duration::from_nanos((seconds * 1e9 + 0.5) as u64)
}

/// Decodes the native button mask. Bits past the third are ignored.
pub fn convert_buttons(mask: u64) -> Buttons {
    let mut buttons = Buttons::empty();
    if mask & (1 << 0) != 0 {
        buttons |= Buttons::LEFT;
    }
    if mask & (1 << 1) != 0 {
        buttons |= Buttons::RIGHT;
    }
    if mask & (1 << 2) != 0 {
        buttons |= Buttons::MIDDLE;
    }
    buttons
}

/// Decodes the native modifier mask.
pub fn convert_mods(mask: u64) -> Modifiers {
    let mut mods = Modifiers::empty();
    if mask & appkit::ALTERNATE_KEY_MASK != 0 {
        mods |= Modifiers::ALT;
    }
    if mask & appkit::CONTROL_KEY_MASK != 0 {
        mods |= Modifiers::CONTROL;
    }
    if mask & appkit::COMMAND_KEY_MASK != 0 {
        mods |= Modifiers::COMMAND;
    }
    if mask & appkit::SHIFT_KEY_MASK != 0 {
        mods |= Modifiers::SHIFT;
    }
    mods
}

/// Maps a native key character to a [KeyName].
///
/// Characters outside the table are upper-cased; unprintable ones yield [None].
pub fn convert_key(c: char) -> Option<KeyName> {
    let name = match c as u32 {
        0x1b => KeyName::Escape,
        appkit::LEFT_ARROW_FUNCTION_KEY => KeyName::LeftArrow,
        appkit::RIGHT_ARROW_FUNCTION_KEY => KeyName::RightArrow,
        appkit::UP_ARROW_FUNCTION_KEY => KeyName::UpArrow,
        appkit::DOWN_ARROW_FUNCTION_KEY => KeyName::DownArrow,
        0x0d => KeyName::Return,
        0x03 => KeyName::Enter,
        appkit::HOME_FUNCTION_KEY => KeyName::Home,
        appkit::END_FUNCTION_KEY => KeyName::End,
        0x7f => KeyName::DeleteBackward,
        appkit::DELETE_FUNCTION_KEY => KeyName::DeleteForward,
        appkit::PAGE_UP_FUNCTION_KEY => KeyName::PageUp,
        appkit::PAGE_DOWN_FUNCTION_KEY => KeyName::PageDown,
        code @ appkit::F1_FUNCTION_KEY..=appkit::F12_FUNCTION_KEY => {
            KeyName::F((code - appkit::F1_FUNCTION_KEY + 1) as u8)
        },
        0x09 | 0x19 => KeyName::Tab,
        0x20 => KeyName::Space,
        _ => {
            let mut upper = c.to_uppercase();
            let k = match (upper.next(), upper.next()) {
                (Some(k), None) => k,
                _ => c,
            };
            if !is_printable(k) {
                return None;
            }
            KeyName::Char(k)
        },
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_round_half_up() {
        let t = seconds_to_duration(1.0005);
        assert_eq!(t, Duration::from_nanos(1_000_500_000));
        assert!(t.as_millis() == 1000 || t.as_millis() == 1001);
        assert_eq!(seconds_to_duration(7e-10), Duration::from_nanos(1));
        assert_eq!(seconds_to_duration(3e-10), Duration::ZERO);
        assert_eq!(seconds_to_duration(-1.0), Duration::ZERO);
    }

    #[test]
    fn test_buttons_ignore_high_bits() {
        assert_eq!(convert_buttons(0b1), Buttons::LEFT);
        assert_eq!(convert_buttons(0b110), Buttons::RIGHT | Buttons::MIDDLE);
        assert_eq!(convert_buttons(0b1000), Buttons::empty());
    }

    #[test]
    fn test_mods() {
        let mods = convert_mods(appkit::SHIFT_KEY_MASK | appkit::COMMAND_KEY_MASK);
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::COMMAND);
        assert_eq!(convert_mods(1 << 3), Modifiers::empty());
    }

    #[test]
    fn test_key_table() {
        assert_eq!(convert_key('\u{1b}'), Some(KeyName::Escape));
        assert_eq!(convert_key('\r'), Some(KeyName::Return));
        assert_eq!(convert_key('\u{3}'), Some(KeyName::Enter));
        assert_eq!(convert_key('\u{7f}'), Some(KeyName::DeleteBackward));
        assert_eq!(convert_key('\u{F728}'), Some(KeyName::DeleteForward));
        assert_eq!(convert_key('\u{F704}'), Some(KeyName::F(1)));
        assert_eq!(convert_key('\u{F70F}'), Some(KeyName::F(12)));
        assert_eq!(convert_key('\u{19}'), Some(KeyName::Tab));
        assert_eq!(convert_key(' '), Some(KeyName::Space));
        assert_eq!(convert_key('a'), Some(KeyName::Char('A')));
        assert_eq!(convert_key('\u{F710}'), None);
        assert_eq!(convert_key('\u{1}'), None);
    }
}
