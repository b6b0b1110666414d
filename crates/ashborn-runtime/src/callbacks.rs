//! Callback registry owned by the simulation loop
//!
//! Callbacks are stored by value. Any of them may be absent.

use crate::timing::FrameTiming;
use winit::keyboard::KeyCode;

type Hook = Box<dyn FnMut()>;
type TimingHook = Box<dyn FnMut(&FrameTiming) -> anyhow::Result<()>>;
type FixedHook = Box<dyn FnMut(f64) -> anyhow::Result<()>>;
type ResizeHook = Box<dyn FnMut(u32, u32)>;
type FocusHook = Box<dyn FnMut(bool)>;
type KeyHook = Box<dyn FnMut(KeyCode, bool)>;

/// Hooks the embedding application registers with the loop
#[derive(Default)]
pub struct Callbacks {
    start: Option<Hook>,
    update: Option<TimingHook>,
    fixed_update: Option<FixedHook>,
    render: Option<TimingHook>,
    gui: Option<Hook>,
    resize: Option<ResizeHook>,
    focus_changed: Option<FocusHook>,
    key: Option<KeyHook>,
    shutdown: Option<Hook>,
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("start", &self.start.is_some())
            .field("update", &self.update.is_some())
            .field("fixed_update", &self.fixed_update.is_some())
            .field("render", &self.render.is_some())
            .field("gui", &self.gui.is_some())
            .field("resize", &self.resize.is_some())
            .field("focus_changed", &self.focus_changed.is_some())
            .field("key", &self.key.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once after the engine is initialized, before the first frame.
    pub fn on_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    /// Called once per unpaused frame with the frame's timing.
    pub fn on_update(mut self, f: impl FnMut(&FrameTiming) -> anyhow::Result<()> + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    /// Called zero or more times per unpaused frame with the fixed timestep.
    pub fn on_fixed_update(mut self, f: impl FnMut(f64) -> anyhow::Result<()> + 'static) -> Self {
        self.fixed_update = Some(Box::new(f));
        self
    }

    /// Called once per unpaused frame; `interpolation` is set for smoothing.
    pub fn on_render(mut self, f: impl FnMut(&FrameTiming) -> anyhow::Result<()> + 'static) -> Self {
        self.render = Some(Box::new(f));
        self
    }

    /// Called after render, before present.
    pub fn on_gui(mut self, f: impl FnMut() + 'static) -> Self {
        self.gui = Some(Box::new(f));
        self
    }

    pub fn on_resize(mut self, f: impl FnMut(u32, u32) + 'static) -> Self {
        self.resize = Some(Box::new(f));
        self
    }

    pub fn on_focus_changed(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.focus_changed = Some(Box::new(f));
        self
    }

    /// Key presses and releases, including Escape.
    pub fn on_key(mut self, f: impl FnMut(KeyCode, bool) + 'static) -> Self {
        self.key = Some(Box::new(f));
        self
    }

    /// Called once when the loop ends.
    pub fn on_shutdown(mut self, f: impl FnMut() + 'static) -> Self {
        self.shutdown = Some(Box::new(f));
        self
    }

    pub(crate) fn start(&mut self) {
        if let Some(f) = self.start.as_mut() {
            f();
        }
    }

    pub(crate) fn update(&mut self, timing: &FrameTiming) -> anyhow::Result<()> {
        match self.update.as_mut() {
            Some(f) => f(timing),
            None => Ok(()),
        }
    }

    pub(crate) fn fixed_update(&mut self, dt: f64) -> anyhow::Result<()> {
        match self.fixed_update.as_mut() {
            Some(f) => f(dt),
            None => Ok(()),
        }
    }

    pub(crate) fn render(&mut self, timing: &FrameTiming) -> anyhow::Result<()> {
        match self.render.as_mut() {
            Some(f) => f(timing),
            None => Ok(()),
        }
    }

    pub(crate) fn gui(&mut self) {
        if let Some(f) = self.gui.as_mut() {
            f();
        }
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if let Some(f) = self.resize.as_mut() {
            f(width, height);
        }
    }

    pub(crate) fn focus_changed(&mut self, focused: bool) {
        if let Some(f) = self.focus_changed.as_mut() {
            f(focused);
        }
    }

    pub(crate) fn key(&mut self, code: KeyCode, pressed: bool) {
        if let Some(f) = self.key.as_mut() {
            f(code, pressed);
        }
    }

    pub(crate) fn shutdown(&mut self) {
        if let Some(f) = self.shutdown.as_mut() {
            f();
        }
    }
}
