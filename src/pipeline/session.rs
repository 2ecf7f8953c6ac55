//! Session - the context that owns the screen, the input path and the
//! element router.
//!
//! ```text
//! bytes → InputParser ─┬─ key   → key handlers   → Router::dispatch_key
//!                      ├─ mouse → MouseDecoder → mouse handlers → Router::dispatch_mouse
//!                      └─ error → mouse handlers (ERROR) + error handlers
//!
//! render: Screen::update → Router::draw → Screen::flush
//! ```
//!
//! Handlers return `true` to consume an event, which stops it before any
//! later handler and before the router.
//!
//! # Example
//!
//! ```ignore
//! use termtile::{Config, Session, TerminalSize};
//!
//! let size = TerminalSize::fixed(80, 24);
//! let mut session = Session::new(Config::default(), size, std::io::stdout());
//! session.start()?;
//! let id = session.on_key(|event| event.is_ctrl("c"));
//! session.feed(b"\x1b[<0;10;5M");
//! session.render()?;
//! session.off(id);
//! ```

use std::io::Write;

use tracing::{debug, trace, warn};

use super::terminal::TerminalSize;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::{
    FrameScanner, InputParser, KeyboardEvent, MouseDecoder, MouseEvent, ParsedEvent,
};
use crate::renderer::Screen;
use crate::state::Router;

/// Handle returned by the `on_*` subscriptions.
pub type HandlerId = usize;

pub type KeyHandler = Box<dyn FnMut(&KeyboardEvent) -> bool>;
pub type MouseHandler = Box<dyn FnMut(&MouseEvent) -> bool>;
pub type ErrorHandler = Box<dyn FnMut(&Error)>;

#[derive(Default)]
struct HandlerRegistry {
    key: Vec<(HandlerId, KeyHandler)>,
    mouse: Vec<(HandlerId, MouseHandler)>,
    error: Vec<(HandlerId, ErrorHandler)>,
    next_id: HandlerId,
}

impl HandlerRegistry {
    fn next_id(&mut self) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.key.len() + self.mouse.len() + self.error.len();
        self.key.retain(|(h, _)| *h != id);
        self.mouse.retain(|(h, _)| *h != id);
        self.error.retain(|(h, _)| *h != id);
        before != self.key.len() + self.mouse.len() + self.error.len()
    }

    fn emit_key(&mut self, event: &KeyboardEvent) -> bool {
        self.key.iter_mut().any(|(_, handler)| handler(event))
    }

    fn emit_mouse(&mut self, event: &MouseEvent) -> bool {
        self.mouse.iter_mut().any(|(_, handler)| handler(event))
    }

    fn emit_error(&mut self, error: &Error) {
        for (_, handler) in &mut self.error {
            handler(error);
        }
    }
}

/// Owns everything one interactive terminal application needs.
pub struct Session<W: Write> {
    config: Config,
    out: W,
    size: TerminalSize,
    screen: Screen,
    parser: InputParser,
    mouse: MouseDecoder,
    router: Router,
    handlers: HandlerRegistry,
}

impl<W: Write> Session<W> {
    pub fn new(config: Config, size: TerminalSize, out: W) -> Self {
        let scanner = FrameScanner {
            max_sgr_len: config.max_sgr_len,
            x11_overflow: config.x11_overflow,
        };
        Self {
            screen: Screen::new(size.clone()),
            parser: InputParser::with_scanner(scanner),
            mouse: MouseDecoder::new(),
            router: Router::new(config.popup_header_rows),
            handlers: HandlerRegistry::default(),
            size,
            config,
            out,
        }
    }

    /// A session sized from the real terminal, falling back to the
    /// configured size.
    pub fn detect(config: Config, out: W) -> Self {
        let size = TerminalSize::detect((config.fallback_width, config.fallback_height));
        Self::new(config, size, out)
    }

    /// Turn on mouse tracking when the configuration asks for it.
    pub fn start(&mut self) -> Result<()> {
        if self.config.mouse {
            self.enable_mouse()?;
        }
        Ok(())
    }

    pub fn enable_mouse(&mut self) -> Result<()> {
        self.mouse.enable(&mut self.out, self.config.restore_on_panic)?;
        Ok(())
    }

    /// Idempotent.
    pub fn disable_mouse(&mut self) -> Result<()> {
        self.mouse.disable(&mut self.out)?;
        Ok(())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn on_key<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&KeyboardEvent) -> bool + 'static,
    {
        let id = self.handlers.next_id();
        self.handlers.key.push((id, Box::new(handler)));
        id
    }

    pub fn on_mouse<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&MouseEvent) -> bool + 'static,
    {
        let id = self.handlers.next_id();
        self.handlers.mouse.push((id, Box::new(handler)));
        id
    }

    /// Decode and compositor anomalies.
    pub fn on_error<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&Error) + 'static,
    {
        let id = self.handlers.next_id();
        self.handlers.error.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn off(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Parse `bytes` and route every complete event.
    pub fn feed(&mut self, bytes: &[u8]) {
        for event in self.parser.parse(bytes) {
            self.route(event);
        }
    }

    /// Resolve buffered partial input (input timeout expired).
    pub fn flush_pending(&mut self) {
        for event in self.parser.flush_pending() {
            self.route(event);
        }
    }

    fn route(&mut self, event: ParsedEvent) {
        match event {
            ParsedEvent::Key(key) => {
                trace!(key = %key.key, "key");
                if !self.handlers.emit_key(&key) {
                    self.router.dispatch_key(&key);
                }
            }
            ParsedEvent::Mouse(report) => {
                if !self.mouse.is_enabled() {
                    trace!("mouse frame dropped, tracking disabled");
                    return;
                }
                let event = self.mouse.decode(&report);
                trace!(event = %event.name(), x = event.data.x, y = event.data.y, "mouse");
                if !self.handlers.emit_mouse(&event) {
                    self.router.dispatch_mouse(&event);
                }
            }
            ParsedEvent::MouseError { consumed } => {
                if !self.mouse.is_enabled() {
                    return;
                }
                warn!(consumed, "undecodable mouse frame");
                self.handlers.emit_mouse(&MouseEvent::error(consumed));
                self.handlers.emit_error(&Error::MalformedFrame { consumed });
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Compose and write one frame.
    pub fn render(&mut self) -> Result<()> {
        self.screen.update();
        self.router.draw(&mut self.screen);
        self.screen.flush(&mut self.out)?;
        self.out.flush()?;
        for anomaly in self.screen.take_anomalies() {
            self.handlers.emit_error(&anomaly);
        }
        Ok(())
    }

    /// Record a new terminal size; the next `render` uses it.
    pub fn resize(&mut self, width: u16, height: u16) {
        debug!(width, height, "resize");
        self.size.set(width, height);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn mouse(&self) -> &MouseDecoder {
        &self.mouse
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

impl<W: Write> Drop for Session<W> {
    fn drop(&mut self) {
        if let Err(err) = self.mouse.disable(&mut self.out) {
            warn!(error = %err, "failed to disable mouse tracking");
        }
    }
}

impl<W: Write> std::fmt::Debug for Session<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("size", &self.size)
            .field("mouse", &self.mouse)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseEventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> Session<Vec<u8>> {
        Session::new(Config::default(), TerminalSize::fixed(20, 4), Vec::new())
    }

    #[test]
    fn test_start_enables_mouse() {
        let mut s = session();
        s.start().unwrap();
        assert!(s.mouse().is_enabled());
        assert_eq!(s.output().as_slice(), b"\x1b[?1006h\x1b[?1003h");

        let quiet = Config {
            mouse: false,
            ..Config::default()
        };
        let mut s = Session::new(quiet, TerminalSize::fixed(20, 4), Vec::new());
        s.start().unwrap();
        assert!(!s.mouse().is_enabled());
    }

    #[test]
    fn test_mouse_dropped_while_disabled() {
        let mut s = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let keys = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        s.on_mouse(move |e| {
            sink.borrow_mut().push(e.name());
            false
        });
        let key_sink = keys.clone();
        s.on_key(move |e| {
            key_sink.borrow_mut().push(e.key.clone());
            false
        });

        s.feed(b"\x1b[<0;10;5M");
        assert!(seen.borrow().is_empty());
        assert!(keys.borrow().is_empty());

        s.enable_mouse().unwrap();
        s.feed(b"\x1b[<0;10;5M");
        assert_eq!(*seen.borrow(), vec!["MOUSE_LEFT_BUTTON_PRESSED".to_string()]);
    }

    #[test]
    fn test_malformed_frame_reports_error() {
        let mut s = session();
        s.enable_mouse().unwrap();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let kinds = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        s.on_error(move |e| sink.borrow_mut().push(e.to_string()));
        let kind_sink = kinds.clone();
        s.on_mouse(move |e| {
            kind_sink.borrow_mut().push(e.kind);
            false
        });

        s.feed(b"\x1b[<0;1M");
        assert_eq!(errors.borrow().len(), 1);
        assert_eq!(*kinds.borrow(), vec![MouseEventKind::Error { consumed: 7 }]);
    }

    #[test]
    fn test_off_removes_handler() {
        let mut s = session();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = s.on_key(move |_| {
            *sink.borrow_mut() += 1;
            false
        });
        s.feed(b"a");
        assert!(s.off(id));
        assert!(!s.off(id));
        s.feed(b"b");
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_consuming_handler_stops_chain() {
        let mut s = session();
        let later = Rc::new(RefCell::new(0));
        s.on_key(|e| e.key == "q");
        let sink = later.clone();
        s.on_key(move |_| {
            *sink.borrow_mut() += 1;
            false
        });
        s.feed(b"qa");
        assert_eq!(*later.borrow(), 1);
    }

    #[test]
    fn test_render_writes_frame() {
        let mut s = session();
        s.render().unwrap();
        let out = String::from_utf8(s.output().clone()).unwrap();
        assert!(out.starts_with("\x1b[1;1H"));
        assert!(out.ends_with("\x1b[J"));
        assert_eq!(s.screen().size(), (20, 4));

        s.resize(10, 2);
        s.output_mut().clear();
        s.render().unwrap();
        assert_eq!(s.screen().size(), (10, 2));
    }

    #[test]
    fn test_disable_idempotent() {
        let mut s = session();
        s.disable_mouse().unwrap();
        assert!(s.output().is_empty());
        s.enable_mouse().unwrap();
        s.output_mut().clear();
        s.disable_mouse().unwrap();
        s.disable_mouse().unwrap();
        assert_eq!(s.output().as_slice(), b"\x1b[?1006l\x1b[?1003l");
    }
}
