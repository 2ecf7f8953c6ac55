//! Mouse frame classification for per-candidate keypress handling.
//!
//! Some terminals hand a keypress handler one mouse report split into
//! several candidates (`ESC[<`, `0;10;5`, `M`). The classifier tells such a
//! handler which candidates belong to a mouse frame so they are not taken
//! for typed text.

/// Classification of one keypress candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// Part of a mouse frame.
    Inside,
    /// The SGR release terminator that ends a locked frame.
    End,
    /// An ordinary key.
    Key,
}

impl FrameClass {
    /// `+1`, `-1` or `0`.
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Inside => 1,
            Self::End => -1,
            Self::Key => 0,
        }
    }
}

const PREFIXES: [&str; 2] = ["\x1b[<", "\x1b[M"];

fn is_sgr_body(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b';' || b == b'M')
}

/// Classify `candidate`; `lock` is set while a frame is known to be open.
pub fn is_mouse_frame(candidate: &str, lock: bool) -> FrameClass {
    if PREFIXES.iter().any(|p| candidate.starts_with(p)) {
        return FrameClass::Inside;
    }
    if lock {
        if candidate == "m" {
            return FrameClass::End;
        }
        if is_sgr_body(candidate) {
            return FrameClass::Inside;
        }
    }
    FrameClass::Key
}

/// Keeps the frame lock across a stream of candidates.
///
/// The lock opens on an SGR prefix and closes on the `m` terminator, a
/// candidate ending in `M`, or an ordinary key.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameFilter {
    lock: bool,
}

impl FrameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.lock
    }

    /// Classify and update the lock.
    pub fn classify(&mut self, candidate: &str) -> FrameClass {
        let class = is_mouse_frame(candidate, self.lock);
        self.lock = match class {
            // X11 frames carry raw bytes, so only SGR frames stay open
            FrameClass::Inside => !candidate.starts_with("\x1b[M") && !candidate.ends_with('M'),
            FrameClass::End | FrameClass::Key => false,
        };
        class
    }

    /// `true` when the candidate should be swallowed.
    pub fn swallow(&mut self, candidate: &str) -> bool {
        self.classify(candidate) != FrameClass::Key
    }
}
