//! Logical line reconstruction from raw terminal input
//!
//! Tracks what the user has typed since the last submitted or abandoned line,
//! mirroring backspace edits and skipping over escape sequences.

pub const ESC: u8 = 0x1b;
pub const BACKSPACE: u8 = 0x08;
pub const DELETE: u8 = 0x7f;
pub const CARRIAGE_RETURN: u8 = b'\r';
pub const LINE_FEED: u8 = b'\n';

/// Lowest byte value treated as printable text
const PRINTABLE_THRESHOLD: u8 = 0x20;

/// How a single input byte is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Starts an escape sequence
    EscapeIntroducer,
    /// Inside an escape sequence; `last` is set on the byte that ends it
    EscapeBody { last: bool },
    Backspace,
    /// Abandons the current line (Ctrl-C, Ctrl-U, ...)
    Control,
    LineTerminator,
    Printable,
}

impl ByteClass {
    /// C0 control bytes are never part of an escape sequence; a terminal acts on
    /// them immediately, so they end the sequence and are classified as usual.
    pub fn classify(byte: u8, in_escape: bool) -> Self {
        if in_escape && byte >= PRINTABLE_THRESHOLD {
            return ByteClass::EscapeBody {
                last: byte.is_ascii_alphabetic() || byte == b'~',
            };
        }
        match byte {
            ESC => ByteClass::EscapeIntroducer,
            BACKSPACE | DELETE => ByteClass::Backspace,
            CARRIAGE_RETURN | LINE_FEED => ByteClass::LineTerminator,
            b if b < PRINTABLE_THRESHOLD => ByteClass::Control,
            _ => ByteClass::Printable,
        }
    }
}

/// What the caller should do with a byte after it has been fed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write the byte through now; the line is unchanged
    Forward,
    /// Write the byte through now; the line was edited
    Edit,
    /// A line terminator arrived; the trimmed line it submits is attached
    ///
    /// The line stays buffered until [`LineReconstructor::clear`], since a held
    /// terminator leaves the text sitting at the shell prompt.
    Submit(String),
}

/// Per-session line state
#[derive(Debug)]
pub struct LineReconstructor {
    buffer: Vec<u8>,
    in_escape: bool,
    capacity: usize,
}

impl LineReconstructor {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::new(),
            in_escape: false,
            capacity,
        }
    }

    /// Feed one byte and update the line buffer
    pub fn feed(&mut self, byte: u8) -> Step {
        let class = ByteClass::classify(byte, self.in_escape);
        if !matches!(class, ByteClass::EscapeBody { .. }) {
            self.in_escape = false;
        }

        match class {
            ByteClass::EscapeIntroducer => {
                self.in_escape = true;
                Step::Forward
            }
            ByteClass::EscapeBody { last } => {
                self.in_escape = !last;
                Step::Forward
            }
            ByteClass::Backspace => {
                self.pop_char();
                Step::Edit
            }
            ByteClass::Control => {
                self.buffer.clear();
                Step::Edit
            }
            ByteClass::LineTerminator => {
                Step::Submit(String::from_utf8_lossy(&self.buffer).trim().to_string())
            }
            ByteClass::Printable => {
                if self.buffer.len() < self.capacity {
                    self.buffer.push(byte);
                }
                Step::Edit
            }
        }
    }

    /// Remove the last character, including all bytes of a multi-byte UTF-8 character
    fn pop_char(&mut self) {
        while let Some(b) = self.buffer.pop() {
            if b & 0xC0 != 0x80 {
                break;
            }
        }
    }

    /// Forget the current line once the shell has consumed or discarded it
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
