//! Copy text to the system clipboard through the terminal (OSC 52).

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

/// Build the OSC 52 escape sequence that sets the clipboard to `text`.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", BASE64.encode(text.as_bytes()))
}

/// Write the clipboard sequence to `out`.
pub fn copy_to<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

/// Copy to the clipboard via stdout. Failures are logged and reported as
/// `false`; callers treat them as non-fatal.
pub fn copy(text: &str) -> bool {
    match copy_to(&mut io::stdout(), text) {
        Ok(()) => {
            debug!(chars = text.chars().count(), "clipboard_copied");
            true
        }
        Err(e) => {
            warn!(error = %e, "clipboard_copy_failed");
            false
        }
    }
}
