//! System clipboard through native APIs.

use nlsh_engine::{Clipboard, EngineError, Result};
use tracing::debug;

/// How long to keep clipboard ownership on Linux so a clipboard manager
/// can take the contents before the process exits.
#[cfg(target_os = "linux")]
const LINUX_HANDOFF: std::time::Duration = std::time::Duration::from_millis(250);

/// Copies commands with `arboard`. A new handle is opened per copy.
#[derive(Debug, Clone, Copy)]
pub struct SystemClipboard {
    enabled: bool,
}

impl SystemClipboard {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Clipboard for SystemClipboard {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn copy(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| EngineError::execution(format!("clipboard unavailable: {e}")))?;

        #[cfg(target_os = "linux")]
        let copied = {
            use arboard::SetExtLinux;
            clipboard
                .set()
                .wait_until(std::time::Instant::now() + LINUX_HANDOFF)
                .text(text)
        };
        #[cfg(not(target_os = "linux"))]
        let copied = clipboard.set_text(text);

        copied.map_err(|e| EngineError::execution(format!("clipboard copy failed: {e}")))?;
        debug!(len = text.len(), "Copied command to clipboard");
        Ok(())
    }
}
