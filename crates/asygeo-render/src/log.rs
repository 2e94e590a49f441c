//! Diagnostic log returned alongside renders and errors
//!
//! Everything the renderer prints is kept and handed back to the caller, so
//! an agent can see Asymptote's own compiler messages when its code is wrong.

/// Where a log entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// Renderer standard output
    Stdout,
    /// Renderer standard error
    Stderr,
    /// Non-zero exit status of the renderer
    ExitCode,
    /// Failure to start or supervise the process
    Process,
    /// Failure inside this server
    Server,
}

impl LogSource {
    fn tag(self) -> &'static str {
        match self {
            LogSource::Stdout => "ASY STDOUT",
            LogSource::Stderr => "ASY STDERR",
            LogSource::ExitCode => "ASY EXIT CODE",
            LogSource::Process => "PROCESS ERROR",
            LogSource::Server => "SERVER ERROR",
        }
    }
}

/// Tagged text accumulated during one render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderLog {
    text: String,
}

impl RenderLog {
    /// Append a tagged entry, terminated by a newline
    pub fn push(&mut self, source: LogSource, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.text.push_str(&format!("[{}]: {}", source.tag(), message));
        if !message.ends_with('\n') {
            self.text.push('\n');
        }
    }

    /// Append captured process output; empty output adds nothing
    pub fn push_output(&mut self, source: LogSource, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.push(source, String::from_utf8_lossy(bytes));
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Log text with surrounding whitespace removed
    pub fn as_str(&self) -> &str {
        self.text.trim()
    }
}

impl std::fmt::Display for RenderLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
