//! Centralized shell output and progress management.
//!
//! The Shell module provides a unified API for all CLI output:
//! - Status messages with consistent formatting
//! - Colored fragments for task previews
//! - Per-task spinners (via indicatif) through [`Reporter`]
//!
//! Commands never manage spacing or colors directly; the shell decides
//! based on verbosity and whether stderr is a terminal.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + spinners
    #[default]
    Normal,
    /// --verbose: immediate status lines, debug info, no spinners
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Finished,
    Removed,
    Built,

    // In-progress statuses (cyan)
    Building,
    Checking,
    Cleaning,

    // Warning status (yellow)
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Removed => "Removed",
            Status::Built => "Built",
            Status::Building => "Building",
            Status::Checking => "Checking",
            Status::Cleaning => "Cleaning",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Removed | Status::Built => "\x1b[1;32m",
            Status::Building | Status::Checking | Status::Cleaning => "\x1b[1;36m",
            Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Colors for inline fragments of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Green,
    Cyan,
    Gray,
}

impl Paint {
    fn code(&self) -> &'static str {
        match self {
            Paint::Green => "\x1b[32m",
            Paint::Cyan => "\x1b[36m",
            Paint::Gray => "\x1b[90m",
        }
    }
}

/// Width status labels are right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a new shell.
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    /// A shell that prints nothing but errors, without colors.
    pub fn quiet() -> Self {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode, only errors are printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }

        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    /// Print a multi-line block as-is (suppressed in quiet mode).
    pub fn print_block(&self, lines: &[String]) {
        if self.is_quiet() {
            return;
        }
        eprintln!("{}", lines.join("\n"));
    }

    /// Wrap `text` in a color when colors are enabled.
    pub fn paint(&self, paint: Paint, text: impl Display) -> String {
        if self.use_color {
            format!("{}{}\x1b[0m", paint.code(), text)
        } else {
            text.to_string()
        }
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// Create a progress reporter for one task.
    pub fn reporter(self: &Arc<Self>) -> Reporter {
        Reporter::new(Arc::clone(self))
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Progress indicator handed to a task handler for the lifetime of one task.
///
/// Shows a spinner in normal mode; falls back to plain status lines when
/// verbose, and stays silent when quiet.
pub struct Reporter {
    shell: Arc<Shell>,
    pb: ProgressBar,
    start: Instant,
}

impl Reporter {
    fn new(shell: Arc<Shell>) -> Self {
        Reporter {
            shell,
            pb: ProgressBar::hidden(),
            start: Instant::now(),
        }
    }

    /// The shell this reporter writes to.
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Start the spinner with `msg`.
    pub fn start(&self, msg: impl Display) {
        let msg = msg.to_string();

        if self.shell.is_verbose() {
            self.shell.status(Status::Building, &msg);
            return;
        }

        if self.shell.is_quiet() || !io::stderr().is_terminal() {
            return;
        }

        self.pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            self.pb.set_style(style);
        }
        self.pb.set_message(msg);
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    /// Stop the spinner and print a success line with the elapsed time.
    pub fn succeed(&self, msg: impl Display) {
        self.pb.finish_and_clear();
        self.shell.status(
            Status::Built,
            format!("{} in {}", msg, format_duration(self.start.elapsed())),
        );
    }

    /// Stop the spinner and print a failure line.
    pub fn fail(&self, msg: impl Display) {
        self.pb.finish_and_clear();
        self.shell.error(msg);
    }
}

/// Format a duration in a human-readable way.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
