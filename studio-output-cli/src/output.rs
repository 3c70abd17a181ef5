// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{
    Args, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use owo_colors::{OwoColorize, Style, style};
use std::{
    fmt,
    io::{self, BufWriter, Write},
};
use studio_output::{classify::LineType, test_events::TestStatus};
use supports_color::Stream;
use tracing::{Event, Level, Subscriber, level_filters::LevelFilter, warn};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log events with this target are printed without a level heading.
pub(crate) const NO_HEADING_TARGET: &str = "studio_output_cli::no_heading";

/// Log filter directives, e.g. `debug` or `studio_output=trace`.
const LOG_ENV: &str = "STUDIO_OUTPUT_LOG";

pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Green.on_default())
    .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
    .valid(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .invalid(AnsiColor::Red.on_default().effects(Effects::BOLD));

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "STUDIO_OUTPUT_COLOR"
    )]
    pub(crate) color: Color,
}

impl OutputOpts {
    pub(crate) fn init(self) -> OutputContext {
        init_logging(Palette::for_stream(self.color, Stream::Stderr));
        OutputContext { color: self.color }
    }
}

/// Output settings shared by every command.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    color: Color,
}

impl OutputContext {
    /// Returns the palette for messages written to stderr.
    pub fn stderr_palette(&self) -> Palette {
        Palette::for_stream(self.color, Stream::Stderr)
    }

    pub(crate) fn stdout_palette(&self) -> Palette {
        Palette::for_stream(self.color, Stream::Stdout)
    }

    /// Returns true if escape sequences from the input may reach stdout
    /// unchanged.
    pub(crate) fn passthrough_escapes(&self) -> bool {
        self.color.should_colorize(Stream::Stdout)
    }
}

/// When to produce color output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    /// Color if the stream is a terminal that supports it.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

impl Color {
    fn should_colorize(self, stream: Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

/// The styles used for everything the CLI prints: log headings, line-type
/// badges and test summaries. Uncolored output uses the default (empty)
/// palette.
#[derive(Copy, Clone, Debug, Default)]
pub struct Palette {
    pub(crate) error: Style,
    pub(crate) warning: Style,
    pub(crate) info: Style,
    pub(crate) success: Style,
    pub(crate) emphasis: Style,
    pub(crate) dimmed: Style,
}

impl Palette {
    fn for_stream(color: Color, stream: Stream) -> Self {
        if !color.should_colorize(stream) {
            return Self::default();
        }
        Self {
            error: style().red().bold(),
            warning: style().yellow().bold(),
            info: style().cyan().bold(),
            success: style().green().bold(),
            emphasis: style().bold(),
            dimmed: style().dimmed(),
        }
    }

    pub(crate) fn line_type(&self, line_type: LineType) -> Style {
        match line_type {
            LineType::Error => self.error,
            LineType::Warning => self.warning,
            LineType::Info => self.info,
            LineType::Success => self.success,
            LineType::Plain => self.emphasis,
        }
    }

    /// The label and style a test is listed with in the summary.
    pub(crate) fn test_status(&self, status: TestStatus) -> (&'static str, Style) {
        match status {
            TestStatus::Passed => ("PASS", self.success),
            TestStatus::Failed => ("FAIL", self.error),
            TestStatus::Ignored => ("SKIP", self.warning),
            TestStatus::Pending | TestStatus::Running => ("RUNNING", self.emphasis),
        }
    }

    fn log_level(&self, level: Level) -> (&'static str, Style) {
        match level {
            Level::ERROR => ("error", self.error),
            Level::WARN => ("warning", self.warning),
            Level::INFO => ("info", self.info),
            Level::DEBUG => ("debug", self.emphasis),
            Level::TRACE => ("trace", self.dimmed),
        }
    }
}

/// Prints events as `<level>: <message>`, like cargo does.
struct LogFormatter {
    palette: Palette,
}

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != NO_HEADING_TARGET {
            let (heading, style) = self.palette.log_level(*metadata.level());
            write!(writer, "{}: ", heading.style(style))?;
        }
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the stderr log subscriber. Later calls in the same process are
/// no-ops.
fn init_logging(palette: Palette) {
    let default_targets = || Targets::new().with_default(LevelFilter::INFO);
    let (targets, parse_error) = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.is_empty() => match directives.parse::<Targets>() {
            Ok(targets) => (targets, None),
            Err(error) => (default_targets(), Some(error)),
        },
        _ => (default_targets(), None),
    };

    let layer = tracing_subscriber::fmt::layer()
        .event_format(LogFormatter { palette })
        .with_writer(io::stderr)
        .with_filter(targets);

    if tracing_subscriber::registry().with(layer).try_init().is_ok()
        && let Some(error) = parse_error
    {
        warn!("ignoring invalid {LOG_ENV}: {error}");
    }
}

/// Where command output is written. Tests capture it in memory.
#[derive(Default)]
pub enum OutputWriter {
    /// The process's stdout and stderr.
    #[default]
    Terminal,
    /// In-memory buffers.
    #[cfg(test)]
    Captured {
        /// Everything written to stdout.
        stdout: Vec<u8>,
        /// Everything written to stderr.
        stderr: Vec<u8>,
    },
}

impl OutputWriter {
    pub(crate) fn stdout(&mut self) -> Box<dyn Write + '_> {
        match self {
            Self::Terminal => Box::new(BufWriter::new(io::stdout())),
            #[cfg(test)]
            Self::Captured { stdout, .. } => Box::new(stdout),
        }
    }

    pub(crate) fn stderr(&mut self) -> Box<dyn Write + '_> {
        match self {
            Self::Terminal => Box::new(io::stderr()),
            #[cfg(test)]
            Self::Captured { stderr, .. } => Box::new(stderr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncolored_palette_is_plain() {
        let palette = Palette::for_stream(Color::Never, Stream::Stdout);
        for line_type in LineType::ALL {
            assert_eq!(
                line_type.style(palette.line_type(line_type)).to_string(),
                line_type.as_str()
            );
        }
        let (label, style) = palette.test_status(TestStatus::Failed);
        assert_eq!(label.style(style).to_string(), "FAIL");
    }

    #[test]
    fn colored_palette_shares_styles() {
        let palette = Palette::for_stream(Color::Always, Stream::Stdout);
        let error_badge = "x".style(palette.line_type(LineType::Error)).to_string();
        let (_, fail_style) = palette.test_status(TestStatus::Failed);
        assert_eq!("x".style(fail_style).to_string(), error_badge);
        assert_ne!(error_badge, "x");
    }
}
