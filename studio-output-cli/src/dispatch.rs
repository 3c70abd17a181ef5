// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result, StudioExitCode},
    output::{OutputContext, OutputOpts, OutputWriter, Palette},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::{
    borrow::Cow,
    fs::File,
    io::{self, Read, Write},
};
use studio_output::{
    classify::LineType,
    config::{ConfigLocation, OutputConfig},
    line_buffer::LineBuffer,
    test_events::{TestSuiteResult, format_duration, parse_line},
    view::{LineTypeFilter, ParsedLine, TypeCounts, count_by_type, filter_and_search},
};
use tracing::{debug, warn};

/// Interprets build and test output.
///
/// Reads the output of a compiler or test runner from a file or standard
/// input, and prints a classified view of it or a summary of the test run.
#[derive(Debug, Parser)]
#[command(
    version,
    name = "studio-output",
    styles = crate::output::CLAP_STYLES,
    max_term_width = 100,
)]
pub struct StudioOutputApp {
    #[clap(flatten)]
    output: OutputOpts,

    /// Config file to use [default: ~/.config/studio-output/config.toml]
    ///
    /// Pass `none` to skip loading a config file.
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "STUDIO_OUTPUT_CONFIG_FILE"
    )]
    config_file: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

impl StudioOutputApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = OutputConfig::load(ConfigLocation::from_cli_or_env(
            self.config_file.as_deref(),
        ))?;
        debug!("resolved config: {config:?}");

        match self.command {
            Command::Log(opts) => opts.exec(&config, output, output_writer),
            Command::Tests(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print classified lines, optionally filtered by type and search text
    Log(LogOpts),
    /// Summarize the results of a test run
    Tests(TestsOpts),
}

/// The size of each read from the input.
const CHUNK_SIZE: usize = 4096;

#[derive(Debug, Args)]
struct InputOpts {
    /// File to read; standard input if omitted or `-`
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,
}

impl InputOpts {
    fn path(&self) -> Option<&Utf8Path> {
        self.input.as_deref().filter(|path| path.as_str() != "-")
    }

    /// Calls `f` with every line of the input, in order.
    fn for_each_line(&self, mut f: impl FnMut(String)) -> Result<()> {
        let path = self.path();
        let read_error = |err| ExpectedError::read_input(path.map(ToOwned::to_owned), err);

        match path {
            Some(path) => {
                let mut file = File::open(path).map_err(read_error)?;
                read_lines(&mut file, &mut f).map_err(read_error)
            }
            None => read_lines(&mut io::stdin().lock(), &mut f).map_err(read_error),
        }
    }
}

fn read_lines(reader: &mut dyn Read, f: &mut dyn FnMut(String)) -> io::Result<()> {
    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        for line in buffer.push_bytes(&chunk[..n]) {
            f(line);
        }
    }

    if let Some(line) = buffer.finish() {
        f(line);
    }
    Ok(())
}

#[derive(Debug, Args)]
struct LogOpts {
    #[clap(flatten)]
    input: InputOpts,

    /// Show only these line types (comma-separated) [possible values: error,
    /// warning, info, success, plain]
    #[arg(long, value_delimiter = ',', value_name = "TYPES")]
    show: Vec<LineType>,

    /// Hide these line types (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "TYPES")]
    hide: Vec<LineType>,

    /// Show only lines containing this text (case-insensitive)
    #[arg(long, value_name = "QUERY", default_value = "")]
    search: String,

    /// Prefix each line with its line number
    #[arg(long)]
    line_numbers: bool,

    /// Print the number of lines of each type to stderr
    #[arg(long)]
    counts: bool,
}

impl LogOpts {
    /// `--show` replaces the configured types, and `--hide` is applied last.
    fn filter(&self, config: &OutputConfig) -> LineTypeFilter {
        let mut filter = if self.show.is_empty() {
            config.show
        } else {
            LineTypeFilter::NONE
        };
        for &line_type in &self.show {
            filter.set(line_type, true);
        }
        for &line_type in &self.hide {
            filter.set(line_type, false);
        }
        filter
    }

    fn exec(
        self,
        config: &OutputConfig,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let mut log = config.new_output_log();
        self.input.for_each_line(|line| log.push_line(line))?;

        if log.dropped_lines() > 0 {
            warn!(
                "dropped {} earlier lines (max-retained-lines is {})",
                log.dropped_lines(),
                log.max_retained_lines(),
            );
        }

        let lines = log.parsed_lines();
        let filter = self.filter(config);
        let view = filter_and_search(&lines, &filter, &self.search);
        debug!("showing {} of {} lines", view.len(), lines.len());

        let mut stdout = output_writer.stdout();
        self.write_view(&view, output, &mut stdout)
            .and_then(|()| stdout.flush())
            .map_err(ExpectedError::write_output)?;
        drop(stdout);

        if self.counts {
            let mut stderr = output_writer.stderr();
            write_counts(&count_by_type(&lines), &output.stderr_palette(), &mut stderr)
                .and_then(|()| stderr.flush())
                .map_err(ExpectedError::write_output)?;
        }

        Ok(StudioExitCode::OK)
    }

    fn write_view(
        &self,
        view: &[ParsedLine],
        output: OutputContext,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let palette = output.stdout_palette();
        let passthrough = output.passthrough_escapes();
        let width = view
            .last()
            .map_or(1, |line| line.line_number.to_string().len());

        for line in view {
            if self.line_numbers {
                write!(
                    writer,
                    "{} ",
                    format_args!("{:>width$}", line.line_number).style(palette.dimmed)
                )?;
            }
            // Uncolored output also drops escapes that aren't CSI sequences,
            // such as hyperlinks and window titles.
            let text = if passthrough {
                Cow::Borrowed(line.raw_content.as_str())
            } else if line.content.contains('\x1b') {
                Cow::Owned(strip_ansi_escapes::strip_str(&line.content))
            } else {
                Cow::Borrowed(line.content.as_str())
            };
            writeln!(writer, "{text}")?;
        }
        Ok(())
    }
}

fn write_counts(
    counts: &TypeCounts,
    palette: &Palette,
    writer: &mut dyn Write,
) -> io::Result<()> {
    for line_type in LineType::ALL {
        write!(
            writer,
            "{}: {}  ",
            line_type.style(palette.line_type(line_type)),
            counts.get(line_type),
        )?;
    }
    writeln!(writer, "{}: {}", "total".style(palette.emphasis), counts.total)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// A human-readable summary
    #[default]
    Human,
    /// The final snapshot as JSON
    Json,
}

#[derive(Debug, Args)]
struct TestsOpts {
    #[clap(flatten)]
    input: InputOpts,

    /// Output format for the summary
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,
}

impl TestsOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let mut state = TestSuiteResult::new();
        self.input.for_each_line(|line| state = parse_line(&state, &line))?;
        debug!(
            "parsed {} tests, suite status {:?}",
            state.tests().len(),
            state.status
        );

        let mut stdout = output_writer.stdout();
        match self.message_format {
            MessageFormat::Human => {
                write_human_summary(&state, &output.stdout_palette(), &mut stdout)
                    .map_err(ExpectedError::write_output)?;
            }
            MessageFormat::Json => {
                serde_json::to_writer_pretty(&mut stdout, &state)
                    .map_err(|err| ExpectedError::SerializeError { err })?;
                writeln!(stdout).map_err(ExpectedError::write_output)?;
            }
        }
        stdout.flush().map_err(ExpectedError::write_output)?;

        Ok(suite_exit_code(&state))
    }
}

fn suite_exit_code(state: &TestSuiteResult) -> i32 {
    if state.failed > 0 {
        StudioExitCode::TEST_RUN_FAILED
    } else if !state.is_completed() {
        StudioExitCode::NO_COMPLETION
    } else {
        StudioExitCode::OK
    }
}

fn write_human_summary(
    state: &TestSuiteResult,
    palette: &Palette,
    writer: &mut dyn Write,
) -> io::Result<()> {
    for result in state.tests().values() {
        let (label, style) = palette.test_status(result.status);
        writeln!(
            writer,
            "{:>8} [{:>7}] {}",
            label.style(style),
            format_duration(result.duration),
            result.name,
        )?;
    }

    for result in state.failed_tests() {
        if let Some(message) = &result.message {
            writeln!(writer)?;
            writeln!(writer, "--- {}: {} ---", "FAIL".style(palette.error), result.name)?;
            writeln!(writer, "{}", message.trim_end())?;
        }
    }

    writeln!(writer, "------------")?;
    let tests_word = if state.total_tests == 1 { "test" } else { "tests" };
    write!(
        writer,
        "{:>8} [{:>7}] {} {tests_word} run: {} passed, {} failed, {} ignored",
        "Summary",
        format_duration(state.duration),
        state.total_tests.style(palette.emphasis),
        state.passed.style(palette.success),
        state.failed.style(palette.error),
        state.ignored.style(palette.warning),
    )?;
    if !state.is_completed() {
        write!(writer, " (incomplete)")?;
    }
    writeln!(writer)
}
