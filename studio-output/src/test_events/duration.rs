// Copyright (c) The studio-output Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display helpers for test durations.

use std::fmt;

/// Displays an optional test duration in seconds.
///
/// * absent: nothing
/// * under a millisecond: `<1ms`
/// * under a second: whole milliseconds, e.g. `12ms`
/// * otherwise: seconds with two decimal places, e.g. `1.50s`
#[derive(Copy, Clone, Debug)]
pub struct DisplayTestDuration(pub Option<f64>);

impl fmt::Display for DisplayTestDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => Ok(()),
            Some(secs) if secs < 0.001 => f.write_str("<1ms"),
            Some(secs) if secs < 1.0 => write!(f, "{}ms", (secs * 1000.0).round()),
            Some(secs) => write!(f, "{secs:.2}s"),
        }
    }
}

/// Formats an optional test duration in seconds. See [`DisplayTestDuration`].
pub fn format_duration(seconds: Option<f64>) -> String {
    DisplayTestDuration(seconds).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, "" ; "absent")]
    #[test_case(Some(0.0), "<1ms" ; "zero")]
    #[test_case(Some(0.0009), "<1ms" ; "sub millisecond")]
    #[test_case(Some(0.001), "1ms" ; "one millisecond")]
    #[test_case(Some(0.0126), "13ms" ; "rounds to nearest")]
    #[test_case(Some(0.25), "250ms" ; "milliseconds")]
    #[test_case(Some(0.9994), "999ms" ; "just under a second")]
    #[test_case(Some(1.0), "1.00s" ; "one second")]
    #[test_case(Some(12.346), "12.35s" ; "seconds")]
    fn display_duration(seconds: Option<f64>, expected: &str) {
        assert_eq!(format_duration(seconds), expected);
    }
}
