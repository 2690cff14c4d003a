//! Operator console and input parsing.
//!
//! Parsing is split into pure `parse_*` functions and prompting loops that
//! re-read until a line validates. Malformed input is reported back to the
//! operator and never leaves this module; only a closed or broken console does.
use crate::error::ConsoleError;
use chrono::NaiveDateTime;
use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;
use thiserror::Error;

/// Date-time format accepted for registration periods.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const AFFIRMATIVE: [&str; 2] = ["y", "yes"];
const NEGATIVE: [&str; 2] = ["n", "no"];

/// Line-oriented operator console.
pub trait Console {
    /// Read one line without its trailing newline. A closed input stream is an
    /// error, not an empty line.
    fn read_line(&mut self) -> Result<String, ConsoleError>;

    fn write_str(&mut self, text: &str) -> Result<(), ConsoleError>;

    fn say(&mut self, line: &str) -> Result<(), ConsoleError> {
        self.write_str(line)?;
        self.write_str("\n")
    }
}

/// Console over any buffered reader and writer; `stdio()` for the terminal.
pub struct TerminalConsole<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalConsole<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn read_line(&mut self) -> Result<String, ConsoleError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn write_str(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }
}

/// Why a line of operator input was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("`{0}` is not a number")]
    NotANumber(String),

    #[error("{value} is out of range, choose between 0 and {max}")]
    OutOfRange { value: String, max: usize },

    #[error("range {lower}-{upper} is descending")]
    DescendingRange { lower: usize, upper: usize },

    #[error("`{0}` is neither a number nor a range like 2-5")]
    InvalidToken(String),

    #[error("`{0}` is not a positive number")]
    NotPositive(String),

    #[error("nothing selected")]
    EmptySelection,

    #[error("please answer yes or no")]
    UnknownAnswer,

    #[error("`{0}` does not match the format YYYY-MM-DD HH:MM")]
    InvalidDate(String),

    #[error("the end must not be before {0}")]
    EndBeforeStart(String),
}

fn range_token() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| Regex::new(r"^(\d+)-(\d+)$").expect("regex for range tokens"))
}

fn digit_token() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"^\d+$").expect("regex for digit tokens"))
}

fn bounded_index(raw: &str, len: usize) -> Result<usize, InputError> {
    let out_of_range = || InputError::OutOfRange {
        value: raw.to_string(),
        max: len.saturating_sub(1),
    };
    // Digit-only input that overflows is still a number, just a large one.
    let value: usize = raw.parse().map_err(|_| out_of_range())?;
    if value >= len {
        return Err(out_of_range());
    }
    Ok(value)
}

/// Parse a single zero-based index into a list of `len` candidates.
pub fn parse_index(line: &str, len: usize) -> Result<usize, InputError> {
    let token = line.trim();
    if !digit_token().is_match(token) {
        return Err(InputError::NotANumber(token.to_string()));
    }
    bounded_index(token, len)
}

/// Parse a comma separated list of indices and `lower-upper` ranges.
///
/// The line is accepted only if every token validates. The result is sorted
/// and free of duplicates.
pub fn parse_selection(line: &str, len: usize) -> Result<Vec<usize>, InputError> {
    if line.trim().is_empty() {
        return Err(InputError::EmptySelection);
    }
    let mut indices = Vec::new();
    for token in line.split(',').map(str::trim) {
        if digit_token().is_match(token) {
            indices.push(bounded_index(token, len)?);
        } else if let Some(caps) = range_token().captures(token) {
            let lower = bounded_index(&caps[1], len)?;
            let upper = bounded_index(&caps[2], len)?;
            if lower > upper {
                return Err(InputError::DescendingRange { lower, upper });
            }
            indices.extend(lower..=upper);
        } else {
            return Err(InputError::InvalidToken(token.to_string()));
        }
    }
    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

pub fn parse_yes_no(line: &str) -> Result<bool, InputError> {
    let answer = line.trim().to_lowercase();
    if AFFIRMATIVE.contains(&answer.as_str()) {
        Ok(true)
    } else if NEGATIVE.contains(&answer.as_str()) {
        Ok(false)
    } else {
        Err(InputError::UnknownAnswer)
    }
}

pub fn parse_date_time(line: &str) -> Result<NaiveDateTime, InputError> {
    let raw = line.trim();
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map_err(|_| InputError::InvalidDate(raw.to_string()))
}

pub fn parse_positive_number(line: &str) -> Result<u32, InputError> {
    let raw = line.trim();
    if !digit_token().is_match(raw) {
        return Err(InputError::NotANumber(raw.to_string()));
    }
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(InputError::NotPositive(raw.to_string())),
    }
}

fn prompt_until<T>(
    console: &mut dyn Console,
    prompt: &str,
    parse: impl Fn(&str) -> Result<T, InputError>,
) -> Result<T, ConsoleError> {
    loop {
        console.write_str(prompt)?;
        let line = console.read_line()?;
        match parse(&line) {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::debug!(input = %line, error = %err, "rejected operator input");
                console.say(&format!("Invalid input: {err}"))?;
            }
        }
    }
}

/// Ask for one index in `0..len`. `len` must be non-zero.
pub fn single_choice(
    console: &mut dyn Console,
    prompt: &str,
    len: usize,
) -> Result<usize, ConsoleError> {
    prompt_until(console, prompt, |line| parse_index(line, len))
}

/// Ask for a non-empty selection of indices in `0..len`.
pub fn multi_choice(
    console: &mut dyn Console,
    prompt: &str,
    len: usize,
) -> Result<Vec<usize>, ConsoleError> {
    prompt_until(console, prompt, |line| parse_selection(line, len))
}

pub fn yes_no(console: &mut dyn Console, question: &str) -> Result<bool, ConsoleError> {
    prompt_until(console, &format!("{question} [y/n]: "), parse_yes_no)
}

pub fn positive_number(console: &mut dyn Console, prompt: &str) -> Result<u32, ConsoleError> {
    prompt_until(console, prompt, parse_positive_number)
}

/// Ask for a start and end date-time, re-prompting each field separately.
pub fn date_range(
    console: &mut dyn Console,
) -> Result<(NaiveDateTime, NaiveDateTime), ConsoleError> {
    let start = prompt_until(console, "Start (YYYY-MM-DD HH:MM): ", parse_date_time)?;
    let end = prompt_until(console, "End (YYYY-MM-DD HH:MM): ", |line| {
        let end = parse_date_time(line)?;
        if end < start {
            return Err(InputError::EndBeforeStart(
                start.format(DATE_TIME_FORMAT).to_string(),
            ));
        }
        Ok(end)
    })?;
    Ok((start, end))
}
