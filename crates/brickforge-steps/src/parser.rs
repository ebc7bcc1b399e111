//! Step parser for LDraw-style build descriptions
//!
//! Splits a model file into ordered assembly steps. Only two kinds of lines
//! matter: step markers (`0 STEP`, `0 ROTSTEP ...`) close the current step and
//! part placements (line type `1`) are collected verbatim. Everything else is
//! ignored. Unreadable input produces no steps so the caller can fall back to
//! synthesized steps.

use brickforge_core::{PartReference, Step};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Leading token of a part-placement line
pub const PART_LINE_TOKEN: &str = "1";
/// Leading token of a comment or meta-command line
pub const META_LINE_TOKEN: &str = "0";

const STEP_COMMANDS: [&str; 2] = ["STEP", "ROTSTEP"];
const FILE_COMMAND: &str = "FILE";

/// How a single source line affects step parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Closes the current step
    StepMarker,
    /// A placed part
    Part,
    /// Start of an embedded file in a multi-part document
    EmbeddedFile,
    /// Comments, headers, geometry primitives and anything else
    Ignored,
}

/// Classify a line by its leading token
pub fn classify_line(line: &str) -> LineKind {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some(PART_LINE_TOKEN) => LineKind::Part,
        Some(META_LINE_TOKEN) => match tokens.next() {
            Some(command) if STEP_COMMANDS.iter().any(|c| command.eq_ignore_ascii_case(c)) => {
                LineKind::StepMarker
            }
            Some(command) if command.eq_ignore_ascii_case(FILE_COMMAND) => LineKind::EmbeddedFile,
            _ => LineKind::Ignored,
        },
        _ => LineKind::Ignored,
    }
}

/// Incremental step parser
///
/// Feed lines in source order, then call [`StepParser::finish`].
#[derive(Debug, Default)]
pub struct StepParser {
    steps: Vec<Step>,
    buffer: Vec<PartReference>,
    files_seen: usize,
    closed: bool,
}

impl StepParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one line (without its line ending)
    pub fn feed_line(&mut self, line: &str) {
        if self.closed || line.trim().is_empty() {
            return;
        }

        match classify_line(line) {
            LineKind::StepMarker => self.flush(),
            LineKind::Part => self.buffer.push(PartReference::new(line)),
            LineKind::EmbeddedFile => {
                // The first embedded file is the main model; the next one ends it.
                self.files_seen += 1;
                if self.files_seen > 1 {
                    self.flush();
                    self.closed = true;
                }
            }
            LineKind::Ignored => {}
        }
    }

    /// Number of completed steps so far
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Flush any trailing parts and return the steps
    pub fn finish(mut self) -> Vec<Step> {
        self.flush();
        self.steps
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let number = self.steps.len() + 1;
        let references = std::mem::take(&mut self.buffer);
        self.steps.push(Step::new(number, references));
    }
}

/// Parse the full text of a model description into steps
pub fn parse_steps(text: &str) -> Vec<Step> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut parser = StepParser::new();
    for line in text.lines() {
        parser.feed_line(line);
    }
    let steps = parser.finish();
    debug!(
        "Parsed {} steps with {} part references",
        steps.len(),
        steps.iter().map(Step::part_count).sum::<usize>()
    );
    steps
}

/// Read and parse a model file
///
/// Read failures and invalid UTF-8 are logged and yield an empty sequence.
pub fn read_steps(path: &Path) -> Vec<Step> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read steps from {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => parse_steps(&text),
        Err(e) => {
            warn!("Step source {} is not valid UTF-8: {}", path.display(), e);
            Vec::new()
        }
    }
}
