use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(`{3,})[ \t]*([^`]*?)[ \t]*$").unwrap());

/// A backtick fence line: its run length and info string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceMarker<'a> {
    pub run: usize,
    pub info: &'a str,
}

impl<'a> FenceMarker<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = FENCE_RE.captures(line)?;
        let run = caps.get(1)?.as_str().len();
        let info = caps.get(2).map_or("", |m| m.as_str());
        Some(FenceMarker { run, info })
    }

    pub fn is_bare(&self) -> bool {
        self.info.is_empty()
    }

    /// Declared language: first token of the info string, "" when untagged.
    pub fn lang(&self) -> &'a str {
        self.info.split_whitespace().next().unwrap_or("")
    }
}

/// What a line did to the fence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceEvent<'a> {
    /// Outside any block, not a fence.
    Outside,
    /// Opened a top-level block.
    Opened(FenceMarker<'a>),
    /// Body line of the open block, possibly a nested marker.
    Inside,
    /// Closed the top-level block.
    Closed,
}

/// Line-by-line fence state shared by the section parser and the entry
/// decomposer.
///
/// The outermost frame is the block being captured. A bare marker at least
/// as long as the opening run ends the block at any depth. Inside it, a
/// tagged marker opens a nested frame and a shorter bare marker closes the
/// innermost nested frame when it is at least that frame's run, so a shorter
/// illustrative fence in the body never closes the block early.
#[derive(Debug, Clone, Default)]
pub struct FenceTracker {
    frames: Vec<usize>,
}

impl FenceTracker {
    pub fn is_open(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn observe<'a>(&mut self, line: &'a str) -> FenceEvent<'a> {
        let Some(marker) = FenceMarker::parse(line) else {
            return if self.is_open() {
                FenceEvent::Inside
            } else {
                FenceEvent::Outside
            };
        };

        let (Some(&outer), Some(&top)) = (self.frames.first(), self.frames.last()) else {
            self.frames.push(marker.run);
            return FenceEvent::Opened(marker);
        };

        if marker.is_bare() {
            if marker.run >= outer {
                self.frames.clear();
                return FenceEvent::Closed;
            }
            if self.frames.len() > 1 && marker.run >= top {
                self.frames.pop();
            }
        } else if self.frames.len() == 1 {
            self.frames.push(marker.run);
        }
        FenceEvent::Inside
    }
}

/// Shortest fence (at least three backticks) that no marker-like line in
/// `body` can close or outrun.
pub fn fence_for_body(body: &str) -> String {
    let longest = body
        .lines()
        .filter_map(FenceMarker::parse)
        .map(|m| m.run)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}
