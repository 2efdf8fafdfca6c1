//! Incremental extraction of a fenced HTML block from streamed markdown.
//!
//! Models answer with prose around a single ```` ```html ```` code block.
//! The [`HtmlBlockExtractor`] consumes the response fragment by fragment
//! and hands back only the interior of the first such block, as early as
//! it safely can, so the browser can start rendering before the model is
//! finished.
//!
//! ## State machine
//!
//! ```text
//! AwaitingFence ──"```html"──▶ InsideBlock ──"```"──▶ Done
//!       │                          │
//!       └──── finish() ────────────┴──────────────────▶ Done
//! ```
//!
//! ## Hold-back policy
//!
//! Inside the block, everything except a trailing run of backticks is
//! emitted immediately. That run (at most two characters, since three would
//! already be a closing fence) is held until the next fragment shows whether
//! it starts a fence. Partial fences therefore never leak into the output,
//! however the upstream chunks the text.

use tracing::trace;

/// Marker that opens the block. Everything up to and including it is dropped.
const OPEN_FENCE: &str = "```html";

/// Marker that closes the block.
const CLOSE_FENCE: &str = "```";

/// Where the extractor is in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorState {
    /// No opening fence seen yet; input is discarded.
    AwaitingFence,
    /// Between the fences; input is forwarded.
    InsideBlock,
    /// Extraction finished; further input is ignored.
    Done,
}

/// How a finished extraction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The closing fence was found.
    Complete,
    /// The block opened but the stream ended before it closed.
    /// Buffered content was flushed as best-effort output.
    Unterminated,
    /// The stream ended without an opening fence. Nothing was emitted.
    NoBlock,
}

impl ExtractionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Unterminated => "unterminated",
            Self::NoBlock => "no_block",
        }
    }
}

/// Streaming extractor for the first ```` ```html ```` block.
///
/// Purely synchronous: one instance per response stream, fed by a single
/// owner. Identical fragment sequences always produce identical output.
#[derive(Debug)]
pub struct HtmlBlockExtractor {
    state: ExtractorState,
    buffer: String,
    block_started: bool,
    outcome: Option<ExtractionOutcome>,
}

impl Default for HtmlBlockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlBlockExtractor {
    pub fn new() -> Self {
        Self {
            state: ExtractorState::AwaitingFence,
            buffer: String::new(),
            block_started: false,
            outcome: None,
        }
    }

    /// Feed the next fragment. Returns block content that is safe to emit.
    pub fn push(&mut self, fragment: &str) -> Option<String> {
        match self.state {
            ExtractorState::Done => None,
            ExtractorState::AwaitingFence => {
                self.buffer.push_str(fragment);
                match self.buffer.find(OPEN_FENCE) {
                    Some(idx) => {
                        self.buffer.drain(..idx + OPEN_FENCE.len());
                        self.state = ExtractorState::InsideBlock;
                        self.block_started = true;
                        trace!("Opening fence found");
                        self.drain_block()
                    }
                    None => {
                        // Only a suffix shorter than the marker can still
                        // complete a match once more text arrives.
                        retain_tail(&mut self.buffer, OPEN_FENCE.len() - 1);
                        None
                    }
                }
            }
            ExtractorState::InsideBlock => {
                self.buffer.push_str(fragment);
                self.drain_block()
            }
        }
    }

    /// Signal that the upstream ended normally.
    ///
    /// Inside an unterminated block the remaining buffer, held-back
    /// backticks included, is returned as best-effort output. Before the
    /// opening fence nothing is returned.
    pub fn finish(&mut self) -> Option<String> {
        match self.state {
            ExtractorState::Done => None,
            ExtractorState::AwaitingFence => {
                self.buffer.clear();
                self.close(ExtractionOutcome::NoBlock);
                None
            }
            ExtractorState::InsideBlock => {
                let rest = std::mem::take(&mut self.buffer);
                self.close(ExtractionOutcome::Unterminated);
                non_empty(rest)
            }
        }
    }

    pub fn state(&self) -> ExtractorState {
        self.state
    }

    /// Whether the opening fence has ever been seen. Never resets.
    pub fn block_started(&self) -> bool {
        self.block_started
    }

    pub fn is_done(&self) -> bool {
        self.state == ExtractorState::Done
    }

    /// The outcome, once the extractor is done.
    pub fn outcome(&self) -> Option<ExtractionOutcome> {
        self.outcome
    }

    /// Emit what can be emitted from the buffer while inside the block.
    fn drain_block(&mut self) -> Option<String> {
        if let Some(idx) = self.buffer.find(CLOSE_FENCE) {
            self.buffer.truncate(idx);
            let html = std::mem::take(&mut self.buffer);
            self.close(ExtractionOutcome::Complete);
            return non_empty(html);
        }

        let held = self
            .buffer
            .bytes()
            .rev()
            .take_while(|&b| b == b'`')
            .count();
        let ready = self.buffer.len() - held;
        if ready == 0 {
            return None;
        }

        let tail = self.buffer.split_off(ready);
        Some(std::mem::replace(&mut self.buffer, tail))
    }

    fn close(&mut self, outcome: ExtractionOutcome) {
        trace!(outcome = outcome.as_str(), "Extraction finished");
        self.state = ExtractorState::Done;
        self.outcome = Some(outcome);
    }
}

/// Drop everything but the last `max` bytes, rounded to a char boundary.
fn retain_tail(buffer: &mut String, max: usize) {
    if buffer.len() <= max {
        return;
    }
    let mut start = buffer.len() - max;
    // Fence characters are ASCII, so rounding forward never cuts a marker.
    while !buffer.is_char_boundary(start) {
        start += 1;
    }
    buffer.drain(..start);
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "Here:\n```html\n<h1>Hi</h1>\n```\nDone.";
    const EXPECTED: &str = "\n<h1>Hi</h1>\n";

    /// Run a full fragment sequence and return the concatenated output.
    fn run(fragments: &[&str]) -> String {
        let mut extractor = HtmlBlockExtractor::new();
        let mut out = String::new();
        for fragment in fragments {
            if let Some(html) = extractor.push(fragment) {
                out.push_str(&html);
            }
        }
        if let Some(html) = extractor.finish() {
            out.push_str(&html);
        }
        out
    }

    /// Every char-boundary split point of `s`.
    fn boundaries(s: &str) -> Vec<usize> {
        (0..=s.len()).filter(|&i| s.is_char_boundary(i)).collect()
    }

    #[test]
    fn extracts_block_from_single_fragment() {
        assert_eq!(run(&[RESPONSE]), EXPECTED);
    }

    #[test]
    fn chunk_boundary_invariance_two_pieces() {
        for i in boundaries(RESPONSE) {
            let out = run(&[&RESPONSE[..i], &RESPONSE[i..]]);
            assert_eq!(out, EXPECTED, "split at {i}");
        }
    }

    #[test]
    fn chunk_boundary_invariance_three_pieces() {
        let points = boundaries(RESPONSE);
        for &i in &points {
            for &j in points.iter().filter(|&&j| j >= i) {
                let out = run(&[&RESPONSE[..i], &RESPONSE[i..j], &RESPONSE[j..]]);
                assert_eq!(out, EXPECTED, "split at {i}/{j}");
            }
        }
    }

    #[test]
    fn char_by_char_stream() {
        let chars: Vec<String> = RESPONSE.chars().map(String::from).collect();
        let fragments: Vec<&str> = chars.iter().map(String::as_str).collect();
        assert_eq!(run(&fragments), EXPECTED);
    }

    #[test]
    fn split_closing_fence_leaks_no_backticks() {
        let fragments = ["```html\n<p>ok</p>\n", "``", "`\nbye"];
        let out = run(&fragments);
        assert_eq!(out, "\n<p>ok</p>\n");
        assert!(!out.contains('`'));
    }

    #[test]
    fn closing_fence_split_one_then_two() {
        let out = run(&["```html<p>x</p>`", "``"]);
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn partial_fence_is_held_not_emitted() {
        let mut extractor = HtmlBlockExtractor::new();
        assert_eq!(extractor.push("```html<div>").as_deref(), Some("<div>"));
        assert_eq!(extractor.push("``"), None);
        assert_eq!(extractor.state(), ExtractorState::InsideBlock);
        assert_eq!(extractor.push("`"), None);
        assert!(extractor.is_done());
        assert_eq!(extractor.outcome(), Some(ExtractionOutcome::Complete));
    }

    #[test]
    fn held_backticks_released_when_not_a_fence() {
        let mut extractor = HtmlBlockExtractor::new();
        assert_eq!(extractor.push("```html\nconst s = ").as_deref(), Some("\nconst s = "));
        assert_eq!(extractor.push("`"), None);
        assert_eq!(extractor.push("hi`;").as_deref(), Some("`hi`;"));
        assert_eq!(extractor.push("\n```"), Some("\n".to_string()));
    }

    #[test]
    fn inline_backticks_survive_any_chunking() {
        let response = "```html\n<script>const a = `b` + ``;</script>\n```";
        let expected = "\n<script>const a = `b` + ``;</script>\n";
        for i in boundaries(response) {
            assert_eq!(run(&[&response[..i], &response[i..]]), expected, "split at {i}");
        }
    }

    #[test]
    fn split_opening_fence() {
        assert_eq!(run(&["Sure! ``", "`ht", "ml\n<b>x</b>```"]), "\n<b>x</b>");
    }

    #[test]
    fn no_opening_fence_emits_nothing() {
        let mut extractor = HtmlBlockExtractor::new();
        assert_eq!(extractor.push("I cannot help with that."), None);
        assert_eq!(extractor.push(" ```python\nprint(1)\n```"), None);
        assert_eq!(extractor.finish(), None);
        assert!(!extractor.block_started());
        assert_eq!(extractor.outcome(), Some(ExtractionOutcome::NoBlock));
    }

    #[test]
    fn unterminated_block_flushes_at_end() {
        let mut extractor = HtmlBlockExtractor::new();
        assert_eq!(extractor.push("```html\n<p>partial").as_deref(), Some("\n<p>partial"));
        assert_eq!(extractor.push("``"), None);
        assert_eq!(extractor.finish().as_deref(), Some("``"));
        assert_eq!(extractor.outcome(), Some(ExtractionOutcome::Unterminated));
        assert!(extractor.is_done());
    }

    #[test]
    fn unterminated_block_output_is_complete_content() {
        let response = "```html\n<main>never closed</main>";
        for i in boundaries(response) {
            assert_eq!(
                run(&[&response[..i], &response[i..]]),
                "\n<main>never closed</main>",
                "split at {i}"
            );
        }
    }

    #[test]
    fn first_block_wins() {
        let response = "```html\nA\n```\nand also\n```html\nB\n```";
        assert_eq!(run(&[response]), "\nA\n");
    }

    #[test]
    fn done_ignores_further_input() {
        let mut extractor = HtmlBlockExtractor::new();
        extractor.push("```html<i>a</i>```");
        assert!(extractor.is_done());
        assert_eq!(extractor.push("```html<i>b</i>"), None);
        assert_eq!(extractor.finish(), None);
        assert_eq!(extractor.outcome(), Some(ExtractionOutcome::Complete));
    }

    #[test]
    fn block_started_is_monotonic() {
        let mut extractor = HtmlBlockExtractor::new();
        assert!(!extractor.block_started());
        extractor.push("```html");
        assert!(extractor.block_started());
        extractor.push("x```");
        assert!(extractor.block_started());
        extractor.finish();
        assert!(extractor.block_started());
    }

    #[test]
    fn empty_block_emits_nothing() {
        let mut extractor = HtmlBlockExtractor::new();
        assert_eq!(extractor.push("```html```"), None);
        assert_eq!(extractor.outcome(), Some(ExtractionOutcome::Complete));
    }

    #[test]
    fn fence_match_is_case_sensitive() {
        assert_eq!(run(&["```HTML\n<p>x</p>\n```"]), "");
    }

    #[test]
    fn multibyte_text_before_fence() {
        let response = "Voilà — ta page ✨\n```html\n<p>héllo</p>\n```";
        for i in boundaries(response) {
            assert_eq!(run(&[&response[..i], &response[i..]]), "\n<p>héllo</p>\n", "split at {i}");
        }
    }

    #[test]
    fn awaiting_buffer_stays_bounded() {
        let mut extractor = HtmlBlockExtractor::new();
        for _ in 0..1_000 {
            extractor.push("lots of preamble text ");
        }
        assert!(extractor.buffer.len() < OPEN_FENCE.len());
        assert_eq!(extractor.push("```html<p>x</p>```").as_deref(), Some("<p>x</p>"));
    }

    #[test]
    fn deterministic_for_identical_input() {
        let fragments = ["He", "re:\n``", "`html\n<h1", ">Hi</h1>\n`", "``\nDone."];
        assert_eq!(run(&fragments), run(&fragments));
        assert_eq!(run(&fragments), EXPECTED);
    }

    #[test]
    fn outcome_names() {
        assert_eq!(ExtractionOutcome::Complete.as_str(), "complete");
        assert_eq!(ExtractionOutcome::NoBlock.as_str(), "no_block");
    }
}
