//! Block splitter
//!
//! Cuts a line-oriented Turtle file into blank-line separated blocks and a
//! shared preamble of directive lines.
//!
//! - A line starting with `#` is a comment and is dropped.
//! - A `@prefix`, `@base`, `PREFIX` or `BASE` line joins the preamble,
//!   wherever it appears, and never becomes part of a block.
//! - A blank line closes the current block if it has any lines.
//! - End of input closes the last block.

use std::io::BufRead;

/// One blank-line separated group of statement lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// 0-based position among the emitted blocks.
    pub index: usize,
    /// 1-based input line of the block's first line.
    pub start_line: usize,
    pub lines: Vec<String>,
    /// 1-based input line of each entry in `lines`.
    pub line_numbers: Vec<usize>,
}

impl Block {
    /// Text handed to the parser: the preamble, an empty line, then the block.
    pub fn source(&self, preamble: &[String]) -> String {
        format!("{}\n\n{}", preamble.join("\n"), self.lines.join("\n"))
    }

    /// Input line of line `source_line` (1-based) of [`Block::source`], or
    /// `None` when it falls in the preamble.
    pub fn input_line(&self, preamble_len: usize, source_line: usize) -> Option<usize> {
        let first = preamble_len.max(1) + 2;
        source_line
            .checked_sub(first)
            .and_then(|i| self.line_numbers.get(i))
            .copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitDocument {
    pub preamble: Vec<String>,
    pub blocks: Vec<Block>,
}

impl SplitDocument {
    /// The parser input for each block, in order.
    pub fn sources(&self) -> impl Iterator<Item = (&Block, String)> + '_ {
        self.blocks
            .iter()
            .map(move |block| (block, block.source(&self.preamble)))
    }
}

fn is_directive(line: &str) -> bool {
    let keyword = |kw: &str| {
        line.get(..kw.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(kw))
    };
    line.starts_with("@prefix ")
        || line.starts_with("@base ")
        || keyword("PREFIX ")
        || keyword("BASE ")
}

#[derive(Default)]
struct Splitter {
    doc: SplitDocument,
    pending: Vec<String>,
    pending_lines: Vec<usize>,
}

impl Splitter {
    fn push(&mut self, line_no: usize, line: &str) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('#') {
            return;
        }
        if is_directive(line) {
            self.doc.preamble.push(line.to_string());
        } else if line.trim().is_empty() {
            self.flush();
        } else {
            self.pending.push(line.to_string());
            self.pending_lines.push(line_no);
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let line_numbers = std::mem::take(&mut self.pending_lines);
        self.doc.blocks.push(Block {
            index: self.doc.blocks.len(),
            start_line: line_numbers[0],
            lines: std::mem::take(&mut self.pending),
            line_numbers,
        });
    }

    fn finish(mut self) -> SplitDocument {
        self.flush();
        self.doc
    }
}

/// Split any sequence of lines. A trailing `\r` on a line is ignored.
pub fn split_lines<I, S>(lines: I) -> SplitDocument
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut splitter = Splitter::default();
    for (i, line) in lines.into_iter().enumerate() {
        splitter.push(i + 1, line.as_ref());
    }
    splitter.finish()
}

pub fn split_str(input: &str) -> SplitDocument {
    split_lines(input.lines())
}

pub fn split_reader<R: BufRead>(reader: R) -> std::io::Result<SplitDocument> {
    let mut splitter = Splitter::default();
    for (i, line) in reader.lines().enumerate() {
        splitter.push(i + 1, &line?);
    }
    Ok(splitter.finish())
}
