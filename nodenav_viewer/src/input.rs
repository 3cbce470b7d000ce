use std::collections::VecDeque;
use std::io::{self, BufRead};

use nodenav_engine::Command;

/// Maps a key to a navigation command. Keys are case-insensitive; anything
/// other than L, R, U and Q has no command.
pub fn command_for_key(key: char) -> Option<Command> {
    match key.to_ascii_uppercase() {
        'L' => Some(Command::DescendLeft),
        'R' => Some(Command::DescendRight),
        'U' => Some(Command::Ascend),
        'Q' => Some(Command::Quit),
        _ => None,
    }
}

/// Pulls single keys out of a line-oriented reader such as stdin.
/// Whitespace is skipped, so "l r u" and "lru" are the same three keys.
pub struct KeyReader<R> {
    reader: R,
    pending: VecDeque<char>,
}

impl<R: BufRead> KeyReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Next key, or `None` at end of input.
    pub fn next_key(&mut self) -> io::Result<Option<char>> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(Some(key));
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.chars().filter(|ch| !ch.is_whitespace()));
        }
    }
}
