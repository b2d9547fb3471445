//! Cyclic movement patterns and the compact grammar used to describe them.
//!
//! A pattern is written as a run of tokens. Every token is an optional
//! decimal repeat count followed by either one of the letters `u`, `d`, `l`,
//! `r` or a parenthesised pair of signed integers such as `(+1,-1)`. The two
//! numbers of a pair may be separated by any run of characters that are not
//! digits, signs or the closing parenthesis. Whitespace between tokens, and
//! between a count and its step, is ignored.

use std::{fmt, iter::Peekable, str::CharIndices, str::FromStr};

use maze_pages_core::Delta;
use thiserror::Error;

/// Largest number of steps a compiled pattern may hold.
pub const MAX_PATTERN_LENGTH: usize = 4096;

/// Patterns obstacles pick from when none is supplied explicitly.
pub const PATTERN_POOL: [&str; 9] = [
    "l2rl",
    "2r2l",
    "3r3l",
    "4r4l",
    "5r5l",
    "urdruldl",
    "(+1,-1)(+1,+1)(-1,-1)(-1,+1)",
    "(+1,-1)(+1,+1)(-1,+1)(-1,-1)",
    "(+1,-1)(+1,+1)(+1,-1)(+1,+1)(-1,-1)(-1,+1)(-1,-1)(-1,+1)",
];

/// Errors raised while compiling or navigating a pattern.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern would contain no step at all.
    #[error("pattern contains no steps")]
    Empty,
    /// A character that starts no token was found.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedCharacter {
        /// Byte offset of the character.
        position: usize,
        /// The offending character.
        found: char,
    },
    /// A repeat count was not followed by a step.
    #[error("repeat count at position {position} is not followed by a step")]
    DanglingCount {
        /// Byte offset where the count started.
        position: usize,
    },
    /// A coordinate pair was opened but never closed.
    #[error("coordinate pair opened at position {position} is not terminated")]
    UnterminatedPair {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },
    /// A number could not be represented.
    #[error("invalid number at position {position}")]
    InvalidNumber {
        /// Byte offset of the number.
        position: usize,
    },
    /// The expanded pattern is longer than [`MAX_PATTERN_LENGTH`].
    #[error("pattern expands to more than {MAX_PATTERN_LENGTH} steps")]
    TooLong,
    /// A cursor position beyond the pattern was requested.
    #[error("position {position} is outside a pattern of length {length}")]
    OutOfRange {
        /// Requested position.
        position: usize,
        /// Length of the pattern.
        length: usize,
    },
}

/// Non-empty cyclic sequence of deltas with a cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    deltas: Vec<Delta>,
    cursor: usize,
}

impl Pattern {
    /// Creates a pattern from explicit steps.
    pub fn new(deltas: Vec<Delta>) -> Result<Self, PatternError> {
        if deltas.is_empty() {
            return Err(PatternError::Empty);
        }
        if deltas.len() > MAX_PATTERN_LENGTH {
            return Err(PatternError::TooLong);
        }
        Ok(Self { deltas, cursor: 0 })
    }

    /// Compiles the textual form of a pattern.
    pub fn compile(text: &str) -> Result<Self, PatternError> {
        Self::new(Compiler::new(text).run()?)
    }

    /// Step under the cursor.
    #[must_use]
    pub fn peek(&self) -> Delta {
        self.deltas[self.cursor]
    }

    /// Advances the cursor by one step, wrapping around.
    pub fn skip(&mut self) {
        self.cursor = (self.cursor + 1) % self.deltas.len();
    }

    /// Advances the cursor by `steps`, wrapping around.
    pub fn skip_by(&mut self, steps: usize) {
        self.cursor = (self.cursor + steps % self.deltas.len()) % self.deltas.len();
    }

    /// Moves the cursor to `position`.
    pub fn jump_to(&mut self, position: usize) -> Result<(), PatternError> {
        if position >= self.deltas.len() {
            return Err(PatternError::OutOfRange {
                position,
                length: self.deltas.len(),
            });
        }
        self.cursor = position;
        Ok(())
    }

    /// Current cursor position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Step at `position`, if it exists.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<Delta> {
        self.deltas.get(position).copied()
    }

    /// Number of steps in one cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Whether the pattern has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Steps of one cycle in order, independent of the cursor.
    pub fn iter(&self) -> impl Iterator<Item = Delta> + '_ {
        self.deltas.iter().copied()
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::compile(text)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for delta in &self.deltas {
            write!(f, "{delta}")?;
        }
        Ok(())
    }
}

struct Compiler<'a> {
    chars: Peekable<CharIndices<'a>>,
    deltas: Vec<Delta>,
}

impl<'a> Compiler<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            deltas: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Delta>, PatternError> {
        loop {
            self.skip_whitespace();
            let Some(&(start, _)) = self.chars.peek() else {
                break;
            };
            let count = match self.digits() {
                Some(digits) => digits
                    .parse::<usize>()
                    .map_err(|_| PatternError::InvalidNumber { position: start })?,
                None => 1,
            };
            self.skip_whitespace();
            let delta = match self.chars.next() {
                Some((_, 'u')) => Delta::UP,
                Some((_, 'd')) => Delta::DOWN,
                Some((_, 'l')) => Delta::LEFT,
                Some((_, 'r')) => Delta::RIGHT,
                Some((position, '(')) => self.pair(position)?,
                Some((position, found)) => {
                    return Err(PatternError::UnexpectedCharacter { position, found })
                }
                None => return Err(PatternError::DanglingCount { position: start }),
            };
            if count > MAX_PATTERN_LENGTH - self.deltas.len() {
                return Err(PatternError::TooLong);
            }
            self.deltas.extend(std::iter::repeat(delta).take(count));
        }
        Ok(self.deltas)
    }

    fn pair(&mut self, open: usize) -> Result<Delta, PatternError> {
        let unterminated = PatternError::UnterminatedPair { position: open };
        self.skip_whitespace();
        let x = self.signed()?.ok_or_else(|| unterminated.clone())?;
        let mut separated = false;
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() || c == '+' || c == '-' || c == ')' {
                break;
            }
            separated = true;
            let _ = self.chars.next();
        }
        if !separated {
            return Err(match self.chars.peek() {
                Some(&(position, found)) => PatternError::UnexpectedCharacter { position, found },
                None => unterminated,
            });
        }
        let y = self.signed()?.ok_or_else(|| unterminated.clone())?;
        self.skip_whitespace();
        match self.chars.next() {
            Some((_, ')')) => Ok(Delta::new(x, y)),
            Some((position, found)) => Err(PatternError::UnexpectedCharacter { position, found }),
            None => Err(unterminated),
        }
    }

    fn signed(&mut self) -> Result<Option<i32>, PatternError> {
        let Some(&(start, first)) = self.chars.peek() else {
            return Ok(None);
        };
        let negative = match first {
            '+' | '-' => {
                let _ = self.chars.next();
                first == '-'
            }
            _ => false,
        };
        let Some(digits) = self.digits() else {
            return match self.chars.peek() {
                Some(&(position, found)) => {
                    Err(PatternError::UnexpectedCharacter { position, found })
                }
                None => Ok(None),
            };
        };
        let magnitude = digits
            .parse::<i64>()
            .map_err(|_| PatternError::InvalidNumber { position: start })?;
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value)
            .map(Some)
            .map_err(|_| PatternError::InvalidNumber { position: start })
    }

    fn digits(&mut self) -> Option<String> {
        let mut digits = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            let _ = self.chars.next();
        }
        (!digits.is_empty()).then_some(digits)
    }

    fn skip_whitespace(&mut self) {
        while self
            .chars
            .peek()
            .is_some_and(|&(_, c)| c.is_whitespace())
        {
            let _ = self.chars.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(text: &str) -> Vec<Delta> {
        Pattern::compile(text).expect("valid pattern").iter().collect()
    }

    #[test]
    fn letters_expand_with_repeat_counts() {
        assert_eq!(
            deltas("2lurd"),
            vec![Delta::LEFT, Delta::LEFT, Delta::UP, Delta::RIGHT, Delta::DOWN]
        );
        assert_eq!(deltas("urdruldl").len(), 8);
    }

    #[test]
    fn coordinate_pairs_accept_signs_and_loose_separators() {
        assert_eq!(
            deltas("(+1,-1)(+1,+1)"),
            vec![Delta::new(1, -1), Delta::new(1, 1)]
        );
        assert_eq!(
            deltas("2(-1, 0)(0;-1) ( 1 0 )"),
            vec![Delta::LEFT, Delta::LEFT, Delta::UP, Delta::RIGHT]
        );
    }

    #[test]
    fn whitespace_between_count_and_step_is_ignored() {
        assert_eq!(deltas(" 3 r\t2 l "), deltas("3r2l"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(Pattern::compile(""), Err(PatternError::Empty));
        assert_eq!(Pattern::compile("   "), Err(PatternError::Empty));
        assert_eq!(Pattern::compile("0r"), Err(PatternError::Empty));
        assert!(Pattern::new(Vec::new()).is_err());
        assert!(!Pattern::compile("u").expect("valid").is_empty());
    }

    #[test]
    fn malformed_input_reports_position() {
        assert_eq!(
            Pattern::compile("lx"),
            Err(PatternError::UnexpectedCharacter {
                position: 1,
                found: 'x'
            })
        );
        assert_eq!(
            Pattern::compile("ll3"),
            Err(PatternError::DanglingCount { position: 2 })
        );
        assert_eq!(
            Pattern::compile("(1,2"),
            Err(PatternError::UnterminatedPair { position: 0 })
        );
        assert!(matches!(
            Pattern::compile("(12)"),
            Err(PatternError::UnexpectedCharacter { found: ')', .. })
        ));
        assert!(matches!(
            Pattern::compile("(99999999999,0)"),
            Err(PatternError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn oversized_repeat_counts_are_rejected() {
        assert_eq!(Pattern::compile("5000r"), Err(PatternError::TooLong));
    }

    #[test]
    fn cursor_wraps_and_jumps() {
        let mut pattern = Pattern::compile("lur").expect("valid");
        assert_eq!(pattern.peek(), Delta::LEFT);
        pattern.skip();
        pattern.skip();
        assert_eq!(pattern.peek(), Delta::RIGHT);
        pattern.skip();
        assert_eq!(pattern.position(), 0);
        pattern.skip_by(7);
        assert_eq!(pattern.position(), 1);
        assert!(pattern.jump_to(3).is_err());
        pattern.jump_to(2).expect("in range");
        assert_eq!(pattern.at(pattern.position()), Some(Delta::RIGHT));
        assert_eq!(pattern.at(3), None);
    }

    #[test]
    fn every_pool_entry_compiles() {
        for text in PATTERN_POOL {
            assert!(Pattern::compile(text).is_ok(), "{text} failed to compile");
        }
    }
}
