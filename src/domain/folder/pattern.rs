//! Folder name pattern module.
//!
//! This module contains the shell-style patterns used to glob folder
//! names: `*` matches anything, `?` matches a single character,
//! `[seq]` matches a character of the sequence and `[!seq]` a
//! character out of it. Matching is case-insensitive.

use regex::{Regex, RegexBuilder};

use super::{Error, Result};

#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&translate(pattern))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|err| Error::ParseGlobPatternError(err, pattern.to_owned()))?;
        Ok(Self(regex))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::from("^(?:");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    let mut class = &chars[i + 1..end];
                    regex.push('[');
                    if let Some('!') = class.first() {
                        regex.push('^');
                        class = &class[1..];
                    }
                    for c in class {
                        match c {
                            '\\' | '[' | ']' | '^' | '&' | '~' => {
                                regex.push('\\');
                                regex.push(*c);
                            }
                            c => regex.push(*c),
                        }
                    }
                    regex.push(']');
                    i = end;
                }
                // an unmatched bracket is a literal
                None => regex.push_str(r"\["),
            },
            c => regex.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    regex.push_str(")$");
    regex
}

// Finds the closing bracket of the class opened at `start`. A `]`
// right after `[` or `[!` belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'!') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    (i..chars.len()).find(|&j| chars[j] == ']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_wildcards() {
        let pattern = Pattern::new("in*").unwrap();
        assert!(pattern.matches("Inbox"));
        assert!(pattern.matches("in"));
        assert!(!pattern.matches("Sent"));

        let pattern = Pattern::new("a?c").unwrap();
        assert!(pattern.matches("ABC"));
        assert!(!pattern.matches("abbc"));
    }

    #[test]
    fn match_classes() {
        let pattern = Pattern::new("[ab]*").unwrap();
        assert!(pattern.matches("archive"));
        assert!(pattern.matches("Backup"));
        assert!(!pattern.matches("calendar"));

        let pattern = Pattern::new("[!ab]*").unwrap();
        assert!(!pattern.matches("archive"));
        assert!(pattern.matches("calendar"));

        let pattern = Pattern::new("[]]").unwrap();
        assert!(pattern.matches("]"));
    }

    #[test]
    fn match_literals() {
        assert!(Pattern::new("a.b").unwrap().matches("A.B"));
        assert!(!Pattern::new("a.b").unwrap().matches("axb"));
        assert!(Pattern::new("a[b").unwrap().matches("a[b"));
        assert!(Pattern::new("(1)+").unwrap().matches("(1)+"));
    }
}
