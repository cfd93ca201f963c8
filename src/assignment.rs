//! Assignment-mode variant splitting.
//!
//! A source document may mark regions as instructor-only or as
//! feedback with HTML comment markers:
//!
//! ```markdown
//! # Exercise 3
//!
//! Task text everyone sees.
//!
//! <!-- instructor -->
//! Model solution.
//! <!-- end -->
//!
//! <!-- feedback -->
//! Common mistakes observed last year.
//! <!-- end -->
//! ```
//!
//! Splitting produces three variants: instructor (everything, markers
//! removed), student (instructor and feedback blocks removed), and
//! feedback (document title plus the feedback blocks). Blocks must be
//! balanced and may not nest; the document must open with a level-1
//! heading so the feedback variant has a title.

use anyhow::{Result, bail};

pub const INSTRUCTOR_MARKER: &str = "<!-- instructor -->";
pub const FEEDBACK_MARKER: &str = "<!-- feedback -->";
pub const END_MARKER: &str = "<!-- end -->";

/// The three rendered flavors of an assignment document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Instructor,
    Student,
    Feedback,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Instructor, Variant::Student, Variant::Feedback];

    /// File stem suffix, e.g. `document_student.md`.
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Instructor => "instructor",
            Variant::Student => "student",
            Variant::Feedback => "feedback",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Block {
    Instructor,
    Feedback,
}

/// Check marker balance and that the document opens with a title.
///
/// Leading blank lines are tolerated; the first non-blank line must be
/// a level-1 heading. Returns the title line.
pub fn validate_structure(content: &str) -> Result<&str> {
    let title = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    if !title.starts_with("# ") {
        bail!("Document must start with a level-1 heading");
    }

    let mut open: Option<Block> = None;
    for (number, line) in content.lines().enumerate() {
        let marker = line.trim();
        let block = match marker {
            INSTRUCTOR_MARKER => Some(Block::Instructor),
            FEEDBACK_MARKER => Some(Block::Feedback),
            _ => None,
        };

        if let Some(block) = block {
            if open.is_some() {
                bail!("Nested marker on line {}", number + 1);
            }
            open = Some(block);
        } else if marker == END_MARKER {
            if open.take().is_none() {
                bail!("Unmatched end marker on line {}", number + 1);
            }
        }
    }
    if open.is_some() {
        bail!("Unterminated marker block");
    }

    Ok(title)
}

/// Produce one variant's text. The input must have passed
/// [`validate_structure`] first.
pub fn split_variant(content: &str, variant: Variant) -> Result<String> {
    let title = validate_structure(content)?;

    let mut out = String::with_capacity(content.len());
    if variant == Variant::Feedback {
        out.push_str(title);
        out.push('\n');
    }

    let mut open: Option<Block> = None;
    for line in content.lines() {
        let marker = line.trim();
        match marker {
            INSTRUCTOR_MARKER => {
                open = Some(Block::Instructor);
                continue;
            }
            FEEDBACK_MARKER => {
                open = Some(Block::Feedback);
                continue;
            }
            END_MARKER => {
                open = None;
                continue;
            }
            _ => {}
        }

        let keep = match variant {
            Variant::Instructor => true,
            Variant::Student => open.is_none(),
            Variant::Feedback => open == Some(Block::Feedback),
        };
        if keep {
            out.push_str(line);
            out.push('\n');
        }
    }

    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
