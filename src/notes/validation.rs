//! Field validation for card, book, and tree-node inputs.
//!
//! Every rule is checked and all failures are reported together, keyed by field
//! name. Review quality is not validated here; the scheduler accepts any
//! integer.

use serde::Serialize;

use super::types::{NewBook, NewCard, NewTreeNode};

pub const TITLE_MAX: usize = 200;
pub const CONTENT_MAX: usize = 10_000;
pub const TAG_MAX: usize = 50;
pub const AUTHOR_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1_000;
pub const ID_MAX: usize = 100;
pub const DIFFICULTY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// All validation failures for one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn required(&mut self, field: &str, value: &str) -> bool {
        if value.is_empty() {
            self.push(field, format!("{field} is required"));
            return false;
        }
        true
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, format!("{field} must be no more than {max} characters long"));
        }
    }

    fn into_result(self) -> crate::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

pub(crate) fn check_title(errors: &mut ValidationErrors, title: &str) {
    if errors.required("title", title) {
        errors.max_len("title", title, TITLE_MAX);
    }
}

pub(crate) fn check_content(errors: &mut ValidationErrors, content: &str) {
    if errors.required("content", content) {
        errors.max_len("content", content, CONTENT_MAX);
    }
}

pub(crate) fn check_tags(errors: &mut ValidationErrors, tags: &[String]) {
    for (i, tag) in tags.iter().enumerate() {
        if tag.chars().count() > TAG_MAX {
            errors.push(
                format!("tags[{i}]"),
                format!("each tag must be no more than {TAG_MAX} characters"),
            );
        }
    }
}

pub(crate) fn check_difficulty(errors: &mut ValidationErrors, difficulty: u8) {
    if !DIFFICULTY_RANGE.contains(&difficulty) {
        errors.push(
            "difficulty",
            format!(
                "difficulty must be between {} and {}",
                DIFFICULTY_RANGE.start(),
                DIFFICULTY_RANGE.end()
            ),
        );
    }
}

pub(crate) fn check_description(errors: &mut ValidationErrors, description: Option<&str>) {
    if let Some(d) = description {
        errors.max_len("description", d, DESCRIPTION_MAX);
    }
}

pub(crate) fn check_author(errors: &mut ValidationErrors, author: &str) {
    errors.max_len("author", author, AUTHOR_MAX);
}

pub fn validate_new_card(card: &NewCard) -> crate::Result<()> {
    let mut errors = ValidationErrors::default();
    check_title(&mut errors, &card.title);
    check_content(&mut errors, &card.content);
    check_tags(&mut errors, &card.tags);
    check_difficulty(&mut errors, card.difficulty);
    check_description(&mut errors, card.description.as_deref());
    errors.into_result()
}

pub fn validate_new_book(book: &NewBook) -> crate::Result<()> {
    let mut errors = ValidationErrors::default();
    check_title(&mut errors, &book.title);
    check_author(&mut errors, &book.author);
    check_description(&mut errors, book.description.as_deref());
    errors.into_result()
}

pub fn validate_new_tree_node(node: &NewTreeNode) -> crate::Result<()> {
    let mut errors = ValidationErrors::default();
    for (field, value) in [("card_id", &node.card_id), ("book_id", &node.book_id)] {
        if errors.required(field, value) {
            errors.max_len(field, value, ID_MAX);
        }
    }
    if let Some(parent) = &node.parent_id {
        if parent.is_empty() {
            errors.push("parent_id", "parent_id cannot be empty");
        }
    }
    check_position(&mut errors, node.position.x, node.position.y);
    errors.into_result()
}

pub(crate) fn check_position(errors: &mut ValidationErrors, x: f64, y: f64) {
    if !x.is_finite() {
        errors.push("position.x", "position.x must be a finite number");
    }
    if !y.is_finite() {
        errors.push("position.y", "position.y must be a finite number");
    }
}

/// Run `checks` against a fresh error set; used by update paths.
pub(crate) fn validate_with(checks: impl FnOnce(&mut ValidationErrors)) -> crate::Result<()> {
    let mut errors = ValidationErrors::default();
    checks(&mut errors);
    errors.into_result()
}
