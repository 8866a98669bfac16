use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{EntityKind, Row};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationErrorType {
    MissingRequiredAttribute,
    InvalidValue,
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub error_type: ValidationErrorType,
    pub attribute: String,
    pub message: String,
}

/// Every rule a row broke, reported together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub kind: EntityKind,
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "Invalid {}: {}", self.kind, messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Field-level rules for a row about to be written
pub trait Validator: Send + Sync {
    fn validate(&self, kind: EntityKind, row: &Row) -> Result<(), ValidationErrors>;
}

const PROGRAM_TYPES: &[&str] = &["Main", "Macro", "Beat", "Detail"];
const CONTENT_STATES: &[&str] = &["Draft", "Published"];
const INSTRUMENT_TYPES: &[&str] = &[
    "Drum",
    "Bass",
    "Pad",
    "Sticky",
    "Stripe",
    "Stab",
    "Hook",
    "Percussion",
    "Transition",
    "Background",
];
const INSTRUMENT_MODES: &[&str] = &["Event", "Chord", "Loop"];
const TEMPLATE_TYPES: &[&str] = &["Preview", "Production"];

/// The hub's rules for programs, instruments and templates; other kinds pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentValidator;

impl Validator for ContentValidator {
    fn validate(&self, kind: EntityKind, row: &Row) -> Result<(), ValidationErrors> {
        let mut check = Check::new(row);

        match kind {
            EntityKind::Program => {
                check.required("library_id");
                check.non_empty("name");
                check.non_empty("key");
                check.positive("tempo");
                check.one_of("type", PROGRAM_TYPES);
                check.one_of("state", CONTENT_STATES);
                check.unit_interval("density");
            }
            EntityKind::Instrument => {
                check.required("library_id");
                check.non_empty("name");
                check.one_of("type", INSTRUMENT_TYPES);
                check.one_of("mode", INSTRUMENT_MODES);
                check.one_of("state", CONTENT_STATES);
                check.unit_interval("density");
                check.unit_interval("volume");
            }
            EntityKind::Template => {
                check.required("account_id");
                check.non_empty("name");
                check.ship_key("ship_key");
                check.one_of("type", TEMPLATE_TYPES);
            }
            _ => {}
        }

        if check.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                kind,
                errors: check.errors,
            })
        }
    }
}

struct Check<'a> {
    row: &'a Row,
    errors: Vec<ValidationError>,
}

impl<'a> Check<'a> {
    fn new(row: &'a Row) -> Self {
        Self {
            row,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, error_type: ValidationErrorType, attribute: &str, message: String) {
        self.errors.push(ValidationError {
            error_type,
            attribute: attribute.to_string(),
            message,
        });
    }

    fn required(&mut self, attribute: &str) -> bool {
        if self.row.is_set(attribute) {
            return true;
        }
        self.fail(
            ValidationErrorType::MissingRequiredAttribute,
            attribute,
            format!("{} is required", attribute),
        );
        false
    }

    fn non_empty(&mut self, attribute: &str) {
        if !self.required(attribute) {
            return;
        }
        let blank = self
            .row
            .get_str(attribute)
            .map(|s| s.trim().is_empty())
            .unwrap_or(true);
        if blank {
            self.fail(
                ValidationErrorType::InvalidValue,
                attribute,
                format!("{} must be non-blank text", attribute),
            );
        }
    }

    fn positive(&mut self, attribute: &str) {
        if !self.required(attribute) {
            return;
        }
        match self.row.get_f64(attribute) {
            Some(n) if n > 0.0 => {}
            Some(n) => self.fail(
                ValidationErrorType::OutOfRange,
                attribute,
                format!("{} must be greater than zero, got {}", attribute, n),
            ),
            None => self.fail(
                ValidationErrorType::InvalidValue,
                attribute,
                format!("{} must be a number", attribute),
            ),
        }
    }

    fn unit_interval(&mut self, attribute: &str) {
        if !self.row.is_set(attribute) {
            return;
        }
        match self.row.get_f64(attribute) {
            Some(n) if (0.0..=1.0).contains(&n) => {}
            Some(n) => self.fail(
                ValidationErrorType::OutOfRange,
                attribute,
                format!("{} must be between 0 and 1, got {}", attribute, n),
            ),
            None => self.fail(
                ValidationErrorType::InvalidValue,
                attribute,
                format!("{} must be a number", attribute),
            ),
        }
    }

    fn one_of(&mut self, attribute: &str, allowed: &[&str]) {
        if !self.required(attribute) {
            return;
        }
        let value = self.row.get_str(attribute).unwrap_or_default();
        if !allowed.contains(&value) {
            self.fail(
                ValidationErrorType::InvalidValue,
                attribute,
                format!("{} must be one of {}", attribute, allowed.join(", ")),
            );
        }
    }

    fn ship_key(&mut self, attribute: &str) {
        if !self.required(attribute) {
            return;
        }
        let value = self.row.get_str(attribute).unwrap_or_default();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            self.fail(
                ValidationErrorType::InvalidValue,
                attribute,
                format!(
                    "{} may only contain lowercase letters, digits, '-' and '_'",
                    attribute
                ),
            );
        }
    }
}
