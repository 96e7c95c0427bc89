//! Field validators attached by the synthesizer.

use serde::Serialize;

/// Predicate over a submitted field value.
///
/// `message` replaces the default error text when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Validator {
    /// Input must be present; stops the chain when missing
    InputRequired {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Empty input is accepted and stops the chain
    Optional,
    /// Inclusive numeric bounds
    NumberRange {
        min: Option<f64>,
        max: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Bounds on the number of characters
    Length {
        min: Option<usize>,
        max: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    UuidFormat {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// No other record of `entity` holds the value in `field`
    Unique {
        entity: String,
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The value is the key of a stored record of `entity`
    EntityExists {
        entity: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Validator {
    pub fn input_required() -> Self {
        Validator::InputRequired { message: None }
    }

    pub fn number_range(min: Option<f64>, max: Option<f64>) -> Self {
        Validator::NumberRange {
            min,
            max,
            message: None,
        }
    }

    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Validator::Length {
            min,
            max,
            message: None,
        }
    }

    pub fn uuid_format() -> Self {
        Validator::UuidFormat { message: None }
    }

    pub fn unique(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Validator::Unique {
            entity: entity.into(),
            field: field.into(),
            message: None,
        }
    }

    pub fn entity_exists(entity: impl Into<String>) -> Self {
        Validator::EntityExists {
            entity: entity.into(),
            message: None,
        }
    }

    /// Replaces the default error message. No effect on `Optional`.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Validator::InputRequired { message }
            | Validator::NumberRange { message, .. }
            | Validator::Length { message, .. }
            | Validator::UuidFormat { message }
            | Validator::Unique { message, .. }
            | Validator::EntityExists { message, .. } => *message = Some(text.into()),
            Validator::Optional => {}
        }
        self
    }

    /// Error text reported when the validator fails.
    pub fn message(&self) -> String {
        let custom = match self {
            Validator::InputRequired { message }
            | Validator::NumberRange { message, .. }
            | Validator::Length { message, .. }
            | Validator::UuidFormat { message }
            | Validator::Unique { message, .. }
            | Validator::EntityExists { message, .. } => message.clone(),
            Validator::Optional => None,
        };
        custom.unwrap_or_else(|| self.default_message())
    }

    fn default_message(&self) -> String {
        match self {
            Validator::InputRequired { .. } => "This field is required.".to_string(),
            Validator::Optional => String::new(),
            Validator::NumberRange { min, max, .. } => match (min, max) {
                (Some(min), Some(max)) => format!("Number must be between {} and {}.", min, max),
                (Some(min), None) => format!("Number must be at least {}.", min),
                (None, Some(max)) => format!("Number must be at most {}.", max),
                (None, None) => "Not a valid number.".to_string(),
            },
            Validator::Length { min, max, .. } => match (min, max) {
                (Some(min), Some(max)) => {
                    format!("Field must be between {} and {} characters long.", min, max)
                }
                (Some(min), None) => format!("Field must be at least {} character(s) long.", min),
                (None, Some(max)) => format!("Field cannot be longer than {} character(s).", max),
                (None, None) => "Invalid field length.".to_string(),
            },
            Validator::UuidFormat { .. } => "Invalid UUID.".to_string(),
            Validator::Unique { .. } => "This value is already in use.".to_string(),
            Validator::EntityExists { .. } => "Entity not exists".to_string(),
        }
    }
}
