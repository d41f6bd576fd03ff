use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    MalformedAction { input: String, parts: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::MalformedAction { input, parts } => write!(
                f,
                "malformed SOAP action {input:?}: expected `<namespace>#<method>`, got {parts} part(s)"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}
