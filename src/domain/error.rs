use std::fmt;

use thiserror::Error;

/// Errors returned by template and workflow operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Workflow finished: {0}")]
    TerminalState(String),

    #[error("Step finished: {0}")]
    StepTerminal(String),

    #[error("Template has no steps: {0}")]
    EmptyTemplate(String),
}

/// Category of a [`WorkflowError`], without the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfRange,
    Unauthorized,
    TerminalState,
    StepTerminal,
    EmptyTemplate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::OutOfRange => write!(f, "out_of_range"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::TerminalState => write!(f, "terminal_state"),
            Self::StepTerminal => write!(f, "step_terminal"),
            Self::EmptyTemplate => write!(f, "empty_template"),
        }
    }
}

impl WorkflowError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn terminal_state(message: impl Into<String>) -> Self {
        Self::TerminalState(message.into())
    }

    pub fn step_terminal(message: impl Into<String>) -> Self {
        Self::StepTerminal(message.into())
    }

    pub fn empty_template(message: impl Into<String>) -> Self {
        Self::EmptyTemplate(message.into())
    }

    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::OutOfRange(_) => ErrorKind::OutOfRange,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::TerminalState(_) => ErrorKind::TerminalState,
            Self::StepTerminal(_) => ErrorKind::StepTerminal,
            Self::EmptyTemplate(_) => ErrorKind::EmptyTemplate,
        }
    }

    /// The human-readable message, without the category prefix
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::OutOfRange(m)
            | Self::Unauthorized(m)
            | Self::TerminalState(m)
            | Self::StepTerminal(m)
            | Self::EmptyTemplate(m) => m,
        }
    }

    /// Prefix the message with context, keeping the category
    pub fn context(self, context: impl fmt::Display) -> Self {
        let wrap = |m: String| format!("{}: {}", context, m);

        match self {
            Self::InvalidArgument(m) => Self::InvalidArgument(wrap(m)),
            Self::OutOfRange(m) => Self::OutOfRange(wrap(m)),
            Self::Unauthorized(m) => Self::Unauthorized(wrap(m)),
            Self::TerminalState(m) => Self::TerminalState(wrap(m)),
            Self::StepTerminal(m) => Self::StepTerminal(wrap(m)),
            Self::EmptyTemplate(m) => Self::EmptyTemplate(wrap(m)),
        }
    }
}
