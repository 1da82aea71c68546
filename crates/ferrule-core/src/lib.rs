//! Ferrule Core
//!
//! Shared data model used by the compiler and runtime crates: the dynamic
//! [`Value`] type, engine [`Options`], the stable error-code taxonomy, and
//! the message/diagnostic types an execution produces.

pub mod error;
pub mod message;
pub mod options;
pub mod result;
pub mod value;

pub use error::{EngineError, ErrorCode, ErrorKind};
pub use message::{Message, MessageLevel};
pub use options::{EqualityCoercion, MidpointRounding, Options, StringComparison, StringConcat};
pub use result::{
    Complexity, ExecutionResult, ReferencedField, ValidationResult, ValidationWarning,
    WarningKind,
};
pub use value::{Value, ValueType};
