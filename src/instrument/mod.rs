//! Invocation instrumentation.
//!
//! # Data Flow
//! ```text
//! caller
//!     → Instrumenter::instrument_sync / instrument_async / InstrumentService
//!     → begin: resolve metadata, capture arguments, allocate InvocationRecord
//!         (owned by an InvocationGuard, never shared)
//!     → run operation inside task-local InvocationContext + tracing span
//!     → outcome: Success | Failure | Cancelled (guard dropped) | Panicked
//!     → exactly one LogRecord to the sink, metrics updated
//!     → operation's own value or error returned to the caller
//! ```
//!
//! # Design Decisions
//! - Explicit wrapping (closure, future, tower layer) instead of reflection
//! - Call-scoped state: record lifetime equals the invocation, not the thread
//! - Instrumentation never swallows, replaces or adds errors of the wrapped call

pub mod context;
pub mod guard;
pub mod instrumenter;
pub mod layer;
pub mod record;

use serde::Serialize;
use serde_json::Value;

pub use context::InvocationContext;
pub use guard::InvocationGuard;
pub use instrumenter::{CallSite, Instrumenter, StatsSnapshot};
pub use layer::{InstrumentLayer, InstrumentService};
pub use record::{InvocationRecord, LogRecord, Outcome};

/// Convert a value into a record argument.
///
/// Values that cannot be serialized are recorded as a placeholder string.
pub fn arg<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)))
}

/// Build an argument list: `args![user, id]`.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::instrument::arg(&$value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct User {
        id: u32,
        user_name: String,
    }

    #[test]
    fn test_args_macro() {
        let user = User { id: 1, user_name: "alice".into() };
        let args: Vec<Value> = crate::args![user, 7u8, "x"];
        assert_eq!(args, vec![json!({"id": 1, "user_name": "alice"}), json!(7), json!("x")]);

        let empty: Vec<Value> = crate::args![];
        assert!(empty.is_empty());
    }

    #[test]
    fn test_unserializable_argument() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not valid JSON keys");
        assert!(matches!(arg(&map), Value::String(s) if s.starts_with("<unserializable")));
    }
}
