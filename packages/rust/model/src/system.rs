//! The system base model merged into every model graph.

/// Reserved registration name of the system base model.
pub const SYSTEM_MODEL_NAME: &str = "@system.cto";

/// The built-in system base model.
///
/// Every non-enum declaration without an explicit supertype implicitly
/// extends the type here matching its kind.
pub const SYSTEM_MODEL: &str = r#"namespace concerto@1.0.0

/** Base type of all concepts. */
abstract concept Concept {
}

/** Base type of all assets. */
abstract concept Asset identified {
}

/** Base type of all participants. */
abstract concept Participant identified {
}

/** Base type of all transactions. */
abstract concept Transaction {
  o DateTime timestamp
}

/** Base type of all events. */
abstract concept Event {
  o DateTime timestamp
}
"#;
