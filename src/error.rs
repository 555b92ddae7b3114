//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - WEFT-001-009: Resolution errors
//! - WEFT-010-019: Assembly errors
//! - WEFT-020-029: Scope misuse
//! - WEFT-030-039: Disk scope errors
//! - WEFT-040-049: Configuration and model validation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InjectError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum InjectError {
    // ═══════════════════════════════════════════
    // RESOLUTION ERRORS (001-009)
    // ═══════════════════════════════════════════
    #[error("[WEFT-001] No resource can serve {dependency}{}", near_misses(.candidates))]
    Unresolvable {
        dependency: String,
        candidates: Vec<String>,
    },

    #[error("[WEFT-002] Ambiguous request {dependency}: '{first}' and '{second}' are equally qualified")]
    Ambiguous {
        dependency: String,
        first: String,
        second: String,
    },

    #[error("[WEFT-003] Cyclic dependency: {cycle}")]
    Cyclic { cycle: String },

    #[error("[WEFT-004] Producer for {dependency} failed: {source}")]
    ProducerFailed {
        dependency: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[WEFT-005] {dependency} produced a value that is not a {expected}")]
    TypeMismatch {
        dependency: String,
        expected: &'static str,
    },

    // ═══════════════════════════════════════════
    // ASSEMBLY ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[WEFT-010] Inconsistent declarations for {locator}: {first} clashes with {second}")]
    InconsistentDeclaration {
        locator: String,
        first: String,
        second: String,
    },

    #[error("[WEFT-011] Binding {locator} declared by {source_ref} has no producer")]
    IncompleteBinding { locator: String, source_ref: String },

    #[error("[WEFT-012] Binding {locator} refers to unknown scope '{scope}'")]
    UnknownScope { scope: String, locator: String },

    #[error("[WEFT-013] Module '{module}' failed to declare its bindings: {reason}")]
    DeclarationFailed { module: String, reason: String },

    // ═══════════════════════════════════════════
    // SCOPE MISUSE (020-029)
    // ═══════════════════════════════════════════
    #[error("[WEFT-020] Scope '{scope}' is not allocated on this thread")]
    ScopeNotAllocated { scope: String },

    // ═══════════════════════════════════════════
    // DISK SCOPE (030-039)
    // ═══════════════════════════════════════════
    #[error("[WEFT-030] Failed to load '{path}': {reason}")]
    DiskLoad { path: String, reason: String },

    #[error("[WEFT-031] Failed to save '{path}': {reason}")]
    DiskSave { path: String, reason: String },

    #[error("[WEFT-032] No codec registered for '{ty}' in disk scope")]
    MissingCodec { ty: String },

    // ═══════════════════════════════════════════
    // CONFIG / VALIDATION (040-049)
    // ═══════════════════════════════════════════
    #[error("[WEFT-040] Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("[WEFT-041] Invalid name '{raw}': {reason}")]
    InvalidName { raw: String, reason: String },

    #[error("[WEFT-042] Invalid package '{raw}': {reason}")]
    InvalidPackage { raw: String, reason: String },

    #[error("[WEFT-043] Invalid type '{ty}': {reason}")]
    InvalidType { ty: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn near_misses(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!(" (incompatible candidates: {})", candidates.join(", "))
    }
}

impl InjectError {
    /// Wrap a producer failure, keeping injection errors raised further down intact.
    pub fn producer(dependency: impl ToString, source: anyhow::Error) -> Self {
        match source.downcast::<InjectError>() {
            Ok(inner) => inner,
            Err(source) => InjectError::ProducerFailed {
                dependency: dependency.to_string(),
                source,
            },
        }
    }

    /// Error code without brackets, e.g. `WEFT-003`
    pub fn code(&self) -> &'static str {
        match self {
            InjectError::Unresolvable { .. } => "WEFT-001",
            InjectError::Ambiguous { .. } => "WEFT-002",
            InjectError::Cyclic { .. } => "WEFT-003",
            InjectError::ProducerFailed { .. } => "WEFT-004",
            InjectError::TypeMismatch { .. } => "WEFT-005",
            InjectError::InconsistentDeclaration { .. } => "WEFT-010",
            InjectError::IncompleteBinding { .. } => "WEFT-011",
            InjectError::UnknownScope { .. } => "WEFT-012",
            InjectError::DeclarationFailed { .. } => "WEFT-013",
            InjectError::ScopeNotAllocated { .. } => "WEFT-020",
            InjectError::DiskLoad { .. } => "WEFT-030",
            InjectError::DiskSave { .. } => "WEFT-031",
            InjectError::MissingCodec { .. } => "WEFT-032",
            InjectError::ConfigError { .. } => "WEFT-040",
            InjectError::InvalidName { .. } => "WEFT-041",
            InjectError::InvalidPackage { .. } => "WEFT-042",
            InjectError::InvalidType { .. } => "WEFT-043",
            InjectError::Io(_) => "WEFT-090",
        }
    }

    /// Assembly-time errors abort context construction
    pub fn is_assembly_error(&self) -> bool {
        matches!(
            self,
            InjectError::InconsistentDeclaration { .. }
                | InjectError::IncompleteBinding { .. }
                | InjectError::UnknownScope { .. }
                | InjectError::DeclarationFailed { .. }
        )
    }
}

impl FixSuggestion for InjectError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            InjectError::Unresolvable { .. } => {
                Some("Bind the requested type, or check name, packages and target of existing bindings")
            }
            InjectError::Ambiguous { .. } => {
                Some("Request a specific name, or declare one binding with a more explicit declaration type")
            }
            InjectError::Cyclic { .. } => {
                Some("Break the cycle by resolving one side lazily through the Context")
            }
            InjectError::ProducerFailed { .. } => Some("Inspect the source error raised by the producer"),
            InjectError::TypeMismatch { .. } => {
                Some("Make sure the producer returns the type the locator declares")
            }
            InjectError::InconsistentDeclaration { .. } => {
                Some("Remove one of the clashing declarations or lower its declaration type")
            }
            InjectError::IncompleteBinding { .. } => Some("Complete the binding with a producer"),
            InjectError::UnknownScope { .. } => Some("Register the scope with Bootstrap::with_scope"),
            InjectError::DeclarationFailed { .. } => Some("Check the module's environment properties"),
            InjectError::ScopeNotAllocated { .. } => {
                Some("Call WorkerScope::begin or allocate before resolving on this thread")
            }
            InjectError::DiskLoad { .. } => Some("Delete the corrupt file or check its codec"),
            InjectError::DiskSave { .. } => Some("Check the disk scope root is writable"),
            InjectError::MissingCodec { .. } => Some("Register a codec with DiskScope::with_codec"),
            InjectError::ConfigError { .. } => Some("Check ~/.config/weft/config.toml syntax"),
            InjectError::InvalidName { .. } => {
                Some("Names use [A-Za-z0-9_.-], an optional 'ns:' prefix and an optional trailing '*'")
            }
            InjectError::InvalidPackage { .. } => Some("Packages are '::'-separated identifiers"),
            InjectError::InvalidType { .. } => {
                Some("Pass exactly as many type arguments as the raw type declares")
            }
            InjectError::Io(_) => Some("Check file path and permissions"),
        }
    }
}
