use treeid_core_types::PassId;
use thiserror::Error;

/// Result type alias using ResolveError
pub type Result<T> = std::result::Result<T, ResolveError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log events, tests and any
/// host-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Malformed tree or instance map supplied by the caller; the pass aborts
    CallerContractViolation,
    /// Duplicate explicit key among siblings; recovered, first occurrence wins
    AmbiguousKey,
    /// Keep-alive cache overflowed and evicted its oldest entry; informational
    EvictionUnderPressure,
    InvalidConfig,
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::CallerContractViolation => "ERR_CALLER_CONTRACT_VIOLATION",
            ExErrorKind::AmbiguousKey => "ERR_AMBIGUOUS_KEY",
            ExErrorKind::EvictionUnderPressure => "ERR_EVICTION_UNDER_PRESSURE",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }

    /// True when the pass was refused and the prior instance map stays authoritative
    pub fn aborts_pass(&self) -> bool {
        matches!(
            self,
            ExErrorKind::CallerContractViolation
                | ExErrorKind::InvalidConfig
                | ExErrorKind::Serialization
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the tree context
/// the failure was found in.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    instance_id: Option<u64>,
    slot: Option<String>,
    pass_id: Option<PassId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            instance_id: None,
            slot: None,
            pass_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add instance context
    pub fn with_instance_id(mut self, id: u64) -> Self {
        self.instance_id = Some(id);
        self
    }

    /// Add slot context
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Add pass correlation
    pub fn with_pass_id(mut self, pass_id: PassId) -> Self {
        self.pass_id = Some(pass_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn instance_id(&self) -> Option<u64> {
        self.instance_id
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    pub fn pass_id(&self) -> Option<&PassId> {
        self.pass_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(id) = self.instance_id {
            write!(f, " (instance: i{})", id)?;
        }
        if let Some(slot) = &self.slot {
            write!(f, " (slot: {})", slot)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Failures that refuse a reconciliation pass or a configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    // ===== Caller Contract Violations =====
    /// A component node fills a slot its blueprint does not declare
    #[error("Component {blueprint} has no declared slot named '{slot}'")]
    UndeclaredSlot { blueprint: String, slot: String },

    /// Named slots on a node that is not a component
    #[error("Node of kind {kind} cannot have named slots")]
    SlotsOnNonComponent { kind: String },

    /// Tree nests deeper than the configured maximum
    #[error("Tree exceeds maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    /// The previous tree does not describe the instance map it was passed with
    #[error("Previous tree does not match the instance map: {reason}")]
    InstanceMapMismatch {
        instance_id: Option<u64>,
        reason: String,
    },

    // ===== Configuration =====
    /// Configuration failed to parse or validate
    #[error("Invalid resolver configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<ResolveError> for ExError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UndeclaredSlot { blueprint, slot } => {
                ExError::new(ExErrorKind::CallerContractViolation)
                    .with_slot(slot)
                    .with_message(format!("Slot is not declared by component {}", blueprint))
            }

            ResolveError::SlotsOnNonComponent { kind } => {
                ExError::new(ExErrorKind::CallerContractViolation)
                    .with_message(format!("Named slots on non-component node {}", kind))
            }

            ResolveError::DepthExceeded { max_depth } => {
                ExError::new(ExErrorKind::CallerContractViolation)
                    .with_message(format!("Tree exceeds maximum depth of {}", max_depth))
            }

            ResolveError::InstanceMapMismatch {
                instance_id,
                reason,
            } => {
                let err = ExError::new(ExErrorKind::CallerContractViolation)
                    .with_message(format!("Instance map mismatch: {}", reason));
                match instance_id {
                    Some(id) => err.with_instance_id(id),
                    None => err,
                }
            }

            ResolveError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }

            ResolveError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ResolveError
impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        ResolveError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from toml::de::Error to ResolveError
impl From<toml::de::Error> for ResolveError {
    fn from(err: toml::de::Error) -> Self {
        ResolveError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
