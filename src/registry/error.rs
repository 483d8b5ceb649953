//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Registering would exceed the configured subscriber limit
    CapacityExceeded { max: usize },
    /// Registry has been shut down
    ShutDown,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::CapacityExceeded { max } => {
                write!(f, "Subscriber limit reached ({} max)", max)
            }
            RegistryError::ShutDown => write!(f, "Registry is shut down"),
        }
    }
}

impl std::error::Error for RegistryError {}
