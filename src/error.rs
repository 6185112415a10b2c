use thiserror::Error;

/// Pipeline failure, one variant per stage. The message strings inside
/// are the user-facing ones; this type only says where they came from.
#[derive(Debug, Error)]
pub enum MonkeyError {
    #[error("parser errors:\n{}", .0.join("\n"))]
    Parse(Vec<String>),

    #[error("compiler error: {0}")]
    Compile(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
