use thiserror::Error;

/// Failures that abort an analysis request before any report is built.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported log format: {0} (expected .txt, .log or .gz)")]
    InvalidFormat(String),
    #[error("{0} is not valid UTF-8 text")]
    NotUtf8(String),
    #[error("failed to decode {source_name}: {source}")]
    Decode {
        source_name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl IngestError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        IngestError::Io { path: path.into(), source }
    }

    pub fn decode(source_name: impl Into<String>, source: serde_yaml::Error) -> Self {
        IngestError::Decode { source_name: source_name.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = IngestError::io("/var/log/app.txt", std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let msg = err.to_string();
        assert!(msg.contains("/var/log/app.txt"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn invalid_format_names_the_file() {
        let err = IngestError::InvalidFormat("trace.zip".into());
        assert!(err.to_string().contains("trace.zip"));
    }
}
