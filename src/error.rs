use thiserror::Error;

/// Everything that can stop the harness from producing a record line.
///
/// None of these are swallowed by the harness: they all end the process
/// abnormally so the fuzzing engine records the input as a finding.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The URL library rejected the input
    #[error("malformed URL: {0}")]
    MalformedUrl(#[from] url::ParseError),

    /// The input bytes are not UTF-8 and cannot be handed to the parser
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Reading stdin or writing stdout failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be turned into a JSON line
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A line that was expected to be a serialized record is not one
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_convert() {
        let err: HarnessError = url::Url::parse("no scheme here").unwrap_err().into();
        assert!(matches!(err, HarnessError::MalformedUrl(_)));
        assert!(err.to_string().starts_with("malformed URL"));
    }

    #[test]
    fn utf8_errors_convert() {
        let bytes = [0x68, 0xff, 0x74];
        let err: HarnessError = std::str::from_utf8(&bytes).unwrap_err().into();
        assert!(matches!(err, HarnessError::InvalidUtf8(_)));
    }
}
