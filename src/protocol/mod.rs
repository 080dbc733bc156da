// src/protocol/mod.rs

//! The engine's line protocol.
//!
//! - [`decoder`] turns raw pipe chunks into complete lines.
//! - [`classify_stdout`] decides whether a stdout line is the readiness
//!   signal.
//! - [`encode_command`] frames an outbound command as one line.

pub mod decoder;

pub use decoder::{DecodedLine, LineDecoder, MAX_LINE_BYTES, StreamDecodeError};

/// What a stdout line means to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The line is exactly the readiness token.
    Ready,
    /// Anything else; echoed and otherwise ignored.
    Passthrough,
}

/// Classify a stdout line. Only an exact match after trimming surrounding
/// whitespace counts as readiness; the token appearing inside a longer line
/// does not.
pub fn classify_stdout(line: &str, ready_token: &str) -> LineKind {
    if line.trim() == ready_token {
        LineKind::Ready
    } else {
        LineKind::Passthrough
    }
}

/// Frame a command for the engine's stdin: the text plus exactly one `\n`.
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(b'\n');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "ENGINE_READY";

    #[test]
    fn exact_token_with_surrounding_whitespace_is_ready() {
        assert_eq!(classify_stdout("ENGINE_READY", TOKEN), LineKind::Ready);
        assert_eq!(classify_stdout("  ENGINE_READY\t", TOKEN), LineKind::Ready);
    }

    #[test]
    fn token_as_substring_is_not_ready() {
        for line in [
            "not ENGINE_READY yet",
            "ENGINE_READY!",
            "ENGINE_READY ENGINE_READY",
            "engine_ready",
            "",
        ] {
            assert_eq!(classify_stdout(line, TOKEN), LineKind::Passthrough, "{line:?}");
        }
    }

    #[test]
    fn commands_get_exactly_one_terminator() {
        assert_eq!(encode_command("How are you?"), b"How are you?\n".to_vec());
        assert_eq!(encode_command(""), b"\n".to_vec());
    }
}
