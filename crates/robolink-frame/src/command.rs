//! Motion command tokens sent by the control server.

use std::fmt;

use crate::error::Result;

/// A decoded motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Directive {
    /// Every directive, in wire-token order.
    pub const ALL: [Directive; 5] = [
        Directive::Forward,
        Directive::Backward,
        Directive::Left,
        Directive::Right,
        Directive::Stop,
    ];

    /// Wire token for this directive.
    pub fn as_str(self) -> &'static str {
        match self {
            Directive::Forward => "FORWARD",
            Directive::Backward => "BACKWARD",
            Directive::Left => "LEFT",
            Directive::Right => "RIGHT",
            Directive::Stop => "STOP",
        }
    }

    /// Match a text token: surrounding whitespace is trimmed and case is
    /// ignored, anything else must match exactly.
    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim().to_uppercase();
        Self::ALL.into_iter().find(|d| d.as_str() == token)
    }

    /// Decode one received chunk.
    ///
    /// Invalid UTF-8 is an error. A chunk that decodes but names no known
    /// directive is `Ok(None)`, which callers treat as a no-op.
    pub fn decode(raw: &[u8]) -> Result<Option<Self>> {
        let text = std::str::from_utf8(raw)?;
        Ok(Self::parse_token(text))
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode every directive carried by one received chunk.
///
/// A server writing faster than the robot reads can coalesce several tokens
/// into one chunk, so the chunk is split on line breaks and each non-empty
/// segment is decoded on its own. Unknown segments are dropped. A token that
/// straddles two reads is not reassembled.
pub fn decode_commands(chunk: &[u8]) -> Result<Vec<Directive>> {
    let text = std::str::from_utf8(chunk)?;
    Ok(text
        .split(['\n', '\r'])
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(Directive::parse_token)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameError;

    #[test]
    fn decodes_known_tokens() {
        for directive in Directive::ALL {
            let raw = directive.as_str().as_bytes();
            assert_eq!(Directive::decode(raw).unwrap(), Some(directive));
        }
    }

    #[test]
    fn trims_and_ignores_case() {
        assert_eq!(
            Directive::decode(b"forward\n").unwrap(),
            Some(Directive::Forward)
        );
        assert_eq!(
            Directive::decode(b"  Stop \r\n").unwrap(),
            Some(Directive::Stop)
        );
        assert_eq!(Directive::decode(b"\tleft").unwrap(), Some(Directive::Left));
    }

    #[test]
    fn unknown_token_is_none() {
        assert_eq!(Directive::decode(b"frward").unwrap(), None);
        assert_eq!(Directive::decode(b"").unwrap(), None);
        assert_eq!(Directive::decode(b"FORWARD NOW").unwrap(), None);
        assert_eq!(Directive::decode(b"{\"cmd\":\"STOP\"}").unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_error() {
        let err = Directive::decode(&[0x46, 0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidUtf8(_)));
    }

    #[test]
    fn display_matches_wire_token() {
        assert_eq!(Directive::Right.to_string(), "RIGHT");
    }

    #[test]
    fn chunk_with_several_tokens() {
        let directives = decode_commands(b"FORWARD\nbogus\n\nstop\n").unwrap();
        assert_eq!(directives, [Directive::Forward, Directive::Stop]);
    }

    #[test]
    fn chunk_without_newline() {
        assert_eq!(decode_commands(b"BACKWARD").unwrap(), [Directive::Backward]);
        assert!(decode_commands(b"frward").unwrap().is_empty());
    }

    #[test]
    fn chunk_invalid_utf8_is_error() {
        assert!(matches!(
            decode_commands(b"STOP\n\xC3"),
            Err(FrameError::InvalidUtf8(_))
        ));
    }
}
