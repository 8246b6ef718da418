use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The line terminator used by a text file.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n`, used on Unix and by default for new files.
    #[default]
    Lf,
    /// `\r\n`, as written by most Windows editors.
    Crlf,
}

impl LineEnding {
    /// Detect the line ending of the given contents.
    ///
    /// The first line break decides: if it is preceded by `\r`, the contents use CRLF; otherwise
    /// LF. Contents without any line break use the default (LF). Mixed line endings are not
    /// supported, so later line breaks are not inspected.
    pub fn detect(contents: impl AsRef<[u8]>) -> Self {
        let contents = contents.as_ref();
        match contents.iter().position(|&byte| byte == b'\n') {
            Some(index) if index > 0 && contents[index - 1] == b'\r' => Self::Crlf,
            _ => Self::Lf,
        }
    }

    /// Return the line terminator as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Rewrite every line break in `contents` to use this line ending.
    ///
    /// Line breaks are first normalized to `\n` and then re-expanded, so contents that already
    /// use this style are returned unchanged.
    pub fn normalize(self, contents: &str) -> String {
        let normalized = contents.replace("\r\n", "\n");
        match self {
            Self::Lf => normalized,
            Self::Crlf => normalized.replace('\n', "\r\n"),
        }
    }
}

impl Display for LineEnding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lf => f.write_str("lf"),
            Self::Crlf => f.write_str("crlf"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown line ending `{0}`; expected one of `lf` or `crlf`")]
pub struct LineEndingError(String);

impl FromStr for LineEnding {
    type Err = LineEndingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\n" => Ok(Self::Lf),
            "\r\n" => Ok(Self::Crlf),
            s if s.eq_ignore_ascii_case("lf") => Ok(Self::Lf),
            s if s.eq_ignore_ascii_case("crlf") => Ok(Self::Crlf),
            _ => Err(LineEndingError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use test_case::test_case;

    use super::LineEnding;

    #[test_case(b"", LineEnding::Lf; "empty")]
    #[test_case(b"[packages]", LineEnding::Lf; "no newline")]
    #[test_case(b"[packages]\npytz = \"*\"\n", LineEnding::Lf; "lf")]
    #[test_case(b"[packages]\r\npytz = \"*\"\r\n", LineEnding::Crlf; "crlf")]
    #[test_case(b"\r\n", LineEnding::Crlf; "crlf only")]
    #[test_case(b"[packages]\npytz = \"*\"\r\n", LineEnding::Lf; "mixed lf first")]
    #[test_case(b"[packages]\r\npytz = \"*\"\n", LineEnding::Crlf; "mixed crlf first")]
    #[test_case(b"a\rb\nc", LineEnding::Lf; "lone carriage return")]
    fn detect(contents: &[u8], expected: LineEnding) {
        assert_eq!(LineEnding::detect(contents), expected);
    }

    #[test]
    fn normalize_to_crlf() {
        assert_eq!(
            LineEnding::Crlf.normalize("[packages]\npytz = \"*\"\r\n"),
            "[packages]\r\npytz = \"*\"\r\n"
        );
    }

    #[test]
    fn normalize_to_lf() {
        assert_eq!(
            LineEnding::Lf.normalize("[packages]\r\npytz = \"*\"\n"),
            "[packages]\npytz = \"*\"\n"
        );
    }

    #[test_case(LineEnding::Lf)]
    #[test_case(LineEnding::Crlf)]
    fn normalize_is_idempotent(line_ending: LineEnding) {
        let once = line_ending.normalize("[[source]]\nname = \"pypi\"\r\n\n");
        let twice = line_ending.normalize(&once);
        assert_eq!(once, twice);
        assert_eq!(LineEnding::detect(&twice), line_ending);
    }

    #[test]
    fn parse() {
        assert_eq!(LineEnding::from_str("lf").unwrap(), LineEnding::Lf);
        assert_eq!(LineEnding::from_str("CRLF").unwrap(), LineEnding::Crlf);
        assert_eq!(LineEnding::from_str("\r\n").unwrap(), LineEnding::Crlf);
        assert!(LineEnding::from_str("cr").is_err());
    }
}
