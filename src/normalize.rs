//! Text canonicalization applied to both sides before comparison.

/// Unifies line endings to `\n` and trims surrounding whitespace from the whole text.
///
/// `\r\n` and lone `\r` both become `\n`. Whitespace inside the text, including
/// trailing spaces on inner lines, is left untouched.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_line_endings() {
        assert_eq!(normalize("a\r\nb"), normalize("a\nb"));
        assert_eq!(normalize("a\rb"), "a\nb");
    }

    #[test]
    fn trims_whole_text_only() {
        assert_eq!(normalize("\n  a  \n b \n\n"), "a  \n b");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "",
            "   ",
            "a\r\n\r\nb\r",
            "\r\r\n x \r\n",
            "line 1: bad character '@'\r\n",
            "\t tabs\tinside\t\n",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
