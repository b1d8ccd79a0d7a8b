//! Bot-address detection.
//!
//! Transports decide whether a message addresses the bot by looking for a
//! prefix in the raw provider text. The text after the prefix becomes the
//! event's argument text.

/// How a message addresses the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressPrefix {
    /// An exact mention token (e.g. `<@U024BE7LH>`) followed by whitespace
    /// or the end of the text.
    Mention(String),
    /// A fixed literal prefix (e.g. `/phoenix `).
    Literal {
        /// The prefix text.
        prefix: String,
        /// Compare ASCII case-insensitively.
        ignore_case: bool,
    },
}

impl AddressPrefix {
    /// Creates a mention prefix.
    pub fn mention(token: impl Into<String>) -> Self {
        Self::Mention(token.into())
    }

    /// Creates a case-sensitive literal prefix.
    pub fn literal(prefix: impl Into<String>) -> Self {
        Self::Literal {
            prefix: prefix.into(),
            ignore_case: false,
        }
    }

    /// Creates a case-insensitive literal prefix.
    pub fn literal_ignore_case(prefix: impl Into<String>) -> Self {
        Self::Literal {
            prefix: prefix.into(),
            ignore_case: true,
        }
    }

    /// Returns the argument text if `text` addresses the bot.
    ///
    /// Whitespace between the prefix and the arguments is dropped.
    pub fn strip<'a>(&self, text: &'a str) -> Option<&'a str> {
        let rest = match self {
            Self::Mention(token) => {
                let rest = text.strip_prefix(token.as_str())?;
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                rest
            }
            Self::Literal {
                prefix,
                ignore_case: false,
            } => text.strip_prefix(prefix.as_str())?,
            Self::Literal {
                prefix,
                ignore_case: true,
            } => {
                let head = text.get(..prefix.len())?;
                if !head.eq_ignore_ascii_case(prefix) {
                    return None;
                }
                &text[prefix.len()..]
            }
        };
        Some(rest.trim_start())
    }

    /// Returns true if `text` addresses the bot.
    pub fn matches(&self, text: &str) -> bool {
        self.strip(text).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_requires_token_boundary() {
        let prefix = AddressPrefix::mention("<@U1>");
        assert_eq!(prefix.strip("<@U1> ping"), Some("ping"));
        assert_eq!(prefix.strip("<@U1>   ping  now"), Some("ping  now"));
        assert_eq!(prefix.strip("<@U1>"), Some(""));
        assert_eq!(prefix.strip("<@U12> ping"), None);
        assert_eq!(prefix.strip("hey <@U1> ping"), None);
    }

    #[test]
    fn test_literal_case_sensitivity() {
        let exact = AddressPrefix::literal("!bot ");
        assert_eq!(exact.strip("!bot help"), Some("help"));
        assert_eq!(exact.strip("!BOT help"), None);

        let loose = AddressPrefix::literal_ignore_case("/phoenix ");
        assert_eq!(loose.strip("/PHOENIX deploy"), Some("deploy"));
        assert!(loose.matches("/phoenix "));
        assert!(!loose.matches("/phoe"));
    }

    #[test]
    fn test_ignore_case_does_not_split_multibyte_chars() {
        let prefix = AddressPrefix::literal_ignore_case("ab");
        assert_eq!(prefix.strip("a\u{e9}x"), None);
    }
}
