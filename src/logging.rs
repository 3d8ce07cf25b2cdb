//! Log output setup.
//!
//! teloxide puts request URLs, and with them the bot token, into its
//! transport errors. Every formatted line therefore passes through a
//! [`TokenRedactor`] before it reaches stderr.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Placeholder written in place of a bot token
pub const TOKEN_MASK: &str = "[TELEGRAM_TOKEN]";

/// Masks Telegram bot tokens in log text
pub struct TokenRedactor {
    rules: Vec<(Regex, String)>,
}

impl TokenRedactor {
    /// Compile the masking rules
    ///
    /// # Errors
    ///
    /// Returns an error if a rule fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        let rules = vec![
            // `.../bot<id>:<secret>/getUpdates` and bare `bot<id>:<secret>`
            (
                Regex::new(r"\bbot[0-9]{8,10}:[A-Za-z0-9_-]+")?,
                format!("bot{TOKEN_MASK}"),
            ),
            (
                Regex::new(r"\b[0-9]{8,10}:[A-Za-z0-9_-]{35}\b")?,
                TOKEN_MASK.to_string(),
            ),
        ];
        Ok(Self { rules })
    }

    /// Return `line` with every token masked
    #[must_use]
    pub fn redact(&self, line: &str) -> String {
        self.rules
            .iter()
            .fold(line.to_string(), |text, (pattern, mask)| {
                pattern.replace_all(&text, mask.as_str()).into_owned()
            })
    }
}

/// `MakeWriter` adapter that redacts everything written through it
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Arc<TokenRedactor>,
}

impl<M> RedactingMakeWriter<M> {
    /// Wrap `inner` so its output is redacted
    pub fn new(inner: M, redactor: TokenRedactor) -> Self {
        Self {
            inner,
            redactor: Arc::new(redactor),
        }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactedWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactedWriter {
            inner: self.inner.make_writer(),
            redactor: Arc::clone(&self.redactor),
        }
    }
}

/// Writer produced by [`RedactingMakeWriter`]
pub struct RedactedWriter<W> {
    inner: W,
    redactor: Arc<TokenRedactor>,
}

impl<W: Write> Write for RedactedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let masked = self.redactor.redact(&String::from_utf8_lossy(buf));
        self.inner.write_all(masked.as_bytes())?;
        // Report the caller's length; the masked text may be shorter or longer
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Install the global subscriber: `RUST_LOG` filter (default `info`),
/// redacted output on stderr.
pub fn init(redactor: TokenRedactor) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(RedactingMakeWriter::new(io::stderr, redactor)),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456789:AAEhBP0av28SbjoLKHpRvBRFNxB3vDxQgcE";

    #[test]
    fn test_masks_token_in_request_url() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        let line = format!("error sending request for url (https://api.telegram.org/bot{TOKEN}/getUpdates)");
        assert_eq!(
            redactor.redact(&line),
            "error sending request for url (https://api.telegram.org/bot[TELEGRAM_TOKEN]/getUpdates)"
        );
        Ok(())
    }

    #[test]
    fn test_masks_bare_token() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        let line = format!("TELEGRAM_TOKEN={TOKEN}");
        assert_eq!(redactor.redact(&line), "TELEGRAM_TOKEN=[TELEGRAM_TOKEN]");
        Ok(())
    }

    #[test]
    fn test_ordinary_lines_pass_through() -> Result<(), regex::Error> {
        let redactor = TokenRedactor::new()?;
        let line = "User 42 searches for 'torch 1:2'.";
        assert_eq!(redactor.redact(line), line);
        Ok(())
    }

    #[test]
    fn test_writer_redacts_and_reports_full_length() -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = RedactedWriter {
            inner: Vec::new(),
            redactor: Arc::new(TokenRedactor::new()?),
        };
        let line = format!("token {TOKEN}\n");
        let written = writer.write(line.as_bytes())?;

        assert_eq!(written, line.len());
        assert_eq!(String::from_utf8(writer.inner)?, "token [TELEGRAM_TOKEN]\n");
        Ok(())
    }
}
