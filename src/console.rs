/*!
 * Console I/O
 *
 * Prompts and whitespace-delimited token reads for the duplex exchange.
 *
 * Controller and worker share one standard input. Tokens are read one byte
 * at a time straight from the descriptor so the controller never buffers
 * input that belongs to the worker.
 */

use crate::core::limits::MAX_CONSOLE_TOKEN_BYTES;
use miette::Diagnostic;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::AsFd;
use thiserror::Error;

/// Console operation result
pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug, Error, Diagnostic)]
pub enum ConsoleError {
    #[error("standard input ended before a token was entered")]
    #[diagnostic(code(console::end_of_input), help("Provide one word per prompt."))]
    EndOfInput,

    #[error("token longer than {max} bytes")]
    #[diagnostic(code(console::token_too_long))]
    TokenTooLong { max: usize },

    #[error("token is not valid UTF-8")]
    #[diagnostic(code(console::not_utf8))]
    NotUtf8,

    #[error("console I/O failed: {0}")]
    #[diagnostic(code(console::io))]
    Io(#[from] io::Error),
}

/// Unbuffered reader over a duplicate of the standard input descriptor
#[derive(Debug)]
pub struct RawStdin {
    file: File,
}

impl RawStdin {
    pub fn new() -> ConsoleResult<Self> {
        let owned = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(Self {
            file: File::from(owned),
        })
    }
}

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Write a prompt without a trailing newline and flush it
pub fn prompt<W: Write>(out: &mut W, text: &str) -> ConsoleResult<()> {
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Read one whitespace-delimited token
///
/// Leading whitespace is skipped; the token ends at the first whitespace byte
/// (consumed) or at end of input. Nothing past that byte is read.
pub fn read_token<R: Read>(reader: &mut R, max: usize) -> ConsoleResult<String> {
    let mut token = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let n = match reader.read(&mut byte) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if n == 0 {
            break;
        }

        if byte[0].is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            break;
        }

        if token.len() == max {
            return Err(ConsoleError::TokenTooLong { max });
        }
        token.push(byte[0]);
    }

    if token.is_empty() {
        return Err(ConsoleError::EndOfInput);
    }

    String::from_utf8(token).map_err(|_| ConsoleError::NotUtf8)
}

/// Prompt on stdout, then read one token from the raw standard input
pub fn ask(text: &str) -> ConsoleResult<String> {
    prompt(&mut io::stdout(), text)?;
    let mut stdin = RawStdin::new()?;
    read_token(&mut stdin, MAX_CONSOLE_TOKEN_BYTES)
}
