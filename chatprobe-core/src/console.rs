//! Console rendering of a probe outcome
//!
//! Exactly one line per probe: the reply, a service-reported error, or
//! anything else.

use crate::error::{CompletionError, ErrorClass};
use crate::issuer::Reply;
use std::io::{self, Write};

pub const ASSISTANT_PREFIX: &str = "Assistant:";
pub const API_ERROR_PREFIX: &str = "OpenAI API error:";
pub const UNEXPECTED_ERROR_PREFIX: &str = "Unexpected error:";

/// Shown in place of content the service returned as null
pub const NULL_CONTENT: &str = "null";

/// Render an outcome as its console line (without the trailing newline)
pub fn render(outcome: &Result<Reply, CompletionError>) -> String {
    match outcome {
        Ok(reply) => format!(
            "{} {}",
            ASSISTANT_PREFIX,
            reply.content.as_deref().unwrap_or(NULL_CONTENT)
        ),
        Err(err) => {
            let prefix = match err.class() {
                ErrorClass::Api => API_ERROR_PREFIX,
                ErrorClass::Unexpected => UNEXPECTED_ERROR_PREFIX,
            };
            format!("{} {}", prefix, err)
        }
    }
}

/// Write the console line for an outcome
pub fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &Result<Reply, CompletionError>,
) -> io::Result<()> {
    writeln!(out, "{}", render(outcome))?;
    out.flush()
}
