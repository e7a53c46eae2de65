//! Interactive question-answering loop.
//!
//! Single-threaded, synchronous request/response loop over pluggable
//! input/output boundaries: a blank line silently reprompts, the quit
//! sentinel (case-insensitive) terminates cleanly, and anything else is
//! treated as a query. Every question is independent — there is no
//! conversation memory across turns.
//!
//! Per question: the index is queried with diversification enabled and a
//! `fetch_k` candidate pool, the returned chunks are joined in result
//! order with blank lines into one context string, a grounding prompt is
//! composed, and the chat model's reply is printed verbatim. When
//! retrieval returns nothing the fixed fallback message is emitted
//! without a chat call.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::chat::ChatModel;
use crate::config::RetrievalConfig;
use crate::prompt;
use crate::store::VectorIndex;

/// Termination token, matched case-insensitively after trimming.
pub const QUIT_SENTINEL: &str = "quit";

const PROMPT: &str =
    "Ask a question about your documentation and press enter. To terminate, simply type \"quit\" and press enter.";
const FAREWELL: &str = "Thank you for using Docs Copilot.";

/// Classification of one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Blank,
    Quit,
    Question(String),
}

/// Classify a raw input line.
pub fn classify(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Blank
    } else if trimmed.eq_ignore_ascii_case(QUIT_SENTINEL) {
        Input::Quit
    } else {
        Input::Question(trimmed.to_string())
    }
}

/// Run the interactive loop until the quit sentinel or end of input.
/// Provider failures are fatal to the current question only: the error
/// is reported and the loop keeps accepting input.
pub async fn run_loop<R: BufRead, W: Write>(
    retrieval: &RetrievalConfig,
    index: &VectorIndex,
    chat: &dyn ChatModel,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    loop {
        writeln!(output, "\n{}", PROMPT)?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // End of input terminates like the sentinel
            writeln!(output, "{}", FAREWELL)?;
            return Ok(());
        }

        match classify(&line) {
            Input::Blank => continue,
            Input::Quit => {
                writeln!(output, "{}", FAREWELL)?;
                return Ok(());
            }
            Input::Question(question) => {
                match answer_question(retrieval, index, chat, &question).await {
                    Ok(answer) => writeln!(output, "{}", answer)?,
                    Err(e) => writeln!(output, "Error: {}", e)?,
                }
            }
        }
    }
}

/// Answer a single question from the index.
async fn answer_question(
    retrieval: &RetrievalConfig,
    index: &VectorIndex,
    chat: &dyn ChatModel,
    question: &str,
) -> Result<String> {
    let chunks = index
        .query(
            question,
            retrieval.k,
            true,
            retrieval.fetch_k,
            retrieval.lambda,
        )
        .await?;

    if chunks.is_empty() {
        return Ok(prompt::FALLBACK.to_string());
    }

    let context = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    chat.complete(&prompt::compose(&context, question)).await
}
