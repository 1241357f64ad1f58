//! Interactive console: one question per line until `exit`/`quit` or EOF.

use crate::agent::Agent;
use colored::Colorize;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

/// Inputs (after trim + lowercase) that end the session.
pub const EXIT_WORDS: &[&str] = &["exit", "quit"];

pub fn is_exit_command(line: &str) -> bool {
    let folded = line.trim().to_lowercase();
    EXIT_WORDS.contains(&folded.as_str())
}

/// Run the read-eval loop and return how many queries were answered or failed.
///
/// A failed query is reported and the session continues; only I/O errors
/// on the console itself end it early.
pub async fn run_repl<R, W>(agent: &dyn Agent, mut input: R, output: &mut W) -> io::Result<u32>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}\n", "Research Assistant Ready!".green().bold()).as_bytes())
        .await?;

    let mut handled = 0;
    let mut line = String::new();
    loop {
        output
            .write_all(b"\nAsk a question (or type 'exit'): ")
            .await?;
        output.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            output.write_all(b"\n").await?;
            break;
        }
        if is_exit_command(&line) {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        handled += 1;
        let rendered = match agent.run(query).await {
            Ok(response) => format!("\n{}\n{}\n", "Response:".cyan().bold(), response),
            Err(e) => {
                error!("Query failed: {}", e);
                format!("{} {}\n", "Error:".red().bold(), e.user_message())
            }
        };
        output.write_all(rendered.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(handled)
}
