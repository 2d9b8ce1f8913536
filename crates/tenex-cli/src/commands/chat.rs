use anyhow::Result;
use colored::Colorize;
use std::future::Future;
use std::io::Write;
use tenex_chat::{
    ChatSession, ClientConfig, HttpChatTransport, PendingReply, SendRejected, spawn_chunk_channel,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::task::JoinHandle;

use crate::output::text::{StreamRenderer, print_transcript, sender_label};

/// Slash commands understood by the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Clear,
    History,
    Exit,
    Unknown(String),
}

impl ReplCommand {
    /// `None` when the line is a message rather than a command.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let name = line.strip_prefix('/')?;
        let command = match name.split_whitespace().next().unwrap_or_default() {
            "help" | "?" => ReplCommand::Help,
            "clear" => ReplCommand::Clear,
            "history" => ReplCommand::History,
            "exit" | "quit" => ReplCommand::Exit,
            other => ReplCommand::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// What the prompt produced
#[derive(Debug, PartialEq, Eq)]
pub enum PromptInput {
    Line(String),
    /// Ctrl-C while waiting for input.
    Interrupted,
    /// Input closed (Ctrl-D).
    Closed,
}

/// Wait for the next input line or for `interrupt`, whichever comes first.
pub async fn next_input<R, I>(lines: &mut Lines<R>, interrupt: I) -> std::io::Result<PromptInput>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    tokio::select! {
        line = lines.next_line() => Ok(match line? {
            Some(line) => PromptInput::Line(line),
            None => PromptInput::Closed,
        }),
        _ = interrupt => Ok(PromptInput::Interrupted),
    }
}

async fn ctrl_c() {
    // Without a signal handler Ctrl-C can never be observed here.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub async fn run(client: ClientConfig) -> Result<()> {
    let capacity = client.channel_capacity;
    let base_url = client.base_url.clone();
    let transport = HttpChatTransport::new(client)?;
    let mut session = ChatSession::new(std::sync::Arc::new(transport));

    println!("{} {}", "Tenex chat".bold(), base_url.dimmed());
    println!("{}", "Type /help for commands, Ctrl-C or Ctrl-D to quit.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan().bold());
        std::io::stdout().flush()?;

        let line = match next_input(&mut lines, ctrl_c()).await? {
            PromptInput::Line(line) => line,
            PromptInput::Interrupted | PromptInput::Closed => {
                println!();
                break;
            }
        };

        match ReplCommand::parse(&line) {
            Some(ReplCommand::Exit) => break,
            Some(ReplCommand::Help) => print_help(),
            Some(ReplCommand::Clear) => {
                session.clear_messages();
                println!("{}", "Transcript cleared.".dimmed());
            }
            Some(ReplCommand::History) => print_transcript(session.transcript()),
            Some(ReplCommand::Unknown(name)) => {
                println!("Unknown command /{name}. Type /help for commands.");
            }
            None => stream_reply(&mut session, &line, capacity).await?,
        }
    }

    Ok(())
}

fn print_help() {
    println!("  /help     Show this help");
    println!("  /clear    Clear the transcript");
    println!("  /history  Print the transcript");
    println!("  /exit     Leave the chat");
    println!("  Ctrl-C    Cancel the reply being streamed, or quit at the prompt");
}

/// Send one line and print the reply as it streams in.
async fn stream_reply(session: &mut ChatSession, text: &str, capacity: usize) -> Result<()> {
    let reply = match session.begin_send(text) {
        Ok(reply) => reply,
        Err(SendRejected::Blank) => return Ok(()),
        Err(SendRejected::Busy) => {
            println!("{}", "Still waiting for the previous reply.".yellow());
            return Ok(());
        }
    };

    let (mut chunks, producer) =
        spawn_chunk_channel(session.transport(), reply.text.clone(), capacity);

    print!("{} ", sender_label(tenex_chat::Sender::Agent));
    let mut renderer = StreamRenderer::stdout();

    let finished = loop {
        tokio::select! {
            item = chunks.recv() => match item {
                Some(Ok(chunk)) => {
                    let progress = session.apply_chunk(&reply, chunk);
                    render(session, &reply, &mut renderer)?;
                    if progress.is_finished() {
                        break true;
                    }
                }
                Some(Err(error)) => {
                    session.fail_reply(&reply, &error);
                    break true;
                }
                None => break false,
            },
            _ = ctrl_c() => {
                cancel(session, &reply, &producer);
                renderer.finish()?;
                println!("{}", "[cancelled]".yellow());
                return Ok(());
            }
        }
    };

    if !finished {
        session.finish_reply(&reply);
    }
    renderer.finish()?;

    if let Some(error) = session.error() {
        let detail = session
            .transcript()
            .get(&reply.message_id)
            .and_then(|m| m.error.as_deref())
            .unwrap_or_default();
        println!("{} {}", error.red(), detail.dimmed());
    }
    Ok(())
}

fn render(
    session: &ChatSession,
    reply: &PendingReply,
    renderer: &mut StreamRenderer<std::io::Stdout>,
) -> std::io::Result<()> {
    match session.transcript().get(&reply.message_id) {
        Some(message) => renderer.update(message),
        None => Ok(()),
    }
}

fn cancel(session: &mut ChatSession, reply: &PendingReply, producer: &JoinHandle<()>) {
    producer.abort();
    session.cancel_reply(reply);
    tracing::info!(message_id = %reply.message_id, "Reply cancelled");
}
