use std::io::{self, Write};

use colored::Colorize;
use tenex_chat::{ChatMessage, Sender, Transcript};

/// Prints an agent reply incrementally as its text grows.
pub struct StreamRenderer<W: Write> {
    out: W,
    printed: usize,
}

impl StreamRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StreamRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    /// Write whatever part of `message.text` has not been written yet.
    pub fn update(&mut self, message: &ChatMessage) -> io::Result<()> {
        // Text only ever grows by appending, so the printed prefix is stable.
        let Some(delta) = message.text.get(self.printed..) else {
            return Ok(());
        };
        if !delta.is_empty() {
            self.out.write_all(delta.as_bytes())?;
            self.out.flush()?;
            self.printed = message.text.len();
        }
        Ok(())
    }

    /// End the reply line.
    pub fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn sender_label(sender: Sender) -> String {
    match sender {
        Sender::User => "You".cyan().bold().to_string(),
        Sender::Agent => "Agent".green().bold().to_string(),
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    let mut line = format!(
        "{} {} {}",
        message.timestamp.format("%H:%M").to_string().dimmed(),
        sender_label(message.sender),
        message.text
    );
    if message.is_streaming() {
        line.push_str(&format!(" {}", "[streaming]".dimmed()));
    }
    if let Some(error) = &message.error {
        line.push_str(&format!(" {}", format!("[{error}]").red()));
    }
    line
}

pub fn print_transcript(transcript: &Transcript) {
    if transcript.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    for message in transcript.messages() {
        println!("{}", format_message(message));
    }
    if let Some(error) = transcript.error() {
        println!("{}", error.red());
    }
}
