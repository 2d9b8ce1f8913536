use anyhow::{Result, anyhow, bail};
use std::sync::Arc;
use tenex_chat::{
    ChatSession, ChatTransport, ClientConfig, HttpChatTransport, SendOutcome, SendRejected,
};

use crate::cli::SendArgs;
use crate::output::text::StreamRenderer;
use crate::output::{OutputFormat, json::print_json};

pub async fn run(client: ClientConfig, args: SendArgs, format: OutputFormat) -> Result<()> {
    let transport = HttpChatTransport::new(client)?;

    if args.no_stream {
        return send_whole(&transport, &args.message, format).await;
    }

    let mut session = ChatSession::new(Arc::new(transport));
    let mut renderer = StreamRenderer::stdout();
    let mut write_error = None;

    let outcome = session
        .send_user_message_with(&args.message, |message| {
            if format.is_json() || write_error.is_some() {
                return;
            }
            if let Err(e) = renderer.update(message) {
                write_error = Some(e);
            }
        })
        .await;

    if let Some(e) = write_error {
        return Err(e.into());
    }

    match outcome {
        SendOutcome::Rejected(SendRejected::Blank) => bail!("Message is empty"),
        SendOutcome::Rejected(SendRejected::Busy) => bail!("A reply is already streaming"),
        SendOutcome::Completed { .. } => {
            if format.is_json() {
                print_json(session.transcript())?;
            } else {
                renderer.finish()?;
            }
            Ok(())
        }
        SendOutcome::Failed { message_id } => {
            if format.is_json() {
                print_json(session.transcript())?;
            } else {
                renderer.finish()?;
            }
            let detail = session
                .transcript()
                .get(&message_id)
                .and_then(|m| m.error.clone())
                .unwrap_or_default();
            let summary = session.error().unwrap_or(tenex_chat::SEND_FAILURE_MESSAGE);
            Err(anyhow!("{summary} ({detail})"))
        }
    }
}

async fn send_whole(
    transport: &HttpChatTransport,
    message: &str,
    format: OutputFormat,
) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        bail!("Message is empty");
    }

    tracing::info!("Sending message without streaming");
    let response = transport.send_message(message).await?;

    if format.is_json() {
        return print_json(&response);
    }
    println!("{}", response.response);
    Ok(())
}
