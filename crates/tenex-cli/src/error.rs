use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = format!("{err:#}").to_lowercase();

    if msg.contains("not authenticated") || msg.contains("status: 401") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Sign in through the web app, then pass its session cookie:");
        eprintln!("  {} tenex --session <session_id> whoami", "$".dimmed());
        eprintln!("  or set {} in your environment.", "TENEX_SESSION".bold());
    }

    if msg.contains("invalid session cookie") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  The session value must be a plain cookie value without spaces.");
    }

    if msg.contains("connection refused")
        || msg.contains("error sending request")
        || msg.contains("invalid url")
    {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that the chat server is running and reachable:");
        eprintln!("  {} tenex --base-url http://localhost:8000", "$".dimmed());
    }

    std::process::exit(1);
}
