//! `sopchat chat` — Interactive or single-question chat mode.

use sopchat_agent::prompts::REWRITE_SENTINEL;
use sopchat_agent::Assistant;
use sopchat_config::AppConfig;
use sopchat_core::error::Error;
use sopchat_core::message::Role;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(question: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let mut assistant = match Assistant::from_config(&config) {
        Ok(assistant) => assistant,
        Err(Error::MissingCredential) => {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set the environment variable:");
            eprintln!("    export OPENAI_API_KEY='sk-...'");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err("No API key found. See above for setup instructions.".into());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(q) = question {
        // Single question mode
        eprint!("  Thinking...");
        let answer = assistant.send(&q).await?;
        eprint!("\r              \r");
        println!("{answer}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  sopchat — SOP Assistant");
    println!();
    println!("  Chat model:    {}", config.chat_model);
    println!("  Rewrite model: {}", config.rewrite_model);
    println!("  Store:         {} ({})", config.retrieval.backend, config.retrieval.collection);
    println!();
    println!("  Type your question and press Enter.");
    println!("  '/up [comment]' or '/down [comment]' leave feedback on the last answer.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    render_visible(assistant.session().messages.iter().map(|m| (m.role, m.content.as_str())));

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    prompt_marker()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            prompt_marker()?;
            continue;
        }
        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        if let Some((thumbs_up, comment)) = parse_feedback(&line) {
            assistant.record_feedback(thumbs_up, comment);
            println!("  Feedback recorded!");
            prompt_marker()?;
            continue;
        }

        eprint!("  ...");
        match assistant.send(&line).await {
            Ok(answer) => {
                eprint!("\r     \r");
                println!();
                for answer_line in answer.lines() {
                    println!("  Assistant > {answer_line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        prompt_marker()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt_marker() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Parse a feedback command: the first whitespace-delimited token must
/// be exactly `/up` or `/down`, followed by an optional comment.
fn parse_feedback(line: &str) -> Option<(bool, Option<&str>)> {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    match command {
        "/up" => Some((true, non_empty(rest))),
        "/down" => Some((false, non_empty(rest))),
        _ => None,
    }
}

/// Print the user-facing transcript: system and tool messages stay
/// hidden, as do rewritten-query marker messages.
fn render_visible<'a>(messages: impl Iterator<Item = (Role, &'a str)>) {
    for (role, content) in messages {
        if !is_visible(role, content) {
            continue;
        }
        let label = match role {
            Role::User => "You",
            _ => "Assistant",
        };
        println!("  {label} > {content}");
    }
}

fn is_visible(role: Role, content: &str) -> bool {
    !matches!(role, Role::System | Role::Tool) && !content.contains(REWRITE_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_and_tool_messages_are_hidden() {
        assert!(!is_visible(Role::System, "rules"));
        assert!(!is_visible(Role::Tool, "context block"));
        assert!(is_visible(Role::Assistant, "How can I help you?"));
        assert!(is_visible(Role::User, "What is the refund policy?"));
    }

    #[test]
    fn rewritten_query_markers_are_hidden() {
        assert!(!is_visible(Role::User, "QUERY_CLEAN\nrefund policy"));
    }

    #[test]
    fn feedback_comment_parsing() {
        assert_eq!(non_empty("  too vague "), Some("too vague"));
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
    }

    #[test]
    fn feedback_commands_match_exact_token_only() {
        assert_eq!(parse_feedback("/up"), Some((true, None)));
        assert_eq!(parse_feedback("/up too vague"), Some((true, Some("too vague"))));
        assert_eq!(parse_feedback("/down"), Some((false, None)));
        assert_eq!(parse_feedback("/down wrong SOP"), Some((false, Some("wrong SOP"))));

        assert_eq!(parse_feedback("/upstream issue"), None);
        assert_eq!(parse_feedback("/downtime"), None);
        assert_eq!(parse_feedback("what about /up?"), None);
    }
}
