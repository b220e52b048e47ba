//! Chat command handler.
//!
//! Interactive loop over one session. Lines starting with `:` are session
//! commands; anything else is a question.

use super::ask::print_reviews;
use clap::Args;
use reviewlens_core::config::{AccessMode, AppConfig};
use reviewlens_core::AppResult;
use reviewlens_rag::{ReviewPipeline, Session, StaticSecretResolver};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands:
  :login <secret>   bind this session to your business
  :logout           end the login
  :whoami           show the bound business
  :help             show this help
  :quit             leave";

/// Interactive session with login
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Restrict retrieval to one business (open mode)
    #[arg(short, long)]
    pub business_id: Option<String>,

    /// Print the retrieved reviews after each answer
    #[arg(long)]
    pub show_reviews: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Login(&'a str),
    Logout,
    WhoAmI,
    Help,
    Quit,
    Unknown(&'a str),
    Question(&'a str),
}

fn parse_line(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }

    let Some(command) = line.strip_prefix(':') else {
        return ChatInput::Question(line);
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match name {
        "login" => ChatInput::Login(rest),
        "logout" => ChatInput::Logout,
        "whoami" => ChatInput::WhoAmI,
        "help" => ChatInput::Help,
        "quit" | "exit" | "q" => ChatInput::Quit,
        _ => ChatInput::Unknown(name),
    }
}

/// Bind `session` through `resolver`. `Ok` and `Err` carry the line to show.
fn login_reply(
    session: &mut Session,
    resolver: &StaticSecretResolver,
    secret: &str,
) -> Result<String, String> {
    if secret.is_empty() {
        return Err("Usage: :login <secret>".to_string());
    }
    if resolver.is_empty() {
        return Err("No login secrets are configured".to_string());
    }

    match session.login(resolver, secret) {
        Ok(business_id) => Ok(format!("Logged in as {}", business_id)),
        Err(e) => Err(e.to_string()),
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let pipeline = ReviewPipeline::from_config(config)?;
        let resolver = StaticSecretResolver::new(config.access.secrets.clone());
        let mut session = Session::new();
        tracing::debug!(
            "Session {} started ({} login secret(s) configured)",
            session.id(),
            resolver.len()
        );

        println!("Ask a question about your reviews. Type :help for commands.");
        if pipeline.access_mode() == AccessMode::Gated {
            println!("Log in with :login <secret> before asking.");
        }

        let mut reader = BufReader::new(tokio::io::stdin());
        let mut line = String::new();

        loop {
            print!("{}> ", session.business_id().unwrap_or(""));
            std::io::stdout().flush()?;

            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                println!();
                break;
            }

            match parse_line(&line) {
                ChatInput::Empty => {}
                ChatInput::Login(secret) => match login_reply(&mut session, &resolver, secret) {
                    Ok(reply) => println!("{}", reply),
                    Err(reply) => eprintln!("{}", reply),
                },
                ChatInput::Logout => {
                    session.logout();
                    println!("Logged out");
                }
                ChatInput::WhoAmI => match session.business_id() {
                    Some(business_id) => println!("{}", business_id),
                    None => println!("Not logged in"),
                },
                ChatInput::Help => println!("{}", HELP),
                ChatInput::Quit => break,
                ChatInput::Unknown(name) => println!("Unknown command ':{}'. Type :help.", name),
                ChatInput::Question(question) => {
                    match pipeline
                        .ask(&session, question, self.business_id.as_deref())
                        .await
                    {
                        Ok(outcome) => {
                            println!("{}", outcome.answer);
                            if self.show_reviews {
                                print_reviews(&outcome);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Question failed during {}: {}", e.stage(), e);
                            eprintln!("{}", e);
                        }
                    }
                }
            }
        }

        tracing::debug!("Session {} ended", session.id());
        Ok(())
    }
}
