pub mod commands;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::commands::Commands;
use crate::client::{ChatSession, ClientError, PersistPolicy, RelayClient};
use crate::config::AppConfig;
use crate::db::{ConversationStore, DuckDbStore};
use crate::identity::{IdentityProvider, MemoryIdentityProvider};
use crate::llm::models::Role;

pub async fn run_cli(command: Commands, config_path: String) -> Result<()> {
    let config = AppConfig::load(&config_path).context("Failed to load config")?;

    match command {
        Commands::Serve => {
            bail!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::History { user, clear } => {
            let store = DuckDbStore::open(&config.database)?;
            if clear {
                let removed = store.clear(&user)?;
                println!("Deleted {} messages for {}", removed, user);
                return Ok(());
            }

            let messages = store.load(&user).await?;
            if messages.is_empty() {
                println!("No messages found.");
            }
            for m in messages {
                println!("[{}] {}:", m.timestamp.format("%Y-%m-%d %H:%M:%S"), m.role.as_str().to_uppercase());
                if let Some(reasoning) = m.reasoning.as_deref().filter(|r| !r.is_empty()) {
                    println!("  (reasoning) {}", reasoning.replace('\n', "\n  "));
                }
                println!("{}", m.content);
                println!("---");
            }
        }
        Commands::Chat {
            relay,
            email,
            password,
            sign_up,
            no_stream,
        } => {
            let relay = RelayClient::new(relay.unwrap_or_else(|| config.client.relay_url.clone()));
            let streaming = config.client.stream && !no_stream;

            let session = match (email, password) {
                (Some(email), Some(password)) => {
                    let identity = MemoryIdentityProvider::from_config(&config.identity);
                    let user = if sign_up {
                        identity.sign_up(&email, &password).await?
                    } else {
                        identity.sign_in(&email, &password).await?
                    };
                    println!("Signed in as {} (user id {})", user.email, user.id);

                    let store: Arc<dyn ConversationStore> = Arc::new(DuckDbStore::open(&config.database)?);
                    ChatSession::restore(store, user.id)
                        .await?
                        .with_policy(PersistPolicy::from_interval_ms(config.client.persist_interval_ms))
                }
                _ => ChatSession::anonymous(),
            };

            run_repl(session, relay, streaming).await?;
        }
    }

    Ok(())
}

async fn run_repl(mut session: ChatSession, relay: RelayClient, streaming: bool) -> Result<()> {
    println!("--- Relaychat Terminal Chat ---");
    println!("Type /exit to quit.");
    println!("-------------------------------");

    for entry in session.conversation().entries() {
        let label = match entry.message.role {
            Role::User => "User",
            Role::Assistant => "AI",
        };
        println!("{}> {}", label, entry.message.content);
    }

    loop {
        print!("\nUser> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let text = input.trim();

        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        print!("AI> ");
        io::stdout().flush()?;

        let result = session
            .submit(&relay, text, streaming, |delta| {
                print!("{}", delta);
                let _ = io::stdout().flush();
            })
            .await;

        match result {
            Ok(()) => {
                if !streaming {
                    if let Some(last) = session.conversation().last() {
                        if let Some(reasoning) = last.message.reasoning.as_deref() {
                            println!("(reasoning) {}", reasoning);
                        }
                        print!("{}", last.message.content);
                    }
                }
                println!();
            }
            Err(e @ ClientError::Relay { .. }) => eprintln!("\nError: {}", e),
            Err(e) => {
                tracing::debug!("turn failed: {:?}", e);
                eprintln!("\nNetwork error, please try again");
            }
        }
    }

    Ok(())
}
