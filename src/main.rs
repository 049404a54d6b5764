//! Terminal REPL for yapper.
//!
//! Wires the UI-free [`Controller`] to stdin/stdout: reads prompts, streams
//! reply fragments as they arrive, and keeps the local session list and the
//! server-side transcript in sync.

use anyhow::{Context as _, Result};
use clap::Parser;
use futures::StreamExt;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use yapper::config::ConfigLoader;
use yapper::render::Renderer;
use yapper::session::{Command, Controller, Effect, SessionStore};
use yapper::{ChatClient, ChatRequest};

#[derive(Parser)]
#[command(name = "yapper")]
#[command(about = "Chat with a local LLM server from the terminal")]
#[command(version)]
struct Cli {
    /// Server base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Model key to chat with (defaults to config, then the first catalog entry)
    #[arg(long)]
    model: Option<String>,

    /// Session to resume or create
    #[arg(long)]
    session: Option<String>,

    /// Path to a config file
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => ConfigLoader::from_path(path)?.into_settings(),
        None => ConfigLoader::new()?.into_settings(),
    };
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(model) = cli.model {
        settings.default_model = Some(model);
    }

    let client = ChatClient::with_settings(settings)?;
    let store = SessionStore::open_default()?;
    let renderer = Renderer::new();

    let models = client
        .models()
        .await
        .context("could not fetch the model catalog; is the server running?")?;

    let model_key = match client.settings().default_model.clone() {
        Some(key) => key,
        None => models
            .first()
            .map(|m| m.key.clone())
            .context("the server catalog is empty")?,
    };
    let descriptor = models
        .iter()
        .find(|m| m.key == model_key)
        .with_context(|| format!("model '{}' is not in the server catalog", model_key))?;

    let mut controller = Controller::new(descriptor.default_options());
    controller.handle(Command::SelectModel(model_key.clone()));

    if let Some(name) = &cli.session {
        if store.names().iter().any(|n| n == name) {
            store.select(name)?;
        } else {
            store.create(name)?;
        }
    }
    if let Some(name) = store.selected() {
        let transcript = client.history(&name).await.unwrap_or_default();
        controller.handle(Command::SelectSession {
            name: name.clone(),
            transcript,
        });
        println!("session: {}", name);
    }
    println!("model: {}  (/help for commands)", model_key);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !run_slash_command(command, &client, &store, &mut controller).await {
                break;
            }
            continue;
        }

        let effects = controller.handle(Command::Submit(line.to_string()));
        for effect in effects {
            match effect {
                Effect::BeginRequest(request) => {
                    stream_reply(&client, &mut controller, &renderer, request).await;
                }
                Effect::ShowError(message) => eprintln!("error: {}", message),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Handle a `/command`; returns false when the REPL should exit
async fn run_slash_command(
    command: &str,
    client: &ChatClient,
    store: &SessionStore,
    controller: &mut Controller,
) -> bool {
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => return false,

        "models" => match client.models().await {
            Ok(models) => {
                for model in models {
                    println!("  {:<20} {}", model.key, model.name);
                }
            }
            Err(e) => eprintln!("error: {}", e),
        },

        "sessions" => {
            let selected = store.selected();
            for session in store.names() {
                let marker = if Some(&session) == selected.as_ref() { "*" } else { " " };
                println!("  {} {}", marker, session);
            }
        }

        "new" if !arg.is_empty() => match store.create(arg) {
            Ok(()) => {
                controller.handle(Command::SelectSession {
                    name: arg.to_string(),
                    transcript: Default::default(),
                });
                println!("session: {}", arg);
            }
            Err(e) => eprintln!("error: {}", e),
        },

        "switch" if !arg.is_empty() => match store.select(arg) {
            Ok(()) => {
                let transcript = client.history(arg).await.unwrap_or_default();
                controller.handle(Command::SelectSession {
                    name: arg.to_string(),
                    transcript,
                });
                println!("session: {}", arg);
            }
            Err(e) => eprintln!("error: {}", e),
        },

        "clear" => {
            controller.handle(Command::ClearTranscript);
        }

        _ => {
            println!("commands: /models /sessions /new <name> /switch <name> /clear /quit");
        }
    }

    true
}

/// Drive one streamed reply to completion, printing fragments as they land
async fn stream_reply(
    client: &ChatClient,
    controller: &mut Controller,
    renderer: &Renderer,
    request: ChatRequest,
) {
    let final_effects = match client.send(&request).await {
        Ok(mut fragments) => {
            let mut failure = None;
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(text) => {
                        for effect in controller.handle(Command::Fragment(text)) {
                            if let Effect::AppendOutput(out) = effect {
                                print!("{}", renderer.render(&out));
                                let _ = std::io::stdout().flush();
                            }
                        }
                    }
                    Err(e) => {
                        failure = Some(e.to_string());
                        break;
                    }
                }
            }
            println!();
            match failure {
                Some(reason) => controller.handle(Command::ReplyFailed(reason)),
                None => controller.handle(Command::ReplyDone),
            }
        }
        Err(e) => controller.handle(Command::ReplyFailed(e.to_string())),
    };

    for effect in final_effects {
        match effect {
            Effect::PersistTranscript => {
                if let Some(session) = controller.session() {
                    if let Err(e) = client.push_history(session, controller.transcript()).await {
                        tracing::warn!(error = %e, session, "failed to persist transcript");
                    }
                }
            }
            Effect::ShowError(message) => eprintln!("error: {}", message),
            _ => {}
        }
    }
}
