#![deny(clippy::all)]

mod audio;
mod auth;
mod chat;
mod config;
mod error;
mod genai;
mod gesture;
mod recorder;
mod session;
mod storage;
mod transcription;

use anyhow::Context;
use auth::{AuthClient, AuthEvent};
use genai::GenAiClient;
use recorder::Recorder;
use session::{Orchestrator, SessionEvent};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use transcription::TranscriptionClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    // Populate the environment from .env if present; secrets stay optional
    let _ = dotenvy::dotenv();

    // Load non-secret settings from the embedded config.toml
    let settings = config::Settings::from_toml(include_str!("../config.toml"))
        .context("Failed to load embedded settings")?;
    let secrets = config::Secrets::from_env();

    let transcriber = TranscriptionClient::new(&secrets.whisper_key, &secrets.whisper_url)?;
    let genai = GenAiClient::new(&secrets.gemini_key, &secrets.gemini_url)?;
    let mut auth = AuthClient::new(&secrets.auth_url, &secrets.auth_anon_key)?;
    auth.restore();

    let mut orchestrator = Orchestrator::new(Recorder::new(), transcriber, genai, &settings);

    // Presentation subscribes to events; the orchestrator never prints.
    let mut session_events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = session_events.recv().await {
            render_session_event(event);
        }
    });

    let mut auth_events = auth.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = auth_events.recv().await {
            match event {
                AuthEvent::SignedIn { email } => println!("* signed in as {}", email),
                AuthEvent::SignedOut => println!("* signed out"),
            }
        }
    });

    info!("Ascend ready");
    println!("Ascend - type a message, or /help for commands");

    run_loop(&mut orchestrator, &mut auth).await
}

fn render_session_event(event: SessionEvent) {
    match event {
        SessionEvent::ListeningStarted => println!("* listening..."),
        SessionEvent::ListeningStopped => println!("* processing..."),
        SessionEvent::TranscriptReady(text) => {
            if text.is_empty() {
                println!("* (no speech recognized)");
            } else {
                println!("you (voice): {}", text);
            }
        }
        SessionEvent::NavigateToChat => println!("* opening chat"),
        SessionEvent::MessageAppended(message) => {
            let speaker = if message.is_user { "you" } else { "ascend" };
            println!("{}: {}", speaker, message.text);
        }
        SessionEvent::LoadingChanged(true) => println!("* thinking..."),
        SessionEvent::LoadingChanged(false) => {}
    }
}

/// Read commands from stdin until quit
async fn run_loop(orchestrator: &mut Orchestrator, auth: &mut AuthClient) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next() {
                Some("help") => print_help(),
                Some("hold") => {
                    let ms = parts
                        .next()
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(2500);
                    simulate_hold(orchestrator, Duration::from_millis(ms)).await;
                }
                Some("cancel") => {
                    orchestrator.cancel_recording();
                }
                Some("login") => match (parts.next(), parts.next()) {
                    (Some(email), Some(password)) => {
                        if let Err(e) = auth.sign_in(email, password).await {
                            println!("* sign-in failed: {}", e);
                        }
                    }
                    _ => println!("usage: /login <email> <password>"),
                },
                Some("signup") => match (parts.next(), parts.next()) {
                    (Some(email), Some(password)) => {
                        if let Err(e) = auth.sign_up(email, password).await {
                            println!("* sign-up failed: {}", e);
                        }
                    }
                    _ => println!("usage: /signup <email> <password>"),
                },
                Some("logout") => auth.sign_out().await,
                Some("whoami") => match auth.session() {
                    Some(session) => println!("* {}", session.email),
                    None => println!("* not signed in"),
                },
                Some("quit") => break,
                _ => println!("unknown command; /help for a list"),
            }
        } else {
            orchestrator.send_text(&line).await;
        }
    }

    Ok(())
}

/// Press the talk control, hold it for `duration`, then release
async fn simulate_hold(orchestrator: &mut Orchestrator, duration: Duration) {
    let pressed_at = Instant::now();
    orchestrator.press(pressed_at);

    while pressed_at.elapsed() < duration {
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.tick(Instant::now());
    }

    orchestrator.release(Instant::now()).await;
}

fn print_help() {
    println!("  <text>                 send a chat message");
    println!("  /hold [ms]             press and hold the talk control (default 2500ms)");
    println!("  /cancel                discard the active recording");
    println!("  /login <email> <pw>    sign in");
    println!("  /signup <email> <pw>   create an account");
    println!("  /logout                sign out");
    println!("  /whoami                show the signed-in account");
    println!("  /quit                  exit");
}
