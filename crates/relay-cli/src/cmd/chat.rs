use anyhow::Context;
use relay_client::{ChatSession, ConnectionManager, RealtimeSettings};
use relay_core::bus::{ConnectionStatus, EventBus, EventKind};
use relay_core::config::Config;
use relay_core::types::ChatMessage;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_path: Option<&Path>, url: &str) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(repl(&config, url))
}

async fn repl(config: &Config, url: &str) -> anyhow::Result<()> {
    let bus = EventBus::new();
    let inbound = bus.subscribe(EventKind::InboundMessage, |e| {
        println!("\n[{}] {}", e.source, summarize(&e.payload));
    });
    let status = bus.subscribe(EventKind::ConnectionStatus, |e| match e.connection_status() {
        Some(ConnectionStatus::Connected) => eprintln!("(live)"),
        Some(ConnectionStatus::Reconnecting { attempt, delay_ms }) => {
            eprintln!("(reconnecting: attempt {attempt} in {delay_ms}ms)")
        }
        Some(ConnectionStatus::GaveUp { attempts }) => {
            eprintln!("(realtime offline after {attempts} attempts)")
        }
        _ => {}
    });

    let realtime = ConnectionManager::new(
        websocket_url(url)?,
        bus.clone(),
        RealtimeSettings::from(&config.realtime),
    );
    realtime.connect();

    let chat = ChatSession::new(url);
    chat.refresh()
        .await
        .with_context(|| format!("cannot reach relay server at {url}"))?;
    for m in chat.messages() {
        print_message(&m);
    }
    println!("Type a /command or text. /retry resends failed messages, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/retry" => retry_failed(&chat).await,
            _ => match chat.send_command(line).await {
                Ok(envelope) => println!("{}", envelope.display_text()),
                Err(e) => eprintln!("send failed: {e} (use /retry)"),
            },
        }
    }

    realtime.disconnect().await;
    inbound.unsubscribe();
    status.unsubscribe();
    Ok(())
}

async fn retry_failed(chat: &ChatSession) {
    let failed: Vec<String> = chat
        .messages()
        .into_iter()
        .filter(|m| m.delivery_status() == Some(relay_core::reconcile::STATUS_FAILED))
        .map(|m| m.id)
        .collect();
    if failed.is_empty() {
        println!("nothing to retry");
        return;
    }
    for id in failed {
        match chat.retry(&id).await {
            Ok(Some(envelope)) => println!("{}", envelope.display_text()),
            Ok(None) => println!("resent {id}"),
            Err(e) => eprintln!("retry {id} failed: {e}"),
        }
    }
}

fn print_message(m: &ChatMessage) {
    println!("{:>9}: {}", m.role.as_str(), m.content);
}

/// One line for a pushed payload: the first text-like field, else the JSON.
fn summarize(payload: &Value) -> String {
    ["message", "text", "body", "content"]
        .iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string())
}

/// `http://host:port` becomes `ws://host:port/ws`.
fn websocket_url(base: &str) -> anyhow::Result<String> {
    let base = base.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        Ok(format!("wss://{rest}/ws"))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Ok(format!("ws://{rest}/ws"))
    } else {
        anyhow::bail!("server URL must start with http:// or https://: {base}")
    }
}
