//! src/main.rs
//! Headless driver for the assistant core.
//!
//! Usage: `palette <fixture.json>`, then type one query per line on stdin.
//! Lines starting with `:` are commands: `:down`, `:up`, `:enter`,
//! `:apply`, `:quit`. Settled snapshots and host events are printed as
//! JSON lines on stdout.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedReceiver},
    time::timeout,
};
use tracing::{info, warn};

use palette_core::{
    Assistant, Config, LoggerBuilder,
    controller::{AssistantEvent, Collaborators},
    model::Permissions,
    providers::{FixtureProvider, IdentityTranslator},
};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let fixture_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: palette <fixture.json>")?;

    let config = Config::load().await.context("Failed to load configuration")?;
    let _guard = LoggerBuilder::new()
        .with_config(config.logging.clone())
        .build()
        .await
        .context("Failed to initialize logging")?;

    let fixture = Arc::new(
        FixtureProvider::from_path(&fixture_path)
            .await
            .with_context(|| format!("Failed to load fixture {}", fixture_path.display()))?,
    );

    let (tx, mut events) = mpsc::unbounded_channel();
    let collaborators = Collaborators {
        search: fixture.clone(),
        admin_search: Some(fixture.clone()),
        holdings: fixture.clone(),
        translator: Arc::new(IdentityTranslator),
    };

    let mut assistant = Assistant::new(collaborators, config, tx);
    assistant.activate();
    assistant.set_user(fixture.user().clone(), Permissions::all());
    assistant.open();

    let mut view = assistant
        .subscribe()
        .context("Assistant is not active")?;

    info!("palette ready, reading queries from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        match line {
            ":quit" => break,
            ":down" | ":up" | ":enter" => {
                let code = match line {
                    ":down" => KeyCode::Down,
                    ":up" => KeyCode::Up,
                    _ => KeyCode::Enter,
                };
                let outcome = assistant.handle_key(&KeyEvent::new(code, KeyModifiers::NONE));
                println!(
                    "{}",
                    serde_json::json!({
                        "activeRow": assistant.active_row(),
                        "consumed": outcome.consumed(),
                    })
                );
            }
            ":apply" => {
                assistant.apply_filters();
            }
            query => {
                assistant.submit_query(query);

                match timeout(SETTLE_TIMEOUT, view.wait_for(|s| !s.is_loading)).await {
                    Ok(Ok(snapshot)) => println!("{}", serde_json::to_string(&*snapshot)?),
                    Ok(Err(_)) => break,
                    Err(_) => warn!("Query '{}' did not settle in {:?}", query, SETTLE_TIMEOUT),
                }
                assistant.sync_results();
            }
        }

        print_events(&mut events)?;
    }

    assistant.deactivate();
    info!("palette exited cleanly");
    Ok(())
}

fn print_events(events: &mut UnboundedReceiver<AssistantEvent>) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
