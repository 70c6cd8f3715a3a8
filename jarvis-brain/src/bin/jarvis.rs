//! Console front end: one session, one utterance per line.
//!
//! ```text
//! jarvis [config.toml] [facts.db]
//! ```
//!
//! Without a database path facts live in memory for the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use jarvis_brain::{Brain, BrainEvent, telemetry};
use jarvis_core::config::JarvisConfig;
use jarvis_core::{FactPersistence, FactStore, MemoryFacts, SqliteFacts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => JarvisConfig::from_file(&PathBuf::from(&path))
            .with_context(|| format!("loading config from {path}"))?,
        None => JarvisConfig::default(),
    };
    telemetry::init(&config.general.log_level);

    let backend: Arc<dyn FactPersistence> = match args.next() {
        Some(path) => Arc::new(
            SqliteFacts::open(&path, &config.persistence)
                .with_context(|| format!("opening fact database {path}"))?,
        ),
        None => Arc::new(MemoryFacts::new()),
    };
    let facts = Arc::new(FactStore::open(backend, config.facts.clone())?);
    let knowledge = jarvis_knowledge::from_config(&config.knowledge)?;
    let decay_period = Duration::from_millis(config.session.decay_interval_ms.max(1));

    let brain = Brain::new(config, facts, knowledge);
    let _maintenance = brain.spawn_maintenance();
    let _reminders = brain.spawn_reminders();
    let mut events = brain.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(BrainEvent::ReminderDue { reminder }) => println!("Reminder: {}", reminder.text),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });
    let session = brain.new_session();
    let _decay = session.spawn_decay(decay_period);

    println!("JARVIS online. Type \"exit\" to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        let response = brain.process(&session, line).await;
        println!("{}", response.text);
    }

    println!("{}", brain.counters().snapshot().to_prometheus());
    Ok(())
}
