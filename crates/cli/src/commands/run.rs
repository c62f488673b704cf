//! Run a command script against a fresh session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;

use game_content::ContentFactory;
use game_core::{EffectOutcome, GameMessage, ResourceKind};
use runtime::{BusEvent, EntitySnapshot, FilePersistence, ItemCatalogImpl, RuntimeConfig, Session};

use crate::script::{ScriptCommand, ScriptLine, parse_script};

/// Execute a ledger script
#[derive(Parser, Debug)]
pub struct Run {
    /// Script file, one command per line
    pub script: PathBuf,

    /// Directory holding items.ron and an optional config.toml
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "crates/game/content/data")]
    pub data_dir: PathBuf,

    /// Persist inventories and ledgers as JSON under this directory
    #[arg(long, env = "LEDGER_SAVE_DIR")]
    pub save_dir: Option<PathBuf>,

    /// Append every published message as a JSON line to this file
    #[arg(long)]
    pub event_log: Option<PathBuf>,

    /// Messages buffered per bus channel before slow readers skip ahead
    #[arg(long, env = "LEDGER_EVENT_CAPACITY", default_value_t = 4096)]
    pub event_capacity: usize,

    /// Print messages published by each command
    #[arg(long)]
    pub events: bool,

    /// Print snapshots as JSON
    #[arg(long)]
    pub json: bool,

    /// Stop at the first failing command
    #[arg(long)]
    pub strict: bool,
}

impl Run {
    pub async fn execute(self) -> Result<()> {
        let source = std::fs::read_to_string(&self.script)
            .with_context(|| format!("Failed to read script: {}", self.script.display()))?;
        let lines = parse_script(&source)
            .with_context(|| format!("Invalid script: {}", self.script.display()))?;

        let mut session = self.build_session()?;

        let recorder = match &self.event_log {
            Some(path) => Some(spawn_event_log(
                session.bus().subscribe_all(),
                path.clone(),
            )),
            None => None,
        };
        let mut feed = session.bus().subscribe_all();

        let outcome = self.run_lines(&mut session, &lines, &mut feed);

        // Dropping the session closes the bus so the recorder can finish,
        // on the error path as well.
        drop(session);
        drop(feed);
        let logged = match recorder {
            Some(recorder) => Some(
                recorder
                    .await
                    .context("event log task panicked")
                    .and_then(|written| written),
            ),
            None => None,
        };

        let failures = outcome?;
        if let Some(log) = logged.transpose()? {
            if log.skipped > 0 {
                tracing::warn!(
                    skipped = log.skipped,
                    capacity = self.event_capacity,
                    "event log is missing messages; raise --event-capacity"
                );
            }
            tracing::info!(written = log.written, "event log complete");
        }

        tracing::info!(commands = lines.len(), failures, "script finished");
        Ok(())
    }

    /// Applies every line. Returns the number of failed commands, or the
    /// first failure under `--strict`.
    fn run_lines(
        &self,
        session: &mut Session,
        lines: &[ScriptLine],
        feed: &mut broadcast::Receiver<BusEvent>,
    ) -> Result<usize> {
        let mut failures = 0usize;
        for line in lines {
            let result = apply(session, line, self.json);
            if self.events {
                print_events(feed);
            } else {
                drain(feed);
            }
            if let Err(err) = result {
                failures += 1;
                println!("! line {}: {err:#}", line.line);
                tracing::warn!(line = line.line, command = %line.text, "command failed: {err:#}");
                if self.strict {
                    return Err(err.context(format!("line {}: `{}`", line.line, line.text)));
                }
            }
        }
        Ok(failures)
    }

    fn build_session(&self) -> Result<Session> {
        let factory = ContentFactory::new(&self.data_dir);
        let ledger = factory.load_config()?;
        let items = factory
            .load_items()
            .with_context(|| format!("Failed to load items from {}", self.data_dir.display()))?;
        tracing::info!(items = items.len(), data_dir = %self.data_dir.display(), "content loaded");

        let mut builder = Session::builder()
            .config(RuntimeConfig {
                ledger,
                event_buffer_size: self.event_capacity,
            })
            .catalog(Arc::new(ItemCatalogImpl::from_definitions(items)));

        if let Some(save_dir) = &self.save_dir {
            let store = FilePersistence::new(save_dir)
                .with_context(|| format!("Failed to open save dir {}", save_dir.display()))?;
            tracing::info!(save_dir = %save_dir.display(), "file persistence enabled");
            builder = builder.persistence(Arc::new(store));
        }

        Ok(builder.build()?)
    }
}

fn apply(session: &mut Session, line: &ScriptLine, json: bool) -> Result<()> {
    tracing::debug!(line = line.line, command = %line.text, "executing");

    match &line.command {
        ScriptCommand::Spawn(entity) => {
            session.spawn(*entity)?;
            println!("spawned {entity}");
        }
        ScriptCommand::Despawn(entity) => {
            session.despawn(*entity)?;
            println!("despawned {entity}");
        }
        ScriptCommand::Give {
            entity,
            item,
            count,
        } => {
            let stack = session.give(*entity, item, *count)?;
            match stack {
                Some(stack) => println!("{entity} received {count} x {item} (last stack {stack})"),
                None => println!("{entity} received nothing"),
            }
        }
        ScriptCommand::Remove {
            entity,
            item,
            count,
        } => {
            session.remove(*entity, item, *count)?;
            println!("{entity} lost {count} x {item}");
        }
        ScriptCommand::Use { entity, item } => {
            let outcome = session.use_item(*entity, item)?;
            println!("{entity} used {item}: {}", describe(&outcome));
        }
        ScriptCommand::Cost {
            entity,
            cost,
            level,
        } => {
            let paid = session.pay_item_cost(*entity, cost, *level)?;
            let required = cost.required(*level);
            if paid {
                println!("{entity} paid {required} x {}", cost.item);
            } else {
                println!("{entity} cannot afford {required} x {}", cost.item);
            }
        }
        ScriptCommand::Damage {
            entity,
            kind,
            amount,
            instigator,
        } => {
            let outcome = session.damage(*entity, *kind, *amount, *instigator)?;
            println!("{entity} took {amount} {kind} damage: {}", describe(&outcome));
        }
        ScriptCommand::Heal {
            entity,
            kind,
            amount,
            instigator,
        } => {
            let outcome = session.heal(*entity, *kind, *amount, *instigator)?;
            println!("{entity} healed {amount} {kind}: {}", describe(&outcome));
        }
        ScriptCommand::SetMax {
            entity,
            kind,
            value,
        } => {
            let events = session.set_max(*entity, *kind, *value)?;
            println!("{entity} max {kind} set to {value} ({} events)", events.len());
        }
        ScriptCommand::Tag { entity, tag, count } => {
            session.set_tag(*entity, tag.clone(), *count)?;
            println!("{entity} tag {tag} = {count}");
        }
        ScriptCommand::SelfDestruct {
            entity,
            kind,
            fell_out_of_world,
        } => match session.self_destruct(*entity, *kind, *fell_out_of_world)? {
            Some(outcome) => println!("{entity} self-destructed: {}", describe(&outcome)),
            None => println!("{entity} is already dying"),
        },
        ScriptCommand::FinishDeath(entity) => {
            let transition = session.finish_death(*entity)?;
            println!("{entity} finish death: {transition:?}");
        }
        ScriptCommand::Sync(entity) => {
            let report = session.sync(*entity)?;
            println!(
                "{entity} synced: {} changes, {} attributes, death {}",
                report.inventory_changes, report.attributes, report.death
            );
        }
        ScriptCommand::Show { entity, replica } => {
            let snapshot = if *replica {
                session
                    .replica_snapshot(*entity)?
                    .with_context(|| format!("{entity} has no replica yet; run `sync` first"))?
            } else {
                session.snapshot(*entity)?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
        }
    }
    Ok(())
}

fn describe(outcome: &EffectOutcome) -> String {
    if outcome.is_rejected() {
        return "rejected".to_owned();
    }
    let mut parts = Vec::new();
    for kind in [ResourceKind::Health, ResourceKind::Mana] {
        let delta = outcome.applied_delta(kind);
        if delta != 0.0 {
            parts.push(format!("{kind} {delta:+}"));
        }
        if outcome.depleted(kind) {
            parts.push(format!("{kind} depleted"));
        }
    }
    if parts.is_empty() {
        "no change".to_owned()
    } else {
        parts.join(", ")
    }
}

fn print_snapshot(snapshot: &EntitySnapshot) {
    println!("{} ({:?}, {})", snapshot.id, snapshot.role, snapshot.death);
    for (label, resource) in [("health", &snapshot.health), ("mana", &snapshot.mana)] {
        println!(
            "  {label:<7} {:>6.1} / {:<6.1}{}",
            resource.current,
            resource.max,
            if resource.depleted { " depleted" } else { "" }
        );
    }
    for (tag, count) in &snapshot.tags {
        println!("  tag     {tag} x{count}");
    }
    for stack in &snapshot.items {
        println!(
            "  item    {} {} {}/{}",
            stack.instance, stack.item, stack.count, stack.stack_limit
        );
    }
    if !snapshot.quick_bar.is_empty() {
        let slots: Vec<String> = snapshot
            .quick_bar
            .iter()
            .map(|slot| slot.map_or_else(|| "-".to_owned(), |id| id.to_string()))
            .collect();
        println!(
            "  slots   [{}] active {:?}",
            slots.join(", "),
            snapshot.active_slot
        );
    }
}

fn print_events(feed: &mut broadcast::Receiver<BusEvent>) {
    loop {
        match feed.try_recv() {
            Ok(event) => match event.message {
                GameMessage::Verb(verb) => println!(
                    "  > {} target {} instigator {:?} magnitude {}",
                    event.topic, verb.target, verb.instigator, verb.magnitude
                ),
                GameMessage::StackChanged(change) => println!(
                    "  > {} {} {} {} now {} ({:+})",
                    event.topic,
                    change.owner,
                    change.instance,
                    change.item,
                    change.new_count,
                    change.delta
                ),
            },
            Err(TryRecvError::Lagged(skipped)) => println!("  > ({skipped} messages skipped)"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn drain(feed: &mut broadcast::Receiver<BusEvent>) {
    while !matches!(
        feed.try_recv(),
        Err(TryRecvError::Empty | TryRecvError::Closed)
    ) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct EventLogStats {
    written: usize,
    skipped: u64,
}

/// Writes every bus event as one JSON line until the bus closes.
fn spawn_event_log(
    rx: broadcast::Receiver<BusEvent>,
    path: PathBuf,
) -> JoinHandle<Result<EventLogStats>> {
    tokio::spawn(record_events(rx, path))
}

async fn record_events(
    mut rx: broadcast::Receiver<BusEvent>,
    path: PathBuf,
) -> Result<EventLogStats> {
    let mut file = open_event_log(&path).await?;
    let mut stats = EventLogStats::default();
    loop {
        match rx.recv().await {
            Ok(event) => {
                let mut line = serde_json::to_vec(&event)?;
                line.push(b'\n');
                file.write_all(&line).await?;
                stats.written += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log fell behind");
                stats.skipped += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    file.flush().await?;
    Ok(stats)
}

async fn open_event_log(path: &Path) -> Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open event log: {}", path.display()))
}
