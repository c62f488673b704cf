//! Line-oriented command scripts.
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! spawn 1
//! give 1 health_potion 4
//! damage 1 health 30 by 2
//! show 1
//! ```

use std::str::FromStr;

use game_core::{EntityId, GameplayTag, InventoryItemCost, ItemDefId, ResourceKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Spawn(EntityId),
    Despawn(EntityId),
    Give {
        entity: EntityId,
        item: ItemDefId,
        count: u32,
    },
    Remove {
        entity: EntityId,
        item: ItemDefId,
        count: u32,
    },
    Use {
        entity: EntityId,
        item: ItemDefId,
    },
    Cost {
        entity: EntityId,
        cost: InventoryItemCost,
        level: u32,
    },
    Damage {
        entity: EntityId,
        kind: ResourceKind,
        amount: f32,
        instigator: Option<EntityId>,
    },
    Heal {
        entity: EntityId,
        kind: ResourceKind,
        amount: f32,
        instigator: Option<EntityId>,
    },
    SetMax {
        entity: EntityId,
        kind: ResourceKind,
        value: f32,
    },
    Tag {
        entity: EntityId,
        tag: GameplayTag,
        count: i32,
    },
    SelfDestruct {
        entity: EntityId,
        kind: ResourceKind,
        fell_out_of_world: bool,
    },
    FinishDeath(EntityId),
    Sync(EntityId),
    Show {
        entity: EntityId,
        replica: bool,
    },
}

/// A parsed command with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub text: String,
    pub command: ScriptCommand,
}

pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, ParseError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let text = raw.split('#').next().unwrap_or_default().trim();
            (!text.is_empty()).then(|| (index + 1, text))
        })
        .map(|(line, text)| {
            parse_line(text)
                .map(|command| ScriptLine {
                    line,
                    text: text.to_owned(),
                    command,
                })
                .map_err(|message| ParseError { line, message })
        })
        .collect()
}

fn parse_line(text: &str) -> Result<ScriptCommand, String> {
    let mut args = Args::new(text);
    let verb = args.word("command")?;

    let command = match verb {
        "spawn" => ScriptCommand::Spawn(args.entity()?),
        "despawn" => ScriptCommand::Despawn(args.entity()?),
        "give" => ScriptCommand::Give {
            entity: args.entity()?,
            item: args.item()?,
            count: args.number("count")?,
        },
        "remove" => ScriptCommand::Remove {
            entity: args.entity()?,
            item: args.item()?,
            count: args.number("count")?,
        },
        "use" => ScriptCommand::Use {
            entity: args.entity()?,
            item: args.item()?,
        },
        "cost" => {
            let entity = args.entity()?;
            let item = args.item()?;
            let quantity = args.number("quantity")?;
            ScriptCommand::Cost {
                entity,
                cost: InventoryItemCost::new(item, quantity),
                level: args.number("level")?,
            }
        }
        "damage" | "heal" => {
            let entity = args.entity()?;
            let kind = args.kind()?;
            let amount = args.number("amount")?;
            let instigator = args.instigator()?;
            if verb == "damage" {
                ScriptCommand::Damage {
                    entity,
                    kind,
                    amount,
                    instigator,
                }
            } else {
                ScriptCommand::Heal {
                    entity,
                    kind,
                    amount,
                    instigator,
                }
            }
        }
        "max" => ScriptCommand::SetMax {
            entity: args.entity()?,
            kind: args.kind()?,
            value: args.number("value")?,
        },
        "tag" => ScriptCommand::Tag {
            entity: args.entity()?,
            tag: GameplayTag::new(args.word("tag")?),
            count: args.number("count")?,
        },
        "selfdestruct" => ScriptCommand::SelfDestruct {
            entity: args.entity()?,
            kind: args.kind()?,
            fell_out_of_world: args.flag("fell")?,
        },
        "finish-death" => ScriptCommand::FinishDeath(args.entity()?),
        "sync" => ScriptCommand::Sync(args.entity()?),
        "show" => ScriptCommand::Show {
            entity: args.entity()?,
            replica: args.flag("replica")?,
        },
        other => return Err(format!("unknown command `{other}`")),
    };

    args.finish()?;
    Ok(command)
}

struct Args<'a> {
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            words: text.split_whitespace(),
        }
    }

    fn word(&mut self, what: &str) -> Result<&'a str, String> {
        self.words.next().ok_or_else(|| format!("missing {what}"))
    }

    fn number<T: FromStr>(&mut self, what: &str) -> Result<T, String> {
        let word = self.word(what)?;
        word.parse()
            .map_err(|_| format!("invalid {what} `{word}`"))
    }

    fn entity(&mut self) -> Result<EntityId, String> {
        self.number("entity id").map(EntityId)
    }

    fn item(&mut self) -> Result<ItemDefId, String> {
        self.word("item id").map(ItemDefId::from)
    }

    fn kind(&mut self) -> Result<ResourceKind, String> {
        let word = self.word("resource")?;
        word.parse()
            .map_err(|_| format!("unknown resource `{word}` (expected health or mana)"))
    }

    /// Optional trailing `by <entity>`.
    fn instigator(&mut self) -> Result<Option<EntityId>, String> {
        match self.words.next() {
            None => Ok(None),
            Some("by") => self.entity().map(Some),
            Some(other) => Err(format!("expected `by <entity>`, found `{other}`")),
        }
    }

    /// Optional trailing keyword.
    fn flag(&mut self, keyword: &str) -> Result<bool, String> {
        match self.words.next() {
            None => Ok(false),
            Some(word) if word == keyword => Ok(true),
            Some(other) => Err(format!("expected `{keyword}`, found `{other}`")),
        }
    }

    fn finish(mut self) -> Result<(), String> {
        match self.words.next() {
            None => Ok(()),
            Some(extra) => Err(format!("unexpected argument `{extra}`")),
        }
    }
}
