//! List the item catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use game_content::ContentFactory;
use game_core::{ItemFragment, ItemType};

/// List item definitions from a data directory
#[derive(Parser, Debug)]
pub struct Items {
    /// Directory holding items.ron
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "crates/game/content/data")]
    pub data_dir: PathBuf,

    /// Only list items of this type (e.g. weapon, quest_item)
    #[arg(long = "type")]
    pub item_type: Option<String>,

    /// Print definitions as JSON
    #[arg(long)]
    pub json: bool,
}

impl Items {
    pub fn execute(self) -> Result<()> {
        let filter = self.item_type.as_deref().map(parse_type).transpose()?;

        let mut items = ContentFactory::new(&self.data_dir)
            .load_items()
            .with_context(|| format!("Failed to load items from {}", self.data_dir.display()))?;
        items.retain(|item| filter.is_none_or(|wanted| item.item_type == wanted));
        items.sort_by(|a, b| a.id.cmp(&b.id));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        for item in &items {
            println!(
                "{:<16} {:<20} {:<12} stack {}",
                item.id.as_str(),
                item.display_name,
                item.item_type.to_string(),
                item.stack_limit
            );
            for fragment in &item.fragments {
                match fragment {
                    ItemFragment::SetStats { stats } => {
                        for (tag, count) in stats {
                            println!("    stat    {tag} x{count}");
                        }
                    }
                    ItemFragment::ConsumeEffects { modifiers } => {
                        for modifier in modifiers {
                            println!(
                                "    consume {} {:?} {}",
                                modifier.attribute, modifier.op, modifier.magnitude
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_type(name: &str) -> Result<ItemType> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("unknown item type `{name}`"))
}
