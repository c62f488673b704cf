mod items;
mod run;

pub use items::Items;
pub use run::Run;
