use std::path::PathBuf;
use std::sync::Arc;

use game_content::ContentFactory;
use game_core::ItemDefId;
use runtime::{ItemCatalogImpl, Session, SessionBuilder};

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../game/content/data")
}

/// Catalog built from the bundled content data.
pub fn bundled_catalog() -> Arc<ItemCatalogImpl> {
    let items = ContentFactory::new(data_dir())
        .load_items()
        .expect("bundled items should load");
    Arc::new(ItemCatalogImpl::from_definitions(items))
}

pub fn builder() -> SessionBuilder {
    Session::builder().catalog(bundled_catalog())
}

pub fn item(id: &str) -> ItemDefId {
    ItemDefId::from(id)
}
