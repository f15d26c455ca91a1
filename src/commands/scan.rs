//! Scan command - rebuild the category page map now

use crate::config::Config;
use crate::crawl::{Scanner, SiteClient};
use crate::error::Result;
use crate::store::{PageMap, PageMapStore};
use tracing::info;

/// Force a rescan of every configured category and persist the result
pub async fn cmd_scan(config: &Config) -> Result<PageMap> {
    info!("Starting forced scan");

    let site = SiteClient::new(&config.base_url, &config.http)?;
    let store = PageMapStore::new(config.page_map_path());
    let scanner = Scanner::new(site, store.clone(), config);

    let map = scanner.scan(&config.categories).await;
    // Scanner::scan only logs write failures; surface them to the operator.
    store.try_save(&map)?;
    Ok(map)
}

/// Print a page map to console
pub fn print_page_map(map: &PageMap) {
    println!("\n🗂  Category page map\n");
    println!("Last scan: {}", map.last_scan);
    println!("Next scan: {}", map.next_scan);
    println!();

    let width = map.categories.keys().map(|k| k.len()).max().unwrap_or(0);
    for (category, pages) in &map.categories {
        println!("  {:<width$}  {}", category, pages, width = width);
    }

    println!("\nTotal pages: {}", map.total_pages());
}
