/// Extension directory: filtering, ordering and lookup over installed items
use crate::error::PopupError;
use crate::extension_data::{ExtensionRecord, ExtensionType};
use crate::host::ManagementApi;
use std::cmp::Ordering;

/// Preferred icon sizes for the list rows, best first
const PREFERRED_ICON_SIZES: [u32; 6] = [24, 32, 16, 48, 64, 128];

/// Placeholder icon for items that ship none
pub const DEFAULT_ICON: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjQiIGhlaWdodD0iMjQiIHZpZXdCb3g9IjAgMCAyNCAyNCIgZmlsbD0ibm9uZSIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj4KPHJlY3Qgd2lkdGg9IjI0IiBoZWlnaHQ9IjI0IiByeD0iNCIgZmlsbD0iI0U1RTVFNSIvPgo8cGF0aCBkPSJNOSAxMkwxMS41IDE0LjVMMTUgMTEiIHN0cm9rZT0iIzk5OTk5OSIgc3Ryb2tlLXdpZHRoPSIyIiBzdHJva2UtbGluZWNhcD0icm91bmQiIHN0cm9rZS1saW5lam9pbj0icm91bmQiLz4KPC9zdmc+";

/// Fetch the current directory from the host
///
/// Only ordinary extensions and packaged apps are kept. The result is
/// ordered for display: enabled items first, then by name ignoring case.
pub async fn list_extensions<M: ManagementApi>(api: &M) -> Result<Vec<ExtensionRecord>, PopupError> {
    let items = api.get_all().await?;
    Ok(into_directory(items))
}

/// Filter and order a raw installed-item list
pub fn into_directory(items: Vec<ExtensionRecord>) -> Vec<ExtensionRecord> {
    let mut records: Vec<ExtensionRecord> = items
        .into_iter()
        .filter(|item| matches!(item.kind, ExtensionType::Extension | ExtensionType::PackagedApp))
        .collect();

    records.sort_by(display_order);
    records
}

fn display_order(a: &ExtensionRecord, b: &ExtensionRecord) -> Ordering {
    b.enabled
        .cmp(&a.enabled)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn find<'a>(records: &'a [ExtensionRecord], id: &str) -> Option<&'a ExtensionRecord> {
    records.iter().find(|r| r.id == id)
}

/// Records whose name or description contains the query, ignoring case
pub fn filter_extensions(records: &[ExtensionRecord], query: &str) -> Vec<ExtensionRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&query)
                || r.description
                    .as_deref()
                    .map_or(false, |d| d.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

/// Pick the icon URL to show for a record
pub fn best_icon_url(record: &ExtensionRecord) -> &str {
    PREFERRED_ICON_SIZES
        .iter()
        .find_map(|size| record.icons.iter().find(|icon| icon.size == *size))
        .or_else(|| record.icons.first())
        .map_or(DEFAULT_ICON, |icon| icon.url.as_str())
}

/// "3/5 extensions enabled"
pub fn enabled_stats(records: &[ExtensionRecord]) -> String {
    let enabled = records.iter().filter(|r| r.enabled).count();
    format!("{}/{} extensions enabled", enabled, records.len())
}
