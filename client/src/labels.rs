use territory_shared::{MarketIntelligence, RegionRegistry};

/// Location hash the host app routes to a region's hub page.
pub(crate) fn hub_hash(region_id: &str) -> String {
    format!("#/hub/{region_id}")
}

pub(crate) fn zoom_percent(scale: f64) -> String {
    format!("{}%", (scale * 100.0).round() as i64)
}

pub(crate) fn lock_title(locked: bool) -> &'static str {
    if locked {
        "Unlock map to pan"
    } else {
        "Lock map position"
    }
}

/// Summary line for the "Active Territory" card.
pub(crate) fn active_territory_text(
    intel: &MarketIntelligence,
    registry: &RegionRegistry,
) -> String {
    let Some(id) = intel.active_region.as_deref() else {
        return "No recent activity in the current record set.".to_string();
    };
    match registry.get(id) {
        Some(region) => format!(
            "Zip code {id} ({}) is showing the most recent activity.",
            region.name
        ),
        None => format!("Zip code {id} is showing the most recent activity."),
    }
}

pub(crate) fn record_count_label(count: usize) -> String {
    match count {
        1 => "1 record".to_string(),
        n => format!("{n} records"),
    }
}
