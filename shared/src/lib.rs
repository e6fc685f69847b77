pub mod basemap;
pub mod colors;
pub mod geometry;
pub mod hit;
pub mod insights;
pub mod intensity;
pub mod interaction;
pub mod record;
pub mod region;
pub mod stats;
pub mod viewport;

pub use geometry::{BezPath, Point, Rect, Size};
pub use insights::{IntelligenceRow, MarketIntelligence, Tooltip};
pub use intensity::{IntensityScale, IntensityTier, Metric, intensity};
pub use interaction::{InteractionState, InteractionSurface, PointerInput, SelectHandler, TouchPhase};
pub use record::Record;
pub use region::{
    DEFAULT_REGION_ID, Region, RegionRegistry, VIRTUAL_HEIGHT, VIRTUAL_WIDTH, registry,
    try_registry,
};
pub use stats::{AggregateReport, RegionStats, StatsMap, aggregate, aggregate_with_report};
pub use viewport::Viewport;
