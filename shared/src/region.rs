use std::sync::LazyLock;

use serde::Serialize;

use crate::geometry::{BezPath, Point, Rect, area_bounds, contains_even_odd, parse_path};

/// Width of the virtual canvas all region geometry is authored in.
pub const VIRTUAL_WIDTH: f64 = 1000.0;
/// Height of the virtual canvas all region geometry is authored in.
pub const VIRTUAL_HEIGHT: f64 = 1200.0;

/// Region the viewport centers on at startup and after a reset.
pub const DEFAULT_REGION_ID: &str = "33301";

/// Authoring-time description of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionDef {
    pub id: &'static str,
    pub name: &'static str,
    pub path: &'static str,
    pub label_anchor: (f64, f64),
}

const REGION_TABLE: &[RegionDef] = &[
    RegionDef {
        id: "33480",
        name: "Palm Beach",
        path: "M 868 40 C 874 80, 882 140, 886 200 C 889 250, 886 300, 880 330 L 864 330 C 870 290, 873 220, 868 40 Z",
        label_anchor: (878.0, 180.0),
    },
    RegionDef {
        id: "33401",
        name: "West Palm Beach",
        path: "M 720 60 L 858 50 L 852 230 C 830 248, 790 240, 760 258 C 728 276, 712 200, 720 60 Z",
        label_anchor: (790.0, 150.0),
    },
    RegionDef {
        id: "33431",
        name: "Boca Raton",
        path: "M 690 280 L 848 272 C 852 300, 854 320, 850 340 L 696 348 C 688 320, 686 300, 690 280 Z",
        label_anchor: (770.0, 310.0),
    },
    RegionDef {
        id: "33301",
        name: "Fort Lauderdale",
        path: "M 680 365 C 720 358, 790 356, 848 368 L 852 455 C 800 468, 740 462, 676 472 C 664 430, 668 395, 680 365 Z",
        label_anchor: (755.0, 410.0),
    },
    RegionDef {
        id: "33009",
        name: "Hallandale Beach",
        path: "M 740 560 L 856 552 C 860 590, 858 620, 852 650 L 744 656 C 736 625, 736 590, 740 560 Z",
        label_anchor: (798.0, 604.0),
    },
    RegionDef {
        id: "33027",
        name: "Miramar",
        path: "M 470 540 L 660 548 C 668 590, 665 640, 655 690 L 462 698 C 448 650, 455 590, 470 540 Z",
        label_anchor: (560.0, 620.0),
    },
];

/// A named territory with its hit geometry and label anchor, in virtual coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
    pub path: &'static str,
    #[serde(skip)]
    pub outline: BezPath,
    pub bounds: Rect,
    pub label_anchor: Point,
}

impl Region {
    pub fn from_def(def: &RegionDef) -> Result<Self, String> {
        let outline = parse_path(def.path).map_err(|e| format!("region {}: {e}", def.id))?;
        let bounds = area_bounds(&outline)
            .ok_or_else(|| format!("region {}: boundary has no area", def.id))?;
        Ok(Self {
            id: def.id,
            name: def.name,
            path: def.path,
            outline,
            bounds,
            label_anchor: Point::new(def.label_anchor.0, def.label_anchor.1),
        })
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p) && contains_even_odd(&self.outline, p)
    }
}

/// Ordered, immutable set of regions.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
    default_index: Option<usize>,
}

impl RegionRegistry {
    /// Build from definitions. Duplicate ids and malformed paths are errors.
    pub fn from_defs(defs: &[RegionDef], default_id: &str) -> Result<Self, String> {
        let mut regions: Vec<Region> = Vec::with_capacity(defs.len());
        for def in defs {
            if regions.iter().any(|r| r.id == def.id) {
                return Err(format!("duplicate region id {}", def.id));
            }
            regions.push(Region::from_def(def)?);
        }
        let default_index = regions.iter().position(|r| r.id == default_id);
        Ok(Self {
            regions,
            default_index,
        })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The designated default region, falling back to the first region.
    pub fn default_region(&self) -> Option<&Region> {
        self.default_index
            .and_then(|idx| self.regions.get(idx))
            .or_else(|| self.regions.first())
    }

    /// Virtual point the viewport keeps centered. Canvas center when the registry is empty.
    pub fn default_target(&self) -> Point {
        self.default_region()
            .map(|r| r.label_anchor)
            .unwrap_or_else(|| Point::new(VIRTUAL_WIDTH / 2.0, VIRTUAL_HEIGHT / 2.0))
    }
}

static REGISTRY: LazyLock<Result<RegionRegistry, String>> =
    LazyLock::new(|| RegionRegistry::from_defs(REGION_TABLE, DEFAULT_REGION_ID));

static EMPTY_REGISTRY: RegionRegistry = RegionRegistry {
    regions: Vec::new(),
    default_index: None,
};

/// The process-wide built-in registry, built on first access. Either every
/// region builds or the error names the first one that failed.
pub fn try_registry() -> Result<&'static RegionRegistry, &'static str> {
    REGISTRY.as_ref().map_err(String::as_str)
}

/// The built-in registry, or an empty one if [`try_registry`] fails.
/// Hosts check [`try_registry`] once at startup.
pub fn registry() -> &'static RegionRegistry {
    try_registry().unwrap_or(&EMPTY_REGISTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_builds_without_losses() {
        let built = try_registry().expect("built-in regions should build");
        assert_eq!(built.len(), REGION_TABLE.len());
        assert_eq!(registry().len(), REGION_TABLE.len());
        let ids: Vec<_> = registry().regions().iter().map(|r| r.id).collect();
        let table: Vec<_> = REGION_TABLE.iter().map(|d| d.id).collect();
        assert_eq!(ids, table);
    }

    #[test]
    fn default_region_anchor_is_centering_target() {
        let region = registry().default_region().expect("default region");
        assert_eq!(region.id, DEFAULT_REGION_ID);
        assert_eq!(registry().default_target(), Point::new(755.0, 410.0));
    }

    #[test]
    fn label_anchors_sit_inside_their_regions() {
        for region in registry().regions() {
            assert!(
                region.contains(region.label_anchor),
                "anchor of {} is outside its boundary",
                region.id
            );
        }
    }

    #[test]
    fn regions_fit_the_virtual_canvas() {
        for region in registry().regions() {
            assert!(region.bounds.x0 >= 0.0 && region.bounds.x1 <= VIRTUAL_WIDTH);
            assert!(region.bounds.y0 >= 0.0 && region.bounds.y1 <= VIRTUAL_HEIGHT);
        }
    }

    #[test]
    fn region_label_anchors_are_not_shared() {
        for (i, a) in registry().regions().iter().enumerate() {
            for b in &registry().regions()[i + 1..] {
                assert!(!b.contains(a.label_anchor), "{} overlaps {}", b.id, a.id);
            }
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let defs = [REGION_TABLE[0], REGION_TABLE[0]];
        assert!(RegionRegistry::from_defs(&defs, "33480").is_err());
    }

    #[test]
    fn malformed_region_fails_the_whole_build() {
        let defs = [
            RegionDef {
                id: "00000",
                name: "Broken",
                path: "L 0 0",
                label_anchor: (0.0, 0.0),
            },
            REGION_TABLE[3],
        ];
        let err = RegionRegistry::from_defs(&defs, "33301").expect_err("broken path");
        assert!(err.contains("00000"), "{err}");

        let flat = [RegionDef {
            id: "00001",
            name: "Flat",
            path: "M 0 0 L 10 0 Z",
            label_anchor: (0.0, 0.0),
        }];
        assert!(RegionRegistry::from_defs(&flat, "00001").is_err());
    }

    #[test]
    fn exponent_coordinates_build_a_region() {
        let defs = [RegionDef {
            id: "00002",
            name: "Scientific",
            path: "M 0 0 L 1e2 0 L 100 100 L 0 100 Z",
            label_anchor: (50.0, 50.0),
        }];
        let built = RegionRegistry::from_defs(&defs, "00002").expect("valid SVG numbers");
        let region = built.get("00002").expect("region present");
        assert!(region.contains(region.label_anchor));
        assert_eq!(region.bounds, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn missing_default_falls_back_to_first_region() {
        let registry = RegionRegistry::from_defs(&REGION_TABLE[..2], "99999")
            .expect("regions should build");
        assert_eq!(registry.default_region().map(|r| r.id), Some("33480"));

        let empty = RegionRegistry::default();
        assert_eq!(
            empty.default_target(),
            Point::new(VIRTUAL_WIDTH / 2.0, VIRTUAL_HEIGHT / 2.0)
        );
    }
}
