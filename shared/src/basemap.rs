use crate::geometry::Point;

/// What a base-map layer depicts. Drives fill/stroke style at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Waterway,
    Land,
    Ocean,
    Highway,
    Turnpike,
}

impl LayerKind {
    /// Filled layers are closed areas; the rest are stroked lines.
    pub const fn is_filled(self) -> bool {
        matches!(self, Self::Waterway | Self::Land | Self::Ocean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseLayer {
    pub kind: LayerKind,
    pub path: &'static str,
}

/// City marker drawn beneath the region polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub label: &'static str,
    pub at: Point,
}

/// Stylized base map in back-to-front order.
pub const BASE_LAYERS: &[BaseLayer] = &[
    BaseLayer {
        kind: LayerKind::Waterway,
        path: "M 850 0 C 850 0 883 300 858 600 C 833 900 867 1200 867 1200 L 1000 1200 L 1000 0 Z",
    },
    BaseLayer {
        kind: LayerKind::Land,
        path: "M 0 0 L 850 0 C 853 75, 867 150, 858 225 C 850 300, 842 375, 853 450 C 863 525, 875 600, 863 675 C 850 750, 842 825, 853 900 C 863 975, 875 1050, 863 1125 C 858 1170, 850 1200, 850 1200 L 0 1200 Z",
    },
    BaseLayer {
        kind: LayerKind::Ocean,
        path: "M 900 0 C 908 150, 925 450, 908 750 C 892 1050, 900 1200, 900 1200 L 1000 1200 L 1000 0 Z",
    },
    BaseLayer {
        kind: LayerKind::Highway,
        path: "M 792 0 C 792 0 825 300 800 600 C 775 900 808 1200 808 1200",
    },
    BaseLayer {
        kind: LayerKind::Turnpike,
        path: "M 683 0 C 683 0 717 450 650 750 C 583 1050 600 1200 600 1200",
    },
];

pub const LANDMARKS: &[Landmark] = &[
    Landmark {
        label: "W. Palm Beach",
        at: Point::new(712.0, 128.0),
    },
    Landmark {
        label: "Ft. Lauderdale",
        at: Point::new(665.0, 408.0),
    },
    Landmark {
        label: "Miramar",
        at: Point::new(450.0, 620.0),
    },
];
