use serde::{Deserialize, Serialize};

/// Rectangular lat/lon extent of a dataset's stops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub minimum_latitude: f64,
    pub maximum_latitude: f64,
    pub minimum_longitude: f64,
    pub maximum_longitude: f64,
}

/// Stored bounding box. The four coordinates are written as nulls when the
/// dataset has no usable stops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub minimum_latitude: Option<f64>,
    pub maximum_latitude: Option<f64>,
    pub minimum_longitude: Option<f64>,
    pub maximum_longitude: Option<f64>,
    pub extracted_on: Option<String>,
}

impl BoundingBox {
    pub fn from_extent(extent: Option<Extent>, extracted_on: String) -> Self {
        Self {
            minimum_latitude: extent.map(|e| e.minimum_latitude),
            maximum_latitude: extent.map(|e| e.maximum_latitude),
            minimum_longitude: extent.map(|e| e.minimum_longitude),
            maximum_longitude: extent.map(|e| e.maximum_longitude),
            extracted_on: Some(extracted_on),
        }
    }

    /// The extent, only when all four coordinates are known
    pub fn extent(&self) -> Option<Extent> {
        Some(Extent {
            minimum_latitude: self.minimum_latitude?,
            maximum_latitude: self.maximum_latitude?,
            minimum_longitude: self.minimum_longitude?,
            maximum_longitude: self.maximum_longitude?,
        })
    }

    pub fn overlaps(&self, filter: &BoundingBoxFilter) -> bool {
        are_overlapping_boxes(
            [
                self.minimum_latitude,
                self.maximum_latitude,
                self.minimum_longitude,
                self.maximum_longitude,
            ],
            [
                filter.minimum_latitude,
                filter.maximum_latitude,
                filter.minimum_longitude,
                filter.maximum_longitude,
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    pub bounding_box: BoundingBox,
}

/// Query box for `get_sources_by_bounding_box`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxFilter {
    pub minimum_latitude: Option<f64>,
    pub maximum_latitude: Option<f64>,
    pub minimum_longitude: Option<f64>,
    pub maximum_longitude: Option<f64>,
}

impl BoundingBoxFilter {
    pub fn new(
        minimum_latitude: f64,
        maximum_latitude: f64,
        minimum_longitude: f64,
        maximum_longitude: f64,
    ) -> Self {
        Self {
            minimum_latitude: Some(minimum_latitude),
            maximum_latitude: Some(maximum_latitude),
            minimum_longitude: Some(minimum_longitude),
            maximum_longitude: Some(maximum_longitude),
        }
    }
}

/// Two boxes `[min_lat, max_lat, min_lon, max_lon]` overlap when both their
/// latitude and longitude edges overlap.
pub fn are_overlapping_boxes(source: [Option<f64>; 4], filter: [Option<f64>; 4]) -> bool {
    are_overlapping_edges(source[0], source[1], filter[0], filter[1])
        && are_overlapping_edges(source[2], source[3], filter[2], filter[3])
}

/// Open-interval overlap in one dimension. Touching edges do not overlap and
/// any unknown coordinate yields `false`.
pub fn are_overlapping_edges(
    source_minimum: Option<f64>,
    source_maximum: Option<f64>,
    filter_minimum: Option<f64>,
    filter_maximum: Option<f64>,
) -> bool {
    match (source_minimum, source_maximum, filter_minimum, filter_maximum) {
        (Some(source_min), Some(source_max), Some(filter_min), Some(filter_max)) => {
            source_max > filter_min && filter_max > source_min
        }
        _ => false,
    }
}
