//! PostGIS `geography(Point,4326)` columns.

use crate::types::{ColumnKind, ColumnType, CustomColumnType};
use crate::value::ColumnValue;

const SQL_TYPE: &str = "geography(Point,4326)";

/// A WGS 84 point stored as a PostGIS geography.
///
/// The value is written through an inlined `ST_SetSRID(ST_MakePoint(..))`
/// expression and read back as a `{latitude, longitude}` JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeographyPoint {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

impl GeographyPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Loads coordinates from the JSON object produced by
    /// [`CustomColumnType::select_expression`].
    pub fn load(&mut self, value: &serde_json::Value) {
        if let Some(object) = value.as_object() {
            self.latitude = object.get("latitude").and_then(serde_json::Value::as_f64);
            self.longitude = object.get("longitude").and_then(serde_json::Value::as_f64);
        }
    }
}

impl CustomColumnType for GeographyPoint {
    fn sql_column_type(&self) -> String {
        String::from(SQL_TYPE)
    }

    fn render(&self) -> Option<ColumnValue> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Some(
                ColumnValue::raw(format!("ST_SetSRID(ST_MakePoint({lon},{lat}),4326)")),
            ),
            _ => None,
        }
    }

    fn select_expression(&self, column: &str, alias: Option<&str>) -> String {
        let alias = alias.unwrap_or(column);
        format!(
            "jsonb_build_object('latitude',ST_Y({column}::geometry), \
             'longitude',ST_X({column}::geometry)) AS {alias}"
        )
    }
}

impl ColumnType for GeographyPoint {
    const KIND: ColumnKind = ColumnKind::Custom;

    fn column_value(&self) -> Option<ColumnValue> {
        self.render()
    }

    fn custom_type(&self) -> Option<&dyn CustomColumnType> {
        Some(self)
    }

    fn declared_sql_type() -> Option<String> {
        Some(String::from(SQL_TYPE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_raw_constructor() {
        let point = GeographyPoint::new(48.5, 2.25);
        assert_eq!(
            point.render(),
            Some(ColumnValue::Raw(
                "ST_SetSRID(ST_MakePoint(2.25,48.5),4326)".into()
            ))
        );
    }

    #[test]
    fn test_incomplete_point_is_absent() {
        let point = GeographyPoint {
            latitude: Some(1.0),
            longitude: None,
        };
        assert_eq!(point.column_value(), None);
    }

    #[test]
    fn test_non_finite_point_is_absent() {
        assert_eq!(GeographyPoint::new(f64::NAN, 1.0).render(), None);
        assert_eq!(GeographyPoint::new(1.0, f64::INFINITY).column_value(), None);
    }

    #[test]
    fn test_select_expression() {
        let point = GeographyPoint::default();
        assert_eq!(
            point.select_expression("location", None),
            "jsonb_build_object('latitude',ST_Y(location::geometry), \
             'longitude',ST_X(location::geometry)) AS location"
        );
    }

    #[test]
    fn test_load_from_json() {
        let mut point = GeographyPoint::default();
        point.load(&serde_json::json!({"latitude": 10.5, "longitude": -3.0}));
        assert_eq!(point, GeographyPoint::new(10.5, -3.0));
    }
}
