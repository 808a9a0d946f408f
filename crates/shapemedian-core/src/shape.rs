//! Shape kinds and their area formulas.
//!
//! Every shape needs a fixed number of independent distance measurements.
//! Square and circle take one (side, radius); rectangle and ellipse take two
//! (base and height, semi-axes). Formulas are pure and total.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Closed set of shapes the pipeline measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Square,
    Rectangle,
    Circle,
    Ellipse,
}

impl ShapeKind {
    /// All kinds in output order.
    pub const ALL: [ShapeKind; 4] = [Self::Square, Self::Rectangle, Self::Circle, Self::Ellipse];

    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
        }
    }

    /// Number of distance measurements the formula consumes.
    pub fn dimensions(self) -> usize {
        match self {
            Self::Square | Self::Circle => 1,
            Self::Rectangle | Self::Ellipse => 2,
        }
    }

    /// Human-readable formula, for listings.
    pub fn formula(self) -> &'static str {
        match self {
            Self::Square => "d²",
            Self::Rectangle => "d1 × d2",
            Self::Circle => "π × d²",
            Self::Ellipse => "π × d1 × d2",
        }
    }

    /// Area for the given distances, consumed in request order.
    ///
    /// `distances` must hold exactly [`dimensions`](Self::dimensions) values.
    pub fn area(self, distances: &[f64]) -> f64 {
        debug_assert_eq!(distances.len(), self.dimensions(), "{self}: wrong arity");
        match self {
            Self::Square => square(distances[0]),
            Self::Rectangle => rectangle(distances[0], distances[1]),
            Self::Circle => circle(distances[0]),
            Self::Ellipse => ellipse(distances[0], distances[1]),
        }
    }

    /// Position in [`ALL`](Self::ALL).
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ShapeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "rectangle" => Ok(Self::Rectangle),
            "circle" => Ok(Self::Circle),
            "ellipse" | "ellipsis" => Ok(Self::Ellipse),
            other => Err(ConfigError::UnknownShape(other.to_string())),
        }
    }
}

/// Parse a comma-separated shape list, or `"all"`.
///
/// Duplicates collapse and the result is always in declared order.
pub fn parse_shape_list(list: &str) -> Result<Vec<ShapeKind>, ConfigError> {
    if list.trim().eq_ignore_ascii_case("all") {
        return Ok(ShapeKind::ALL.to_vec());
    }
    let mut kinds = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<ShapeKind>, _>>()?;
    kinds.sort_unstable();
    kinds.dedup();
    if kinds.is_empty() {
        return Err(ConfigError::NoShapes);
    }
    Ok(kinds)
}

pub fn square(side: f64) -> f64 {
    side * side
}

pub fn rectangle(base: f64, height: f64) -> f64 {
    base * height
}

pub fn circle(radius: f64) -> f64 {
    PI * radius * radius
}

pub fn ellipse(a: f64, b: f64) -> f64 {
    PI * a * b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn formulas() {
        assert!(approx(ShapeKind::Square.area(&[4.0]), 16.0));
        assert!(approx(ShapeKind::Rectangle.area(&[3.0, 5.0]), 15.0));
        assert!(approx(ShapeKind::Circle.area(&[2.0]), 4.0 * PI));
        assert!(approx(ShapeKind::Ellipse.area(&[2.0, 3.0]), 6.0 * PI));
        assert!((ShapeKind::Circle.area(&[2.0]) - 12.566).abs() < 1e-3);
        assert!((ShapeKind::Ellipse.area(&[2.0, 3.0]) - 18.850).abs() < 1e-3);
    }

    #[test]
    fn dimensions_per_kind() {
        let dims: Vec<usize> = ShapeKind::ALL.iter().map(|k| k.dimensions()).collect();
        assert_eq!(dims, vec![1, 2, 1, 2]);
    }

    #[test]
    fn rectangle_uses_both_measurements_in_order() {
        assert!(approx(ShapeKind::Rectangle.area(&[1.0, 4.0]), 4.0));
        assert!(approx(ShapeKind::Ellipse.area(&[1.0, 4.0]), 4.0 * PI));
    }

    #[test]
    fn index_matches_declared_order() {
        for (i, kind) in ShapeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("Square".parse::<ShapeKind>(), Ok(ShapeKind::Square));
        assert_eq!(" circle ".parse::<ShapeKind>(), Ok(ShapeKind::Circle));
        assert_eq!("ellipsis".parse::<ShapeKind>(), Ok(ShapeKind::Ellipse));
        assert_eq!(
            "hexagon".parse::<ShapeKind>(),
            Err(ConfigError::UnknownShape("hexagon".into()))
        );
    }

    #[test]
    fn parse_list_normalizes_order() {
        let kinds = parse_shape_list("ellipse,square,ellipse").unwrap();
        assert_eq!(kinds, vec![ShapeKind::Square, ShapeKind::Ellipse]);
        assert_eq!(parse_shape_list("all").unwrap(), ShapeKind::ALL.to_vec());
        assert_eq!(parse_shape_list(" , "), Err(ConfigError::NoShapes));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ShapeKind::Rectangle).unwrap();
        assert_eq!(json, "\"rectangle\"");
    }
}
