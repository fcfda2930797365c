//! Axis names and coordinate labels.

use chrono::NaiveDateTime;

use crate::error::FieldError;

/// Coordinate labels along one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Coords {
    /// Timestamps, e.g. a `time` axis.
    Time(Vec<NaiveDateTime>),
    /// Floating-point labels, e.g. `lat`/`lon`.
    Float(Vec<f64>),
    /// Integer labels, e.g. `nlayer`, `veg_class` or a bare index.
    Int(Vec<i64>),
}

impl Coords {
    /// Number of labels.
    pub fn len(&self) -> usize {
        match self {
            Coords::Time(v) => v.len(),
            Coords::Float(v) => v.len(),
            Coords::Int(v) => v.len(),
        }
    }

    /// Returns `true` if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the coordinate kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Coords::Time(_) => "time",
            Coords::Float(_) => "float",
            Coords::Int(_) => "int",
        }
    }

    /// Labels at the given positions, in the given order.
    ///
    /// Callers guarantee every index is in bounds.
    pub(crate) fn select(&self, indices: &[usize]) -> Coords {
        match self {
            Coords::Time(v) => Coords::Time(indices.iter().map(|&i| v[i]).collect()),
            Coords::Float(v) => Coords::Float(indices.iter().map(|&i| v[i]).collect()),
            Coords::Int(v) => Coords::Int(indices.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Joins label lists of the same kind end to end.
    pub(crate) fn concat(axis: &str, parts: &[&Coords]) -> Result<Coords, FieldError> {
        let first = parts.first().ok_or_else(|| FieldError::Empty {
            what: format!("coordinates for axis '{axis}'"),
        })?;
        let mut out = (*first).clone();
        for part in &parts[1..] {
            match (&mut out, part) {
                (Coords::Time(a), Coords::Time(b)) => a.extend_from_slice(b),
                (Coords::Float(a), Coords::Float(b)) => a.extend_from_slice(b),
                (Coords::Int(a), Coords::Int(b)) => a.extend_from_slice(b),
                (a, b) => {
                    return Err(FieldError::CoordKind {
                        axis: axis.to_string(),
                        expected: a.kind(),
                        got: b.kind(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Formats the label at `index` for error messages.
    pub(crate) fn label(&self, index: usize) -> String {
        match self {
            Coords::Time(v) => v[index].to_string(),
            Coords::Float(v) => v[index].to_string(),
            Coords::Int(v) => v[index].to_string(),
        }
    }
}

/// A named dimension with its coordinate labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    name: String,
    coords: Coords,
}

impl Axis {
    /// Creates an axis from a name and labels.
    pub fn new(name: impl Into<String>, coords: Coords) -> Self {
        Self {
            name: name.into(),
            coords,
        }
    }

    /// Time axis.
    pub fn time(name: impl Into<String>, times: Vec<NaiveDateTime>) -> Self {
        Self::new(name, Coords::Time(times))
    }

    /// Float-labelled axis.
    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, Coords::Float(values))
    }

    /// Integer-labelled axis.
    pub fn int(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, Coords::Int(values))
    }

    /// Axis labelled `0..len`.
    pub fn range(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, Coords::Int((0..len as i64).collect()))
    }

    /// Axis name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coordinate labels.
    pub fn coords(&self) -> &Coords {
        &self.coords
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns `true` if the axis has no labels.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Timestamps, if this is a time axis.
    pub fn times(&self) -> Result<&[NaiveDateTime], FieldError> {
        match &self.coords {
            Coords::Time(v) => Ok(v),
            other => Err(FieldError::CoordKind {
                axis: self.name.clone(),
                expected: "time",
                got: other.kind(),
            }),
        }
    }

    /// Same labels under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.coords.clone())
    }

    pub(crate) fn with_coords(&self, coords: Coords) -> Self {
        Self::new(self.name.clone(), coords)
    }
}
