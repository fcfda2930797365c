//! The `Field` container and its reshaping operations.

use chrono::NaiveDateTime;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use tracing::debug;

use crate::axis::{Axis, Coords};
use crate::error::FieldError;

/// A gridded value indexed by named axes.
///
/// # Invariants
///
/// - Axis names are unique.
/// - `data.shape()[i] == axes[i].len()` for every axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    axes: Vec<Axis>,
    data: ArrayD<f64>,
}

impl Field {
    /// Creates a field, checking names and shape against the axes.
    pub fn new(axes: Vec<Axis>, data: ArrayD<f64>) -> Result<Self, FieldError> {
        for (i, a) in axes.iter().enumerate() {
            if axes[..i].iter().any(|b| b.name() == a.name()) {
                return Err(FieldError::DuplicateAxis {
                    axis: a.name().to_string(),
                });
            }
        }
        let expected: Vec<usize> = axes.iter().map(Axis::len).collect();
        if data.shape() != expected.as_slice() {
            return Err(FieldError::ShapeMismatch {
                expected,
                got: data.shape().to_vec(),
            });
        }
        Ok(Self { axes, data })
    }

    /// Creates a field from row-major values.
    pub fn from_vec(axes: Vec<Axis>, values: Vec<f64>) -> Result<Self, FieldError> {
        let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
        let n = values.len();
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| {
            FieldError::ShapeMismatch {
                expected: shape.clone(),
                got: vec![n],
            }
        })?;
        Self::new(axes, data)
    }

    /// Creates a field with every value set to `value`.
    pub fn filled(axes: Vec<Axis>, value: f64) -> Result<Self, FieldError> {
        let shape: Vec<usize> = axes.iter().map(Axis::len).collect();
        Self::new(axes, ArrayD::from_elem(IxDyn(&shape), value))
    }

    /// Same axes, new data.
    pub fn with_data(&self, data: ArrayD<f64>) -> Result<Self, FieldError> {
        Self::new(self.axes.clone(), data)
    }

    /// Axes in storage order.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis names in storage order.
    pub fn names(&self) -> Vec<&str> {
        self.axes.iter().map(Axis::name).collect()
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the field holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying array.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Mutable access to the values. The shape cannot change through this.
    pub fn data_mut(&mut self) -> &mut ArrayD<f64> {
        &mut self.data
    }

    /// Consumes the field, returning its array.
    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    /// Values in logical row-major order.
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    /// Applies `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            axes: self.axes.clone(),
            data: self.data.mapv(f),
        }
    }

    /// Returns `true` if the field has an axis called `name`.
    pub fn has_axis(&self, name: &str) -> bool {
        self.axes.iter().any(|a| a.name() == name)
    }

    /// Storage position of the axis called `name`.
    pub fn axis_index(&self, name: &str) -> Result<usize, FieldError> {
        self.axes
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| FieldError::MissingAxis {
                axis: name.to_string(),
                available: self.owned_names(),
            })
    }

    /// The axis called `name`.
    pub fn axis(&self, name: &str) -> Result<&Axis, FieldError> {
        Ok(&self.axes[self.axis_index(name)?])
    }

    /// Timestamps of the time axis called `name`.
    pub fn times(&self, name: &str) -> Result<&[NaiveDateTime], FieldError> {
        self.axis(name)?.times()
    }

    fn owned_names(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.name().to_string()).collect()
    }

    /// Reorders axes to `order`, which must name every axis exactly once.
    pub fn transpose_to(&self, order: &[&str]) -> Result<Self, FieldError> {
        let not_permutation = || FieldError::NotPermutation {
            requested: order.iter().map(|s| s.to_string()).collect(),
            available: self.owned_names(),
        };
        if order.len() != self.axes.len() {
            return Err(not_permutation());
        }
        let mut perm = Vec::with_capacity(order.len());
        for name in order {
            let k = self.axis_index(name).map_err(|_| not_permutation())?;
            if perm.contains(&k) {
                return Err(not_permutation());
            }
            perm.push(k);
        }
        let axes = perm.iter().map(|&k| self.axes[k].clone()).collect();
        let data = self
            .data
            .view()
            .permuted_axes(perm)
            .as_standard_layout()
            .into_owned();
        Self::new(axes, data)
    }

    /// Renames one axis.
    pub fn rename_axis(&self, from: &str, to: &str) -> Result<Self, FieldError> {
        let k = self.axis_index(from)?;
        let mut axes = self.axes.clone();
        axes[k] = axes[k].renamed(to);
        Self::new(axes, self.data.clone())
    }

    /// Replaces the labels of one axis. The length must not change.
    pub fn with_coords(&self, name: &str, coords: Coords) -> Result<Self, FieldError> {
        let k = self.axis_index(name)?;
        if coords.len() != self.axes[k].len() {
            return Err(FieldError::Misaligned {
                axis: name.to_string(),
                reason: format!(
                    "new coordinates have length {}, axis has length {}",
                    coords.len(),
                    self.axes[k].len()
                ),
            });
        }
        let mut axes = self.axes.clone();
        axes[k] = axes[k].with_coords(coords);
        Ok(Self {
            axes,
            data: self.data.clone(),
        })
    }

    /// Drops the axis called `name`, keeping position `index` along it.
    pub fn index_axis(&self, name: &str, index: usize) -> Result<Self, FieldError> {
        let k = self.axis_index(name)?;
        let len = self.axes[k].len();
        if index >= len {
            return Err(FieldError::IndexOutOfBounds {
                axis: name.to_string(),
                index,
                len,
            });
        }
        let mut axes = self.axes.clone();
        axes.remove(k);
        let data = self.data.index_axis(ndarray::Axis(k), index).to_owned();
        Self::new(axes, data)
    }

    /// Keeps the given positions along `name`, in the given order.
    pub fn select(&self, name: &str, indices: &[usize]) -> Result<Self, FieldError> {
        let k = self.axis_index(name)?;
        let len = self.axes[k].len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(FieldError::IndexOutOfBounds {
                axis: name.to_string(),
                index: bad,
                len,
            });
        }
        let mut axes = self.axes.clone();
        axes[k] = axes[k].with_coords(axes[k].coords().select(indices));
        let data = self.data.select(ndarray::Axis(k), indices);
        Self::new(axes, data)
    }

    /// Keeps the listed timestamps along the time axis `name`.
    ///
    /// Every requested timestamp must be present.
    pub fn select_times(&self, name: &str, times: &[NaiveDateTime]) -> Result<Self, FieldError> {
        let have = self.times(name)?;
        let indices = times
            .iter()
            .map(|t| {
                have.iter()
                    .position(|h| h == t)
                    .ok_or_else(|| FieldError::MissingLabel {
                        axis: name.to_string(),
                        label: t.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.select(name, &indices)
    }

    /// Keeps timestamps within `[start, end]` along the time axis `name`.
    pub fn slice_times(
        &self,
        name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, FieldError> {
        let indices: Vec<usize> = self
            .times(name)?
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= start && **t <= end)
            .map(|(i, _)| i)
            .collect();
        self.select(name, &indices)
    }

    /// Checks that `other` has the same axes with identical labels.
    ///
    /// Axis order may differ.
    pub fn check_aligned(&self, other: &Field) -> Result<(), FieldError> {
        for a in &self.axes {
            let b = other.axis(a.name()).map_err(|_| FieldError::Misaligned {
                axis: a.name().to_string(),
                reason: "axis missing from second field".to_string(),
            })?;
            check_same_coords(a, b)?;
        }
        if let Some(extra) = other.axes.iter().find(|b| !self.has_axis(b.name())) {
            return Err(FieldError::Misaligned {
                axis: extra.name().to_string(),
                reason: "axis missing from first field".to_string(),
            });
        }
        Ok(())
    }

    /// Values of `self` laid out over `target` axes.
    ///
    /// Every axis of `self` must appear in `target` with identical labels;
    /// target axes that `self` lacks are broadcast.
    pub fn broadcast_values(&self, target: &[Axis]) -> Result<ArrayD<f64>, FieldError> {
        let mut positions = Vec::with_capacity(self.axes.len());
        for a in &self.axes {
            let j = target
                .iter()
                .position(|t| t.name() == a.name())
                .ok_or_else(|| FieldError::Misaligned {
                    axis: a.name().to_string(),
                    reason: "axis missing from broadcast target".to_string(),
                })?;
            check_same_coords(a, &target[j])?;
            positions.push(j);
        }

        let mut perm: Vec<usize> = (0..self.axes.len()).collect();
        perm.sort_by_key(|&k| positions[k]);
        let mut view: ArrayViewD<'_, f64> = self.data.view().permuted_axes(perm);
        for (j, t) in target.iter().enumerate() {
            if !self.has_axis(t.name()) {
                view = view.insert_axis(ndarray::Axis(j));
            }
        }

        let shape: Vec<usize> = target.iter().map(Axis::len).collect();
        let broadcast = view
            .broadcast(IxDyn(&shape))
            .ok_or_else(|| FieldError::ShapeMismatch {
                expected: shape.clone(),
                got: self.shape().to_vec(),
            })?;
        Ok(broadcast.as_standard_layout().into_owned())
    }

    /// Joins fields end to end along an existing axis.
    ///
    /// All other axes must carry identical labels in the same order.
    pub fn concat(fields: &[Field], name: &str) -> Result<Self, FieldError> {
        let first = fields.first().ok_or_else(|| FieldError::Empty {
            what: "fields to concatenate".to_string(),
        })?;
        let k = first.axis_index(name)?;
        for f in &fields[1..] {
            if f.names() != first.names() {
                return Err(FieldError::Misaligned {
                    axis: name.to_string(),
                    reason: format!("axis order {:?} vs {:?}", f.names(), first.names()),
                });
            }
            for (a, b) in first.axes.iter().zip(&f.axes) {
                if a.name() != name {
                    check_same_coords(a, b)?;
                }
            }
        }

        let parts: Vec<&Coords> = fields.iter().map(|f| f.axes[k].coords()).collect();
        let coords = Coords::concat(name, &parts)?;
        let views: Vec<ArrayViewD<'_, f64>> = fields.iter().map(|f| f.data.view()).collect();
        let data = ndarray::concatenate(ndarray::Axis(k), &views).map_err(|_| {
            FieldError::ShapeMismatch {
                expected: first.shape().to_vec(),
                got: fields.iter().flat_map(|f| f.shape().to_vec()).collect(),
            }
        })?;

        let mut axes = first.axes.clone();
        axes[k] = axes[k].with_coords(coords);
        debug!(axis = name, parts = fields.len(), len = axes[k].len(), "concatenated");
        Self::new(axes, data)
    }

    /// Stacks identically shaped fields along a new leading axis.
    pub fn stack(fields: &[Field], axis: Axis) -> Result<Self, FieldError> {
        let first = fields.first().ok_or_else(|| FieldError::Empty {
            what: "fields to stack".to_string(),
        })?;
        if axis.len() != fields.len() {
            return Err(FieldError::Misaligned {
                axis: axis.name().to_string(),
                reason: format!("{} labels for {} fields", axis.len(), fields.len()),
            });
        }
        if first.has_axis(axis.name()) {
            return Err(FieldError::DuplicateAxis {
                axis: axis.name().to_string(),
            });
        }
        for f in &fields[1..] {
            if f.names() != first.names() {
                return Err(FieldError::Misaligned {
                    axis: axis.name().to_string(),
                    reason: format!("axis order {:?} vs {:?}", f.names(), first.names()),
                });
            }
            for (a, b) in first.axes.iter().zip(&f.axes) {
                check_same_coords(a, b)?;
            }
        }

        let views: Vec<ArrayViewD<'_, f64>> = fields.iter().map(|f| f.data.view()).collect();
        let data = ndarray::stack(ndarray::Axis(0), &views).map_err(|_| {
            FieldError::ShapeMismatch {
                expected: first.shape().to_vec(),
                got: fields.iter().flat_map(|f| f.shape().to_vec()).collect(),
            }
        })?;

        let mut axes = Vec::with_capacity(first.axes.len() + 1);
        axes.push(axis);
        axes.extend(first.axes.iter().cloned());
        Self::new(axes, data)
    }
}

fn check_same_coords(a: &Axis, b: &Axis) -> Result<(), FieldError> {
    if a.coords() == b.coords() {
        return Ok(());
    }
    let reason = if a.len() != b.len() {
        format!("length {} vs {}", a.len(), b.len())
    } else if a.coords().kind() != b.coords().kind() {
        format!("{} vs {} coordinates", a.coords().kind(), b.coords().kind())
    } else {
        let i = (0..a.len())
            .find(|&i| a.coords().label(i) != b.coords().label(i))
            .unwrap_or(0);
        format!(
            "label {} vs {} at position {i}",
            a.coords().label(i),
            b.coords().label(i)
        )
    };
    Err(FieldError::Misaligned {
        axis: a.name().to_string(),
        reason,
    })
}
