//! Result type for the two-level rescaler.

use tellus_field::Field;

use crate::climatology::Climatology;

/// Output of [`rescale_two_level`](crate::rescale_two_level).
#[derive(Debug, Clone)]
pub struct RescaleResult {
    field: Field,
    cell: Field,
    truth: Climatology,
    reference: Climatology,
    zero_spread_cells: usize,
    missing_reference_cells: usize,
}

impl RescaleResult {
    pub(crate) fn new(
        field: Field,
        cell: Field,
        truth: Climatology,
        reference: Climatology,
        zero_spread_cells: usize,
        missing_reference_cells: usize,
    ) -> Self {
        Self {
            field,
            cell,
            truth,
            reference,
            zero_spread_cells,
            missing_reference_cells,
        }
    }

    /// Rescaled series with the truth's axes and labels.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Rescaled grid-cell-mean series.
    pub fn cell(&self) -> &Field {
        &self.cell
    }

    /// Climatology of the collapsed truth series.
    pub fn truth_climatology(&self) -> &Climatology {
        &self.truth
    }

    /// Climatology of the reference series.
    pub fn reference_climatology(&self) -> &Climatology {
        &self.reference
    }

    /// Cells rescaled with the zero-spread fallback.
    pub fn zero_spread_cells(&self) -> usize {
        self.zero_spread_cells
    }

    /// Cells whose reference statistics were missing.
    pub fn missing_reference_cells(&self) -> usize {
        self.missing_reference_cells
    }

    /// Consumes the result, returning the rescaled series.
    pub fn into_field(self) -> Field {
        self.field
    }
}
