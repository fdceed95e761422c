use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use geo::{BooleanOps, MultiPolygon};
use polars::prelude::*;
use tracing::debug;

use crate::{common::{get_character_field, read_shapefile, shape_to_multipolygon}, crs::Crs, region::Boundary};

/// Polygon regions of one dataset: attribute columns (plus an `idx` row index) alongside their shapes.
#[derive(Debug, Clone)]
pub struct RegionTable {
    data: DataFrame,
    shapes: Vec<MultiPolygon<f64>>,
    crs: Crs,
}

impl RegionTable {
    /// Build a table from named string columns and one shape per row.
    pub fn new(columns: Vec<(&str, Vec<String>)>, shapes: Vec<MultiPolygon<f64>>, crs: Crs) -> Result<Self> {
        for (name, values) in &columns {
            ensure!(
                values.len() == shapes.len(),
                "column {name:?} has {} values but there are {} shapes", values.len(), shapes.len()
            );
        }

        let data = DataFrame::new(
            columns.into_iter()
                .map(|(name, values)| Column::new(name.into(), values))
                .collect()
        )?.with_row_index("idx".into(), None)?;

        Ok(Self { data, shapes, crs })
    }

    /// Load polygon regions from a `.shp`, keeping the listed character fields as columns.
    pub fn from_shapefile(path: &Path, fields: &[&str]) -> Result<Self> {
        let layer = read_shapefile(path)?;
        let crs = Crs::from_prj(layer.prj.as_deref());

        let columns = fields.iter()
            .map(|&field| Ok((
                field,
                layer.items.iter()
                    .map(|(_, record)| get_character_field(record, field))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("reading field {field} from {}", path.display()))?,
            )))
            .collect::<Result<Vec<_>>>()?;

        let shapes = layer.items.iter()
            .map(|(shape, _)| shape_to_multipolygon(shape))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Error converting shapes to multipolygons in shapefile: {}", path.display()))?;

        debug!("loaded {} regions from {} ({:?})", shapes.len(), path.display(), crs);
        Self::new(columns, shapes, crs)
    }

    #[inline] pub fn len(&self) -> usize { self.shapes.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }
    #[inline] pub fn crs(&self) -> &Crs { &self.crs }

    /// String values of a column, in row order.
    pub fn column(&self, name: &str) -> Result<&StringChunked> {
        self.data.column(name)
            .with_context(|| format!("missing column {name:?}"))?
            .str()
            .with_context(|| format!("column {name:?} must be of type String"))
    }

    /// Row mask of values in `column` satisfying `pred`. Nulls never match.
    pub fn mask(&self, column: &str, pred: impl Fn(&str) -> bool) -> Result<BooleanChunked> {
        Ok(self.column(column)?.into_iter()
            .map(|value| Some(value.is_some_and(&pred)))
            .collect())
    }

    /// Row indices selected by `mask`, in row order.
    pub fn select(&self, mask: &BooleanChunked) -> Result<Vec<usize>> {
        let filtered = self.data.filter(mask)?;
        Ok(filtered.column("idx")?.as_materialized_series().idx()?
            .into_no_null_iter()
            .map(|i| i as usize)
            .collect())
    }

    /// Union the selected rows into a single-record boundary.
    pub fn dissolve(&self, rows: &[usize], label: impl Into<String>) -> Result<Boundary> {
        let geometry = rows.iter()
            .map(|&i| self.shapes.get(i).ok_or_else(|| anyhow!("row {i} out of bounds (len = {})", self.len())))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .cloned()
            .reduce(|a, b| a.union(&b))
            .ok_or_else(|| anyhow!("cannot dissolve an empty selection"))?;

        Ok(Boundary::new(label, geometry, self.crs.clone(), rows.len()))
    }
}
