use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::{BooleanOps, BoundingRect, Contains, Geometry, Intersects, MultiLineString, MultiPoint, MultiPolygon};
use tracing::{debug, info};

use crate::{common::{ensure_dir_exists, read_shapefile, shape_to_geometry, write_shapefile}, crs::Crs, region::Boundary};

/// Outcome of clipping one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSummary {
    pub output: PathBuf,
    pub input_features: usize,
    pub output_features: usize,
}

/// Intersect one geometry with the mask. `None` when nothing of it lies inside.
///
/// Lines and polygons wholly inside the mask are returned as they are; only features
/// crossing the boundary are rebuilt by the boolean ops.
pub fn clip_geometry(geom: &Geometry<f64>, mask: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let clipped: Geometry<f64> = match geom {
        Geometry::Point(p) => return mask.intersects(p).then_some(Geometry::Point(*p)),
        Geometry::MultiPoint(points) => MultiPoint(
            points.iter().filter(|p| mask.intersects(*p)).copied().collect()
        ).into(),
        Geometry::MultiLineString(lines) if mask.contains(lines) => return Some(geom.clone()),
        Geometry::MultiPolygon(polygons) if mask.contains(polygons) => return Some(geom.clone()),
        Geometry::MultiLineString(lines) => {
            // degenerate parts have nothing to intersect
            let lines = MultiLineString(lines.iter().filter(|l| l.0.len() >= 2).cloned().collect());
            mask.clip(&lines, false).into()
        }
        Geometry::MultiPolygon(polygons) => mask.intersection(polygons).into(),
        _ => return None,
    };

    let empty = match &clipped {
        Geometry::MultiPoint(mp) => mp.0.is_empty(),
        Geometry::MultiLineString(mls) => mls.0.iter().all(|l| l.0.len() < 2),
        Geometry::MultiPolygon(mp) => mp.0.is_empty(),
        _ => false,
    };
    (!empty).then_some(clipped)
}

/// Clip the shapefile at `layer_shp` to `boundary` and write the kept records to `output`.
///
/// The boundary is reprojected into the layer's CRS when they differ; the layer itself is never
/// reprojected, so the output keeps the source coordinates, attributes and `.prj`.
pub fn clip_layer(layer_shp: &Path, boundary: &Boundary, output: &Path) -> Result<ClipSummary> {
    info!("Clipping {} ...", layer_shp.display());
    let layer = read_shapefile(layer_shp)?;
    let layer_crs = Crs::from_prj(layer.prj.as_deref());

    let boundary = if boundary.crs() != &layer_crs {
        info!("Reprojecting boundary from {:?} to {:?}", boundary.crs(), layer_crs);
        boundary.to_crs(&layer_crs)
            .with_context(|| format!("reprojecting boundary to the CRS of {}", layer_shp.display()))?
    } else {
        boundary.clone()
    };
    let mask = boundary.geometry();
    let envelope = mask.bounding_rect();

    let mut kept = Vec::new();
    for (shape, record) in &layer.items {
        let Some(geom) = shape_to_geometry(shape)? else { continue };

        let touches_envelope = match (envelope, geom.bounding_rect()) {
            (Some(env), Some(rect)) => env.intersects(&rect),
            _ => false,
        };
        if !touches_envelope { continue }

        if let Some(clipped) = clip_geometry(&geom, mask) {
            kept.push((clipped, record.clone()));
        }
    }
    debug!("{} of {} features intersect {}", kept.len(), layer.items.len(), boundary.label());

    if let Some(parent) = output.parent() {
        ensure_dir_exists(parent)?;
    }
    write_shapefile(output, layer.table_info, &kept, layer.prj.as_deref())?;
    info!("Saved clipped file: {} (features: {})", output.display(), kept.len());

    Ok(ClipSummary {
        output: output.to_path_buf(),
        input_features: layer.items.len(),
        output_features: kept.len(),
    })
}
