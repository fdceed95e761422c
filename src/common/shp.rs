use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::{self as shp, dbase::{FieldValue, Record, TableInfo, TableWriterBuilder}, Reader, Shape};

/// Shapes, attribute records and schema of one shapefile, plus its `.prj` text if present.
pub struct ShapeLayer {
    pub items: Vec<(Shape, Record)>,
    pub table_info: TableInfo,
    pub prj: Option<String>,
}

/// Reads all shapes + attribute records from a given `.shp` file path.
pub fn read_shapefile(path: &Path) -> Result<ShapeLayer> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .with_context(|| format!("Error reading shape+record in {}", path.display()))?;
        items.push((shape, record));
    }

    Ok(ShapeLayer {
        items,
        table_info: reader.into_table_info(),
        prj: read_prj(path)?,
    })
}

/// Read the `.prj` sidecar of a shapefile, trying both extension cases.
fn read_prj(shp_path: &Path) -> Result<Option<String>> {
    for ext in ["prj", "PRJ"] {
        let prj = shp_path.with_extension(ext);
        if prj.is_file() {
            let text = fs::read_to_string(&prj)
                .with_context(|| format!("Failed to read {}", prj.display()))?;
            return Ok(Some(text));
        }
    }
    Ok(None)
}

/// Write features to `path` (plus `.shx`/`.dbf`) using the given attribute schema, and `.prj` if given.
pub fn write_shapefile(path: &Path, table_info: TableInfo, features: &[(Geometry<f64>, Record)], prj: Option<&str>) -> Result<()> {
    let mut writer = shp::Writer::from_path(path, TableWriterBuilder::from_table_info(table_info))
        .with_context(|| format!("Failed to create shapefile: {}", path.display()))?;

    for (geom, record) in features {
        match geom {
            Geometry::Point(p) => writer.write_shape_and_record(&shp_point(p.x(), p.y()), record)?,
            Geometry::MultiPoint(mp) => writer.write_shape_and_record(&multipoint_to_shp(mp), record)?,
            Geometry::MultiLineString(mls) => writer.write_shape_and_record(&lines_to_shp(mls), record)?,
            Geometry::MultiPolygon(mp) => writer.write_shape_and_record(&geo_to_shp(mp), record)?,
            other => bail!("cannot write geometry {:?} to {}", other, path.display()),
        }
    }
    drop(writer);

    if let Some(wkt) = prj {
        let prj_path = path.with_extension("prj");
        fs::write(&prj_path, wkt).with_context(|| format!("Failed to write {}", prj_path.display()))?;
    }
    Ok(())
}

/// Get the trimmed value of a character field from a Record
pub fn get_character_field(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Character(None)) => Ok(String::new()),
        _ => bail!("missing or invalid character field: {}", field)
    }
}

/// Planar coordinates of any shapefile point flavour; Z and M values are dropped.
trait PlanarXY {
    fn xy(&self) -> Coord<f64>;
}

impl PlanarXY for shp::Point { fn xy(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } } }
impl PlanarXY for shp::PointM { fn xy(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } } }
impl PlanarXY for shp::PointZ { fn xy(&self) -> Coord<f64> { Coord { x: self.x, y: self.y } } }

fn points_to_geo<P: PlanarXY>(points: &[P]) -> MultiPoint<f64> {
    MultiPoint(points.iter().map(|p| Point::from(p.xy())).collect())
}

fn parts_to_geo<P: PlanarXY>(parts: &[Vec<P>]) -> MultiLineString<f64> {
    MultiLineString(parts.iter().map(|part| LineString(part.iter().map(PlanarXY::xy).collect())).collect())
}

/// Convert a shapefile shape into a geo geometry. Null shapes map to `None`.
pub fn shape_to_geometry(shape: &Shape) -> Result<Option<Geometry<f64>>> {
    Ok(Some(match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Geometry::Point(p.xy().into()),
        Shape::PointM(p) => Geometry::Point(p.xy().into()),
        Shape::PointZ(p) => Geometry::Point(p.xy().into()),
        Shape::Multipoint(mp) => Geometry::MultiPoint(points_to_geo(mp.points())),
        Shape::MultipointM(mp) => Geometry::MultiPoint(points_to_geo(mp.points())),
        Shape::MultipointZ(mp) => Geometry::MultiPoint(points_to_geo(mp.points())),
        Shape::Polyline(line) => Geometry::MultiLineString(parts_to_geo(line.parts())),
        Shape::PolylineM(line) => Geometry::MultiLineString(parts_to_geo(line.parts())),
        Shape::PolylineZ(line) => Geometry::MultiLineString(parts_to_geo(line.parts())),
        Shape::Polygon(polygon) => Geometry::MultiPolygon(shp_to_geo(polygon.rings())),
        Shape::PolygonM(polygon) => Geometry::MultiPolygon(shp_to_geo(polygon.rings())),
        Shape::PolygonZ(polygon) => Geometry::MultiPolygon(shp_to_geo(polygon.rings())),
        other => bail!("unsupported shape type: {:?}", other.shapetype()),
    }))
}

/// Coerce a shape into an owned multipolygon, raising error if different shape
pub fn shape_to_multipolygon(shape: &Shape) -> Result<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Ok(shp_to_geo(polygon.rings())),
        other => bail!("found non-Polygon shape in layer: {:?}", other.shapetype())
    }
}

/// Ensure first and last are the same for geo::LineString coords
fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last { coords.push(first) }
    }
}

/// Get the signed area of a ring (negative when clockwise)
fn signed_area(pts: &[Coord<f64>]) -> f64 {
    pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
}

/// Convert the rings of a shapefile polygon (2D, M or Z) to geo::MultiPolygon<f64>
fn shp_to_geo<P: PlanarXY>(rings: &[shp::PolygonRing<P>]) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    // Shapefile stores each outer ring followed by its holes
    for ring in rings {
        let mut coords: Vec<Coord<f64>> = ring.points().iter().map(PlanarXY::xy).collect();
        ensure_closed(&mut coords);
        match ring {
            shp::PolygonRing::Outer(_) => {
                if let Some(ext) = current_exterior.replace(LineString(coords)) {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
            }
            shp::PolygonRing::Inner(_) => current_holes.push(LineString(coords)),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}

/// Create a shapefile::Point
#[inline] fn shp_point(x: f64, y: f64) -> shp::Point { shp::Point { x, y } }

/// Convert a ring to shapefile points with the requested winding (shapefile outer rings are clockwise)
fn ring_to_shp(ring: &LineString<f64>, clockwise: bool) -> Vec<shp::Point> {
    let mut coords = ring.0.clone();
    ensure_closed(&mut coords);
    if (signed_area(&coords) < 0.0) != clockwise {
        coords.reverse();
    }
    coords.iter().map(|c| shp_point(c.x, c.y)).collect()
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon
pub fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    let mut rings: Vec<shp::PolygonRing<shp::Point>> = Vec::new();
    for poly in &mp.0 {
        rings.push(shp::PolygonRing::Outer(ring_to_shp(poly.exterior(), true)));
        for hole in poly.interiors() {
            rings.push(shp::PolygonRing::Inner(ring_to_shp(hole, false)));
        }
    }
    shp::Polygon::with_rings(rings)
}

fn lines_to_shp(mls: &MultiLineString<f64>) -> shp::Polyline {
    shp::Polyline::with_parts(
        mls.0.iter()
            .map(|line| line.0.iter().map(|c| shp_point(c.x, c.y)).collect())
            .collect()
    )
}

fn multipoint_to_shp(mp: &MultiPoint<f64>) -> shp::Multipoint {
    shp::Multipoint::new(mp.0.iter().map(|p| shp_point(p.x(), p.y())).collect())
}
