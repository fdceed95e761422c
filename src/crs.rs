use std::sync::LazyLock;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};
use regex::Regex;

static UTM_ZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"UTM[ _]ZONE[ _](\d{1,2})([NS])?").expect("valid regex")
});

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Datum { Nad83, Wgs84 }

impl Datum {
    fn proj4(self) -> &'static str {
        match self {
            Datum::Nad83 => "NAD83",
            Datum::Wgs84 => "WGS84",
        }
    }
}

/// Coordinate reference system of a layer, as far as it can be read from an ESRI `.prj`.
#[derive(Clone, Debug)]
pub enum Crs {
    LonLat(Datum),
    Utm { zone: u8, south: bool, datum: Datum },
    WebMercator,
    /// Unrecognized WKT, kept verbatim
    Other(String),
}

impl Default for Crs {
    /// TIGER files ship in NAD83 lon/lat.
    fn default() -> Self { Crs::LonLat(Datum::Nad83) }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Crs::LonLat(a), Crs::LonLat(b)) => a == b,
            (Crs::Utm { zone: z1, south: s1, datum: d1 }, Crs::Utm { zone: z2, south: s2, datum: d2 }) =>
                z1 == z2 && s1 == s2 && d1 == d2,
            (Crs::WebMercator, Crs::WebMercator) => true,
            (Crs::Other(a), Crs::Other(b)) => normalize_wkt(a) == normalize_wkt(b),
            _ => false,
        }
    }
}

fn normalize_wkt(wkt: &str) -> String {
    wkt.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase()
}

impl Crs {
    /// Classify an ESRI WKT string. `None` (no `.prj`) falls back to the default.
    pub fn from_prj(prj: Option<&str>) -> Self {
        let Some(wkt) = prj else { return Crs::default() };
        let upper = wkt.to_ascii_uppercase();

        let datum = if upper.contains("NORTH_AMERICAN_1983") || upper.contains("NAD83") || upper.contains("NAD_1983") {
            Some(Datum::Nad83)
        } else if upper.contains("WGS_1984") || upper.contains("WGS84") || upper.contains("WGS 84") {
            Some(Datum::Wgs84)
        } else {
            None
        };

        if upper.trim_start().starts_with("PROJCS") {
            if upper.contains("MERCATOR_AUXILIARY_SPHERE") || upper.contains("PSEUDO-MERCATOR") || upper.contains("WEB_MERCATOR") {
                return Crs::WebMercator;
            }
            if let (Some(caps), Some(datum)) = (UTM_ZONE.captures(&upper), datum) {
                if let Ok(zone @ 1..=60) = caps[1].parse::<u8>() {
                    let south = caps.get(2).is_some_and(|m| m.as_str() == "S");
                    return Crs::Utm { zone, south, datum };
                }
            }
        } else if upper.trim_start().starts_with("GEOGCS") {
            if let Some(datum) = datum {
                return Crs::LonLat(datum);
            }
        }

        Crs::Other(wkt.to_string())
    }

    /// Whether coordinates are angular (degrees in files, radians for proj4rs).
    pub fn is_geographic(&self) -> bool { matches!(self, Crs::LonLat(_)) }

    /// PROJ.4 definition used for reprojection.
    pub fn proj4(&self) -> Result<String> {
        Ok(match self {
            Crs::LonLat(datum) => format!("+proj=longlat +datum={} +no_defs +type=crs", datum.proj4()),
            Crs::Utm { zone, south, datum } => {
                let south = if *south { " +south" } else { "" };
                format!("+proj=utm +zone={zone}{south} +datum={} +units=m +no_defs +type=crs", datum.proj4())
            }
            Crs::WebMercator =>
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs".to_string(),
            Crs::Other(wkt) => bail!("no PROJ.4 equivalent for unrecognized CRS: {}", wkt.trim()),
        })
    }

    /// Reproject a multipolygon from this CRS into `to`. Identity when both are equal.
    pub fn reproject(&self, shape: &MultiPolygon<f64>, to: &Crs) -> Result<MultiPolygon<f64>> {
        if self == to { return Ok(shape.clone()) }

        let build = |crs: &Crs| -> Result<Proj> {
            let proj_string = crs.proj4()?;
            Proj::from_proj_string(&proj_string)
                .map_err(|e| anyhow!("{e:?}"))
                .with_context(|| format!("failed to build PROJ.4: {proj_string}"))
        };
        let (from, dst) = (build(self)?, build(to)?);
        let (from_geog, to_geog) = (self.is_geographic(), to.is_geographic());

        shape.try_map_coords(|coord: Coord<f64>| -> Result<Coord<f64>> {
            let mut point = if from_geog {
                (coord.x.to_radians(), coord.y.to_radians(), 0.0)
            } else {
                (coord.x, coord.y, 0.0)
            };
            transform(&from, &dst, &mut point)
                .map_err(|e| anyhow!("CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y))?;
            Ok(if to_geog {
                Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
            } else {
                Coord { x: point.0, y: point.1 }
            })
        })
    }
}
