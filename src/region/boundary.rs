use std::{fmt, path::PathBuf, str::FromStr, sync::LazyLock};

use anyhow::Result;
use geo::MultiPolygon;
use regex::Regex;
use tracing::info;

use crate::{crs::Crs, error::TigerError, fetch::Fetcher, region::{RegionTable, StateDirectory}, source::TigerSource};

static COUNTY_GEOID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("valid regex"));

/// Fields read from each TIGER dataset.
const STATE_FIELDS: [&str; 3] = ["STATEFP", "STUSPS", "NAME"];
const COUNTY_FIELDS: [&str; 3] = ["GEOID", "STATEFP", "NAME"];
const PLACE_FIELDS: [&str; 3] = ["GEOID", "STATEFP", "NAME"];

/// Which kind of area the clip boundary is built from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoundaryKind { State, City, Fips }

impl FromStr for BoundaryKind {
    type Err = TigerError;

    /// Accepts `state`/`city`/`fips` in any case, or the menu numbers `1`/`2`/`3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "state" => Ok(BoundaryKind::State),
            "2" | "city" => Ok(BoundaryKind::City),
            "3" | "fips" => Ok(BoundaryKind::Fips),
            _ => Err(TigerError::Validation(
                "Invalid choice. Use 'state', 'city', or 'fips' (or 1/2/3).".to_string()
            )),
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundaryKind::State => "state",
            BoundaryKind::City => "city",
            BoundaryKind::Fips => "fips",
        })
    }
}

/// A validated boundary request. Constructors reject malformed input before any data is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryRequest {
    State { state: String },
    City { city: String, state: String },
    County { geoid: String },
}

fn require_value(value: &str, what: &str) -> Result<String, TigerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TigerError::Validation(format!("{what} must not be empty.")));
    }
    Ok(value.to_string())
}

impl BoundaryRequest {
    pub fn state(state: &str) -> Result<Self, TigerError> {
        Ok(Self::State { state: require_value(state, "State")? })
    }

    pub fn city(city: &str, state: &str) -> Result<Self, TigerError> {
        Ok(Self::City { city: require_value(city, "City name")?, state: require_value(state, "State")? })
    }

    /// County by 5-digit GEOID, e.g. `48113`.
    pub fn county(geoid: &str) -> Result<Self, TigerError> {
        let geoid = geoid.trim();
        if !COUNTY_GEOID.is_match(geoid) {
            return Err(TigerError::Validation(
                "County FIPS must be a 5-digit numeric code, e.g., 48113.".to_string()
            ));
        }
        Ok(Self::County { geoid: geoid.to_string() })
    }

    pub fn kind(&self) -> BoundaryKind {
        match self {
            Self::State { .. } => BoundaryKind::State,
            Self::City { .. } => BoundaryKind::City,
            Self::County { .. } => BoundaryKind::Fips,
        }
    }
}

/// The single dissolved clip mask of a run.
#[derive(Clone, Debug)]
pub struct Boundary {
    label: String,
    geometry: MultiPolygon<f64>,
    crs: Crs,
    source_rows: usize,
}

impl Boundary {
    pub fn new(label: impl Into<String>, geometry: MultiPolygon<f64>, crs: Crs, source_rows: usize) -> Self {
        Self { label: label.into(), geometry, crs, source_rows }
    }

    #[inline] pub fn label(&self) -> &str { &self.label }
    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }
    #[inline] pub fn crs(&self) -> &Crs { &self.crs }
    /// Number of dataset rows merged into this boundary.
    #[inline] pub fn source_rows(&self) -> usize { self.source_rows }

    /// The same boundary expressed in `crs`.
    pub fn to_crs(&self, crs: &Crs) -> Result<Boundary> {
        Ok(Boundary {
            geometry: self.crs.reproject(&self.geometry, crs)?,
            crs: crs.clone(),
            ..self.clone()
        })
    }
}

/// Boundary of one state, given its full name or postal code.
pub fn state_boundary(states: &RegionTable, input: &str) -> Result<Boundary> {
    let code = StateDirectory::from_table(states)?.resolve(input)?;

    let rows = states.select(&states.mask("STATEFP", |v| v == code)?)?;
    if rows.is_empty() {
        return Err(TigerError::EmptyResult(format!("No state found for '{}'.", input.trim())).into());
    }

    let boundary = states.dissolve(&rows, format!("state {code}"))?;
    info!("Boundary: state '{}' (STATEFP={code}), features: 1", input.trim());
    Ok(boundary)
}

/// Boundary of one county, given its 5-digit GEOID.
pub fn county_boundary(counties: &RegionTable, geoid: &str) -> Result<Boundary> {
    let rows = counties.select(&counties.mask("GEOID", |v| v == geoid)?)?;
    if rows.is_empty() {
        return Err(TigerError::EmptyResult(format!(
            "No county found with FIPS '{geoid}'. Use the 5-digit GEOID value."
        )).into());
    }

    let boundary = counties.dissolve(&rows, format!("county {geoid}"))?;
    info!("Boundary: county GEOID={geoid}, features: 1");
    Ok(boundary)
}

/// Boundary of a Census place named `city` inside the state with code `state_code`.
pub fn place_boundary(places: &RegionTable, city: &str, state_code: &str) -> Result<Boundary> {
    let city = city.trim();
    let needle = city.to_lowercase();
    let by_name = places.mask("NAME", |v| v.to_lowercase() == needle)?;
    let by_state = places.mask("STATEFP", |v| v == state_code)?;

    let rows = places.select(&(&by_name & &by_state))?;
    if rows.is_empty() {
        return Err(TigerError::EmptyResult(format!(
            "No place named '{city}' found in state STATEFP={state_code}. Remember this uses Census 'place' names."
        )).into());
    }

    let boundary = places.dissolve(&rows, format!("place {city} ({state_code})"))?;
    info!("Boundary: city '{city}' (STATEFP={state_code}), parts merged: {}, features: 1", rows.len());
    Ok(boundary)
}

/// Builds boundaries from the national state and county layers, fetching per-state places on demand.
pub struct BoundaryBuilder<'a> {
    fetcher: &'a Fetcher,
    source: &'a TigerSource,
    states_shp: PathBuf,
    counties_shp: PathBuf,
}

impl<'a> BoundaryBuilder<'a> {
    pub fn new(fetcher: &'a Fetcher, source: &'a TigerSource, states_shp: PathBuf, counties_shp: PathBuf) -> Self {
        Self { fetcher, source, states_shp, counties_shp }
    }

    fn states(&self) -> Result<RegionTable> {
        RegionTable::from_shapefile(&self.states_shp, &STATE_FIELDS)
    }

    pub fn build(&self, request: &BoundaryRequest) -> Result<Boundary> {
        match request {
            BoundaryRequest::State { state } => state_boundary(&self.states()?, state),
            BoundaryRequest::County { geoid } => {
                let counties = RegionTable::from_shapefile(&self.counties_shp, &COUNTY_FIELDS)?;
                county_boundary(&counties, geoid)
            }
            BoundaryRequest::City { city, state } => {
                let code = StateDirectory::from_table(&self.states()?)?.resolve(state)?;

                let name = TigerSource::place_name(&code);
                let place_shp = self.fetcher.fetch_shapefile(&name, &self.source.place_url(&code))?;
                let places = RegionTable::from_shapefile(&place_shp, &PLACE_FIELDS)?;

                place_boundary(&places, city, &code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_names_and_numbers() {
        for (input, kind) in [
            ("state", BoundaryKind::State), ("1", BoundaryKind::State), (" STATE ", BoundaryKind::State),
            ("city", BoundaryKind::City), ("2", BoundaryKind::City),
            ("fips", BoundaryKind::Fips), ("3", BoundaryKind::Fips), ("Fips\n", BoundaryKind::Fips),
        ] {
            assert_eq!(input.parse::<BoundaryKind>().unwrap(), kind, "{input:?}");
        }
        for bad in ["", "4", "county", "states"] {
            assert!(matches!(bad.parse::<BoundaryKind>(), Err(TigerError::Validation(_))), "{bad:?}");
        }
    }

    #[test]
    fn request_kind_displays_as_its_flag_value() {
        for request in [
            BoundaryRequest::state("TX").unwrap(),
            BoundaryRequest::city("Dallas", "TX").unwrap(),
            BoundaryRequest::county("48113").unwrap(),
        ] {
            let shown = request.kind().to_string();
            assert_eq!(shown.parse::<BoundaryKind>().unwrap(), request.kind());
        }
        assert_eq!(BoundaryRequest::county("48113").unwrap().kind().to_string(), "fips");
    }

    #[test]
    fn county_codes_must_be_five_digits() {
        assert_eq!(
            BoundaryRequest::county(" 48113 ").unwrap(),
            BoundaryRequest::County { geoid: "48113".into() }
        );
        for bad in ["4811", "481130", "4811a", "", "48 13", "４８１１３", "-4811"] {
            assert!(matches!(BoundaryRequest::county(bad), Err(TigerError::Validation(_))), "{bad:?}");
        }
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(matches!(BoundaryRequest::state("  "), Err(TigerError::Validation(_))));
        assert!(matches!(BoundaryRequest::city("", "TX"), Err(TigerError::Validation(_))));
        assert!(matches!(BoundaryRequest::city("Dallas", ""), Err(TigerError::Validation(_))));
        assert_eq!(BoundaryRequest::city(" Dallas ", "TX").unwrap().kind(), BoundaryKind::City);
    }
}
