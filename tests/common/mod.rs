//! Fixture builders: small TIGER-like shapefiles and zip archives in temp directories.
#![allow(dead_code)]

use std::{fs::{self, File}, io::{Read, Write}, net::TcpListener, path::{Path, PathBuf}, thread};

use shapefile::{
    dbase::{FieldName, FieldValue, Record, TableWriterBuilder},
    Point, Polygon, PolygonRing, Polyline, Writer,
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

pub const NAD83_PRJ: &str = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295]]"#;
pub const WEB_MERCATOR_PRJ: &str = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],UNIT["Meter",1.0]]"#;

/// Axis-aligned rectangle as a clockwise (outer) shapefile ring.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> PolygonRing<Point> {
    PolygonRing::Outer(vec![
        Point::new(x0, y0), Point::new(x0, y1), Point::new(x1, y1), Point::new(x1, y0), Point::new(x0, y0),
    ])
}

fn table(fields: &[&str]) -> TableWriterBuilder {
    fields.iter().fold(TableWriterBuilder::new(), |builder, &name| {
        builder.add_character_field(FieldName::try_from(name).unwrap(), 80)
    })
}

fn record(fields: &[&str], values: &[&str]) -> Record {
    let mut record = Record::default();
    for (field, value) in fields.iter().zip(values) {
        record.insert(field.to_string(), FieldValue::Character(Some(value.to_string())));
    }
    record
}

fn write_prj(shp: &Path, prj: &str) {
    fs::write(shp.with_extension("prj"), prj).unwrap();
}

/// Write a polygon shapefile; each row is (attribute values, rings of one record).
pub fn write_polygons(shp: &Path, prj: &str, fields: &[&str], rows: &[(&[&str], Vec<PolygonRing<Point>>)]) {
    let mut writer = Writer::from_path(shp, table(fields)).unwrap();
    for (values, rings) in rows {
        writer.write_shape_and_record(&Polygon::with_rings(rings.clone()), &record(fields, values)).unwrap();
    }
    drop(writer);
    write_prj(shp, prj);
}

/// Write a polyline shapefile; each row is (attribute values, vertices of a single-part line).
pub fn write_lines(shp: &Path, prj: &str, fields: &[&str], rows: &[(&[&str], Vec<(f64, f64)>)]) {
    let mut writer = Writer::from_path(shp, table(fields)).unwrap();
    for (values, coords) in rows {
        let line = Polyline::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect());
        writer.write_shape_and_record(&line, &record(fields, values)).unwrap();
    }
    drop(writer);
    write_prj(shp, prj);
}

/// Write a point shapefile.
pub fn write_points(shp: &Path, prj: &str, fields: &[&str], rows: &[(&[&str], (f64, f64))]) {
    let mut writer = Writer::from_path(shp, table(fields)).unwrap();
    for (values, (x, y)) in rows {
        writer.write_shape_and_record(&Point::new(*x, *y), &record(fields, values)).unwrap();
    }
    drop(writer);
    write_prj(shp, prj);
}

/// Zip every file directly inside `dir` into `zip_path`.
pub fn zip_dir(dir: &Path, zip_path: &Path) {
    let mut zip = ZipWriter::new(File::create(zip_path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut entries: Vec<PathBuf> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    entries.sort();
    for path in entries.into_iter().filter(|p| p.is_file()) {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        zip.start_file(name, options).unwrap();
        zip.write_all(&fs::read(&path).unwrap()).unwrap();
    }
    zip.finish().unwrap();
}

pub const STATE_FIELDS: [&str; 4] = ["STATEFP", "STUSPS", "NAME", "GEOID"];
pub const COUNTY_FIELDS: [&str; 3] = ["GEOID", "STATEFP", "NAME"];
pub const PLACE_FIELDS: [&str; 3] = ["GEOID", "STATEFP", "NAME"];
pub const ROAD_FIELDS: [&str; 2] = ["LINEARID", "FULLNAME"];

/// Texas is two rows (mainland plus an island) so its dissolve merges parts.
pub fn write_states(shp: &Path) {
    write_polygons(shp, NAD83_PRJ, &STATE_FIELDS, &[
        (&["48", "TX", "Texas", "48"], vec![rect(-106.0, 26.0, -94.0, 36.0)]),
        (&["48", "TX", "Texas", "48"], vec![rect(-93.5, 27.0, -93.0, 27.5)]),
        (&["40", "OK", "Oklahoma", "40"], vec![rect(-103.0, 36.0, -94.0, 37.0)]),
    ]);
}

pub fn write_counties(shp: &Path) {
    write_polygons(shp, NAD83_PRJ, &COUNTY_FIELDS, &[
        (&["48113", "48", "Dallas"], vec![rect(-97.0, 32.5, -96.5, 33.0)]),
        (&["48201", "48", "Harris"], vec![rect(-95.8, 29.5, -95.0, 30.2)]),
        (&["40109", "40", "Oklahoma"], vec![rect(-97.7, 36.2, -97.1, 36.7)]),
    ]);
}

/// I-35 crosses from Texas into Oklahoma, I-10 stays in Texas, US-412 stays in Oklahoma.
pub fn write_roads(shp: &Path) {
    write_lines(shp, NAD83_PRJ, &ROAD_FIELDS, &[
        (&["1", "I- 35"], vec![(-97.0, 30.0), (-97.0, 36.8)]),
        (&["2", "I- 10"], vec![(-105.0, 31.0), (-95.0, 30.0)]),
        (&["3", "US Hwy 412"], vec![(-99.0, 36.3), (-96.0, 36.5)]),
    ]);
}

/// Dallas ships as two polygon parts; a same-named place in another state must be ignored.
pub fn write_places_48(shp: &Path) {
    write_polygons(shp, NAD83_PRJ, &PLACE_FIELDS, &[
        (&["4819000", "48", "Dallas"], vec![rect(-96.9, 32.6, -96.6, 32.9)]),
        (&["4819001", "48", "Dallas"], vec![rect(-96.55, 32.6, -96.52, 32.65)]),
        (&["4835000", "48", "Houston"], vec![rect(-95.6, 29.6, -95.2, 30.0)]),
        (&["4019000", "40", "Dallas"], vec![rect(-97.0, 36.2, -96.9, 36.3)]),
    ]);
}

/// Build a shapefile with `write`, zip it and place the archive at `downloads/<name>.zip`.
pub fn seed_archive(downloads: &Path, name: &str, stem: &str, write: impl FnOnce(&Path)) -> PathBuf {
    let staging = tempfile::tempdir().unwrap();
    write(&staging.path().join(format!("{stem}.shp")));
    fs::create_dir_all(downloads).unwrap();
    let zip_path = downloads.join(format!("{name}.zip"));
    zip_dir(staging.path(), &zip_path);
    zip_path
}

/// Seed the national archives a run needs, so nothing is downloaded.
pub fn seed_national(downloads: &Path) {
    seed_archive(downloads, "states", "tl_2020_us_state", write_states);
    seed_archive(downloads, "counties", "tl_2020_us_county", write_counties);
    seed_archive(downloads, "roads", "tl_2020_us_primaryroads", write_roads);
}

/// Read back (shape, record) pairs of an output shapefile.
pub fn read_back(shp: &Path) -> Vec<(shapefile::Shape, Record)> {
    let mut reader = shapefile::Reader::from_path(shp).unwrap();
    reader.iter_shapes_and_records().map(|r| r.unwrap()).collect()
}

/// Character field of a record, trimmed.
pub fn field(record: &Record, name: &str) -> String {
    match record.get(name) {
        Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
        other => panic!("field {name}: {other:?}"),
    }
}

/// A base URL nothing listens on, so any unexpected download fails fast.
pub const DEAD_URL: &str = "http://127.0.0.1:9";

/// Serve one canned HTTP response on a local port and return its base URL.
pub fn serve_once(response: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = stream.write_all(response);
    });
    format!("http://{addr}")
}
