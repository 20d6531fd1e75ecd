mod common;

use approx::assert_relative_eq;
use common::{DeFixture, RangeServer, KM_PER_AU};
use ephemera::{
    bodies::Body,
    ephem_errors::EphemError,
    ephemeris::{
        engine::Engine,
        lookup,
        request::{EphemerisRequest, EphemerisRequestBuilder, OutputFormat, Parallelism, Precision},
        run,
    },
    jpl_ephem::ephem_store::EphemerisStore,
};

const BASE_URL: &str = "https://mirror.test/ephemerides";
const URL: &str = "https://mirror.test/ephemerides/fixture.440";

/// Barycentric Earth offset from the EMB, in AU
fn earth_offset(fixture: &DeFixture) -> f64 {
    fixture.positions[common::MOON][1] / (1.0 + fixture.emrat) / KM_PER_AU
}

fn store_request(fixture: &DeFixture, location: &str) -> EphemerisRequestBuilder {
    EphemerisRequest::builder()
        .time_range(fixture.start + 4.0, fixture.start + 64.0, 5.0)
        .precision(Precision::Store)
        .ephemeris(location)
}

#[test]
fn header_over_http() {
    let fixture = DeFixture::default();
    let server = RangeServer::new(URL, fixture.to_bytes());
    let store = EphemerisStore::open(&server.file_system(BASE_URL), "fixture.440").unwrap();

    let header = store.header();
    assert_eq!(header.version(), "DE440");
    assert_eq!(header.recsize(), fixture.recsize());
    assert_eq!(header.record_count(), fixture.records);
    assert_relative_eq!(header.start_jd(), fixture.start);
    assert_relative_eq!(header.end_jd(), fixture.end());
    assert_relative_eq!(header.emrat(), fixture.emrat);
    assert_eq!(server.gets(), 1);
}

#[test]
fn missing_file_over_http() {
    let server = RangeServer::new(URL, DeFixture::default().to_bytes());
    let fs = server.file_system(BASE_URL);
    let err = EphemerisStore::open(&fs, "absent.440").unwrap_err();
    assert!(matches!(err, EphemError::File(_)), "{err:?}");
    assert_eq!(fs.open_handles(), 0);
    assert_eq!(server.gets(), 0);
}

#[test]
fn geocentric_positions_from_the_store() {
    let fixture = DeFixture::default();
    let server = RangeServer::new(URL, fixture.to_bytes());
    let store = EphemerisStore::open(&server.file_system(BASE_URL), "fixture.440").unwrap();
    let mut engine = Engine::Store(store);
    let jd = fixture.start + 10.0;
    let dy = earth_offset(&fixture);

    // Earth at (1, −dy, 0), Mars at (0, 1.5, 0)
    let mars = lookup(&mut engine, Body::Mars, jd).unwrap();
    assert_relative_eq!(mars.ra, (1.5 + dy).atan2(-1.0), epsilon = 1e-12);
    assert_relative_eq!(mars.dec, 0.0, epsilon = 1e-12);
    assert_relative_eq!(mars.earth_distance, (1.0 + (1.5 + dy).powi(2)).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(mars.sun_distance, 1.5, epsilon = 1e-12);
    assert_relative_eq!(mars.position[1], 1.5, epsilon = 1e-12);

    let moon = lookup(&mut engine, Body::Moon, jd).unwrap();
    assert_relative_eq!(moon.earth_distance, 384_400.0 / KM_PER_AU, epsilon = 1e-12);
    assert_relative_eq!(moon.ra_degrees(), 90.0, epsilon = 1e-9);

    let sun = lookup(&mut engine, Body::Sun, jd).unwrap();
    assert_relative_eq!(sun.ra_degrees(), 180.0, epsilon = 0.01);
    assert_relative_eq!(sun.sun_distance, 0.0);

    // Header, then a single record for every lookup of the same span
    assert_eq!(server.gets(), 2);
}

#[test]
fn store_run_reads_each_record_once() {
    let fixture = DeFixture::default();
    let server = RangeServer::new(URL, fixture.to_bytes());
    let store = EphemerisStore::open(&server.file_system(BASE_URL), "fixture.440").unwrap();
    let mut engine = Engine::Store(store);

    let request = store_request(&fixture, URL)
        .bodies([Body::Mars, Body::Sun, Body::Jupiter])
        .format(OutputFormat::try_from(1).unwrap())
        .build()
        .unwrap();

    let mut out = Vec::new();
    let summary = run(&request, &mut engine, &mut out).unwrap();
    assert_eq!(summary.steps, 12);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 12);
    for line in &lines {
        assert_eq!(line.split_whitespace().count(), 1 + 3 * 5);
    }

    let first: Vec<f64> = lines[0]
        .split_whitespace()
        .map(|token| token.parse().unwrap())
        .collect();
    assert_relative_eq!(first[0], fixture.start + 4.0, epsilon = 1e-9);
    assert_relative_eq!(first[2], 1.5, epsilon = 1e-8);

    // Header plus records 0 and 1
    assert_eq!(server.gets(), 3);
}

#[test]
fn local_store_threads_match_sequential() {
    let fixture = DeFixture::default();
    let (_dir, path) = fixture.write_to_tempdir("fixture.440");

    let outputs: Vec<Vec<u8>> = [Parallelism::Sequential, Parallelism::Threads(3)]
        .into_iter()
        .map(|parallelism| {
            let request = store_request(&fixture, path.as_str())
                .bodies(Body::OBSERVABLE)
                .format(OutputFormat::try_from(3).unwrap())
                .parallelism(parallelism)
                .build()
                .unwrap();
            let mut engine = Engine::for_request(&request).unwrap();
            assert_eq!(engine.precision(), Precision::Store);

            let mut out = Vec::new();
            run(&request, &mut engine, &mut out).unwrap();
            out
        })
        .collect();

    assert!(!outputs[0].is_empty());
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn run_stops_at_the_end_of_the_file() {
    let fixture = DeFixture::default();
    let (_dir, path) = fixture.write_to_tempdir("fixture.440");

    let request = EphemerisRequest::builder()
        .time_range(fixture.end() - 14.0, fixture.end() + 16.0, 5.0)
        .bodies([Body::Sun, Body::Mars])
        .precision(Precision::Store)
        .ephemeris(path.as_str())
        .build()
        .unwrap();
    let mut engine = Engine::for_request(&request).unwrap();

    let mut out = Vec::new();
    let err = run(&request, &mut engine, &mut out).unwrap_err();
    assert!(matches!(err, EphemError::DateOutOfRange { .. }), "{err:?}");

    // end − 14, end − 9, end − 4 are inside the file
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
}

#[test]
fn truncated_file_fails_on_the_last_record() {
    let fixture = DeFixture::default();
    let mut bytes = fixture.to_bytes();
    bytes.truncate(bytes.len() - 64);
    let server = RangeServer::new(URL, bytes);
    let mut store = EphemerisStore::open(&server.file_system(BASE_URL), "fixture.440").unwrap();

    assert!(store.state(Body::Mars, fixture.start + 1.0).is_ok());
    assert!(matches!(
        store.state(Body::Mars, fixture.end() - 1.0),
        Err(EphemError::InvalidEphemerisRecord { .. })
    ));
}
