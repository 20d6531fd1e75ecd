use std::{
    fs::File,
    io::{self, BufWriter, Write},
    time::Duration,
};

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use ephemera::{
    bodies::{Body, BodyList},
    ephem_errors::Result,
    ephemeris::{
        engine::Engine,
        request::{Precision, RunConfig},
        run,
    },
    jpl_ephem::ephem_store::EphemerisStore,
    observer::Observer,
    remote_file::VirtualFs,
    sky_coords::{format_dms, format_hms},
    sky_view::{load_deep_sky_catalog, visible_bodies, visible_deep_sky, SkyObject, SkyView},
    time::parse_epoch,
};

#[derive(Parser)]
#[command(name = "ephemera", version, about = "Solar-system ephemerides")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute an ephemeris over a time range
    Run(RunArgs),
    /// List the bodies and catalog objects in a field of view
    Sky(SkyArgs),
    /// Print the header of a JPL DE file
    Header {
        /// Path or http(s) URL of the DE file
        #[arg(long)]
        ephemeris: String,
        /// Network timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// TOML run configuration; flags override its values
    #[arg(long)]
    config: Option<Utf8PathBuf>,
    /// First Julian Date
    #[arg(long)]
    jd_min: Option<f64>,
    /// Last Julian Date (excluded)
    #[arg(long)]
    jd_max: Option<f64>,
    /// Step in days
    #[arg(long)]
    jd_step: Option<f64>,
    /// Observer latitude in degrees, positive north
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,
    /// Observer longitude in degrees, positive east
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<f64>,
    /// Observe from the latitude/longitude instead of the geocentre
    #[arg(long)]
    topocentric: bool,
    /// Julian Date of the RA/Dec equinox
    #[arg(long)]
    ra_dec_epoch: Option<f64>,
    /// -1 ecliptic xyz, 0 xyz, 1 + RA/Dec, 2 + photometry, 3 + physical data
    #[arg(long, allow_negative_numbers = true)]
    format: Option<i32>,
    /// elements or store
    #[arg(long)]
    precision: Option<String>,
    /// Path or http(s) URL of a JPL DE file (store precision)
    #[arg(long)]
    ephemeris: Option<String>,
    /// Write little-endian f64 records instead of text
    #[arg(long)]
    binary: bool,
    /// Output file, standard output when absent
    #[arg(long)]
    output: Option<String>,
    /// Worker threads per time step
    #[arg(long)]
    threads: Option<usize>,
    /// Comma separated body identifiers or names
    #[arg(long)]
    objects: Option<String>,
    /// Network timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Args)]
struct SkyArgs {
    /// Observation date, ISO 8601 UTC
    #[arg(long)]
    date: String,
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,
    /// View direction, degrees from north, clockwise
    #[arg(long, default_value_t = 180.0)]
    azimuth: f64,
    #[arg(long, default_value_t = 45.0, allow_hyphen_values = true)]
    altitude: f64,
    /// Field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f64,
    /// CSV catalog: name,ra_hours,dec_degrees,size_arcmin,magnitude
    #[arg(long)]
    dso_catalog: Option<Utf8PathBuf>,
    /// Comma separated bodies, every observable body when absent
    #[arg(long)]
    objects: Option<String>,
    /// JPL DE file for the positions instead of the orbital elements
    #[arg(long)]
    ephemeris: Option<String>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

impl RunArgs {
    fn overrides(&self) -> Result<RunConfig> {
        Ok(RunConfig {
            jd_min: self.jd_min,
            jd_max: self.jd_max,
            jd_step: self.jd_step,
            latitude: self.latitude,
            longitude: self.longitude,
            topocentric: self.topocentric.then_some(true),
            ra_dec_epoch: self.ra_dec_epoch,
            format: self.format,
            precision: self
                .precision
                .as_deref()
                .map(str::parse::<Precision>)
                .transpose()?,
            ephemeris: self.ephemeris.clone(),
            binary: self.binary.then_some(true),
            output: self.output.clone(),
            threads: self.threads,
            objects: self.objects.clone(),
            timeout_ms: self.timeout_ms,
        })
    }
}

fn run_command(args: RunArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let config = base.merge(args.overrides()?);
    let request = config.to_request()?;
    let mut engine = Engine::for_request(&request)?;

    let out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    run(&request, &mut engine, BufWriter::new(out))?;
    Ok(())
}

fn print_object(object: &SkyObject) {
    println!(
        "{:<10} RA {} Dec {} Az {:7.2}° Alt {:+6.2}° mag {:6.2} size {:9.2}\" view ({:+.3}, {:+.3})",
        object.name,
        format_hms(object.ra),
        format_dms(object.dec),
        object.horizontal.azimuth,
        object.horizontal.altitude,
        object.magnitude,
        object.angular_size,
        object.projection.view_x,
        object.projection.view_y
    );
}

fn sky_command(args: SkyArgs) -> Result<()> {
    let epoch = parse_epoch(&args.date)?;
    let observer = Observer::try_new(args.latitude, args.longitude, None, epoch)?;
    let view = SkyView::new(args.azimuth, args.altitude, args.fov);

    let mut engine = match &args.ephemeris {
        Some(location) => Engine::open_store(location, None)?,
        None => Engine::orbital(),
    };
    let bodies: BodyList = match &args.objects {
        Some(list) => Body::parse_list(list)?,
        None => Body::OBSERVABLE.iter().copied().collect(),
    };

    for object in visible_bodies(&mut engine, &observer, &bodies, &view)? {
        print_object(&object);
    }
    if let Some(path) = &args.dso_catalog {
        let catalog = load_deep_sky_catalog(path)?;
        for object in visible_deep_sky(&catalog, &observer, &view) {
            print_object(&object);
        }
    }
    Ok(())
}

fn header_command(location: &str, timeout_ms: Option<u64>) -> Result<()> {
    let (fs, name) = VirtualFs::for_location(location, timeout_ms.map(Duration::from_millis));
    let store = EphemerisStore::open(&fs, &name)?;
    println!("{}", store.header());
    Ok(())
}

fn main() {
    init_logger();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Sky(args) => sky_command(args),
        Commands::Header {
            ephemeris,
            timeout_ms,
        } => header_command(&ephemeris, timeout_ms),
    };

    if let Err(err) = outcome {
        log::error!("{err}");
        eprintln!("ephemera: {err}");
        std::process::exit(1);
    }
}
