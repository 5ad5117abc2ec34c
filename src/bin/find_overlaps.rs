use std::path::PathBuf;
use std::time::Instant;
use std::{env, io, process};

use overlap_base::{AnnotationTable, Engine, Orientation};
use overlap_base::report;

use getopts::Options;
use log::{info, LevelFilter};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();
    init_logging(config.verbose);

    // Load the annotations.
    let table = AnnotationTable::from_file(&config.input_file).map_err(|x| x.to_string())?;
    info!(
        "The input contains {} sequences and {} annotation types with {} distinct locations",
        table.sequences().len(), table.types(), table.len()
    );

    // Find the overlaps. Any temporary database is removed before this returns.
    info!("Finding overlaps using engine {}", config.engine);
    let summaries = match (&config.temp_dir, config.engine) {
        (Some(dir), Engine::Sqlite) => overlap_base::find_overlaps_in(&table, dir, config.orientation),
        _ => overlap_base::find_overlaps(&table, config.engine, config.orientation),
    }.map_err(|x| x.to_string())?;

    // Report.
    let mut output = io::stdout().lock();
    report::write_report(&summaries, &mut output).map_err(|x| x.to_string())?;

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if verbose {
        builder.filter_module("overlap_base", LevelFilter::Info);
        builder.filter_module("find_overlaps", LevelFilter::Info);
    }
    builder.init();
}

//-----------------------------------------------------------------------------

struct Config {
    pub input_file: PathBuf,
    pub engine: Engine,
    pub temp_dir: Option<PathBuf>,
    pub orientation: Orientation,
    pub verbose: bool,
}

impl Config {
    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} [options] annotations.csv[.gz]", program);

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        let engine_desc = format!("overlap engine: sqlite or memory (default: {})", Engine::default());
        opts.optopt("e", "engine", &engine_desc, "STR");
        opts.optopt("t", "temp-dir", "directory for the temporary database (default: system temp)", "DIR");
        opts.optflag("", "both-orientations", "report each overlapping pair in both orientations");
        opts.optflag("v", "verbose", "print progress information to stderr");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let mut engine = Engine::default();
        if let Some(s) = matches.opt_str("e") {
            match s.parse::<Engine>() {
                Ok(value) => engine = value,
                Err(msg) => {
                    eprintln!("{}", msg);
                    process::exit(1);
                }
            }
        }
        let temp_dir = matches.opt_str("t").map(PathBuf::from);
        if temp_dir.is_some() && engine != Engine::Sqlite {
            eprintln!("Option --temp-dir is ignored with engine {}", engine);
        }

        let orientation = if matches.opt_present("both-orientations") {
            Orientation::Both
        } else {
            Orientation::FirstSeen
        };
        let verbose = matches.opt_present("v");

        let input_file = if let Some(s) = matches.free.first() {
            PathBuf::from(s)
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Config {
            input_file,
            engine,
            temp_dir,
            orientation,
            verbose,
        }
    }
}

//-----------------------------------------------------------------------------
