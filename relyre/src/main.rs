use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write as _};
use std::ops::Range;
use std::path::{Path, PathBuf};

use liblyre_audio::source::spectrogram_from_samples;
use liblyre_audio::{
    best_match, constellation_map, identify_spectrogram, read_spectrogram_file, FingerprintDb,
    MatchScore, PipelineConfig, Reader, Spectrogram, Writer, PEAK_FILE_EXT,
};

#[cfg(unix)]
use liblyre_audio::source::device::{FftAccelerator, DEVICE_PATH, SAMPLING_FREQ};
#[cfg(not(unix))]
const DEVICE_PATH: &str = "/dev/fft_accelerator";
#[cfg(not(unix))]
const SAMPLING_FREQ: u32 = 48_000;

mod audio;

#[derive(Parser)]
#[command(name = "lyre")]
#[command(version = "0.1.0")]
#[command(about = "Constellation-map song recognizer", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll the song list, then identify live audio interactively
    Run {
        /// Song list file, one constellation name per line
        #[arg(long, default_value = "song_list.txt")]
        list: PathBuf,
        /// Directory holding <name>.peak constellation files
        #[arg(long, default_value = "constellationFiles")]
        library: PathBuf,
        /// FFT accelerator device path
        #[arg(long, default_value = DEVICE_PATH)]
        device: String,
        /// Seconds to record per query
        #[arg(long, default_value_t = 15.0)]
        listen: f32,
    },
    /// Compute a constellation file from a spectrogram or audio file
    Map {
        /// Input spectrogram text file (or audio file with --audio)
        input: PathBuf,
        /// Output file (defaults to <input>.peak)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Decode the input as audio instead of spectrogram text
        #[arg(long)]
        audio: bool,
        /// Use the historical 128-bin file pipeline configuration
        #[arg(long)]
        legacy: bool,
    },
    /// Record from the FFT device and write a constellation file
    Capture {
        /// Song name; the constellation is written to <name>.peak
        name: String,
        /// Seconds to record
        #[arg(long, default_value_t = 200.0)]
        listen: f32,
        /// FFT accelerator device path
        #[arg(long, default_value = DEVICE_PATH)]
        device: String,
    },
    /// Identify one query file against an enrolled song list
    Identify {
        /// Query spectrogram text file (or audio file with --audio)
        query: PathBuf,
        #[arg(long, default_value = "song_list.txt")]
        list: PathBuf,
        #[arg(long, default_value = "constellationFiles")]
        library: PathBuf,
        /// Clip every spectrogram row to a column window
        #[arg(long, value_name = "START:WIDTH")]
        clip: Option<String>,
        /// Decode the query as audio instead of spectrogram text
        #[arg(long)]
        audio: bool,
        /// Print the full ranking as JSON
        #[arg(long)]
        json: bool,
        /// Use the historical 128-bin file pipeline configuration
        #[arg(long)]
        legacy: bool,
    },
    /// Show information about a constellation file
    Info {
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Report band counts for the historical 128-bin band table
        #[arg(long)]
        legacy: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match cli.command {
        Commands::Run {
            list,
            library,
            device,
            listen,
        } => run(&list, &library, &device, listen),
        Commands::Map {
            input,
            output,
            audio,
            legacy,
        } => map(&input, output, audio, legacy),
        Commands::Capture {
            name,
            listen,
            device,
        } => capture(&name, listen, &device),
        Commands::Identify {
            query,
            list,
            library,
            clip,
            audio,
            json,
            legacy,
        } => identify_file(&query, &list, &library, clip, audio, json, legacy),
        Commands::Info { input, json, legacy } => info(&input, json, legacy),
    }
}

/// Enroll every song named in the list file
///
/// A song that cannot be read or parsed is skipped with a diagnostic;
/// one bad file must not poison the rest of the library.
fn enroll_from_list(list: &Path, library: &Path, cfg: &PipelineConfig) -> Result<FingerprintDb> {
    let text = std::fs::read_to_string(list)
        .with_context(|| format!("Failed to read song list {}", list.display()))?;

    let mut db = FingerprintDb::new();

    for name in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let enrolled = load_library_entry(library, name, cfg)
            .and_then(|constellation| db.enroll(name, &constellation, cfg).map_err(|e| anyhow::anyhow!(e)));
        match enrolled {
            Ok(id) => {
                let count = db.song(id).map(|s| s.fingerprint_count).unwrap_or(0);
                println!("({}) {} databased: {} hash table entries", id, name, count);
            }
            Err(e) => eprintln!("skipping {}: {:#}", name, e),
        }
    }

    println!(
        "Full database completed: {} songs, {} fingerprints\n",
        db.num_songs(),
        db.num_entries()
    );
    Ok(db)
}

/// Resolve one song-list entry to a constellation
///
/// Prefers a pre-computed `<name>.peak` file; falls back to treating
/// the entry itself as a spectrogram text file or, by extension, as an
/// audio file to decode and transform.
fn load_library_entry(
    library: &Path,
    name: &str,
    cfg: &PipelineConfig,
) -> Result<liblyre_audio::Constellation> {
    let peak_path = library.join(format!("{}.{}", name, PEAK_FILE_EXT));
    if peak_path.exists() {
        return Reader::new()
            .read_file(&peak_path)
            .map_err(|e| anyhow::anyhow!(e));
    }

    let path = library.join(name);
    let is_audio = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac")
    );
    let spec = load_spectrogram(&path, is_audio, None, cfg)?;
    constellation_map(&spec, cfg).map_err(|e| anyhow::anyhow!(e))
}

#[cfg(unix)]
fn run(list: &Path, library: &Path, device: &str, listen: f32) -> Result<()> {
    // the device is the one startup dependency nothing can stand in for
    let accelerator = match FftAccelerator::open_path(device) {
        Ok(accelerator) => accelerator,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(-1);
        }
    };

    let cfg = PipelineConfig::default();
    let db = enroll_from_list(list, library, &cfg)?;

    let stdin = io::stdin();
    loop {
        println!("Ready to identify. Press ENTER to identify the song playing.");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF, clean shutdown
        }

        println!("Listening for {:.0} seconds...", listen);
        let spec = accelerator.record(listen);
        println!("Done listening.");

        match identify_spectrogram(&db, &spec, &cfg) {
            Ok(ranking) => print_ranking(&ranking),
            Err(e) => eprintln!("query failed: {}", e),
        }
    }

    Ok(())
}

#[cfg(not(unix))]
fn run(_list: &Path, _library: &Path, _device: &str, _listen: f32) -> Result<()> {
    bail!("live capture requires the FFT accelerator character device")
}

fn map(input: &Path, output: Option<PathBuf>, audio: bool, legacy: bool) -> Result<()> {
    let cfg = pipeline_config(legacy);
    let spec = load_spectrogram(input, audio, None, &cfg)?;
    println!(
        "Spectrogram: {} bins x {} columns",
        spec.bins(),
        spec.len()
    );

    let constellation =
        constellation_map(&spec, &cfg).map_err(|e| anyhow::anyhow!(e))?;
    println!("Constellation: {} peaks", constellation.len());

    let output = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}.{}", input.display(), PEAK_FILE_EXT))
    });
    Writer::new()
        .write_file(&constellation, &output)
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("Wrote {}", output.display());
    Ok(())
}

#[cfg(unix)]
fn capture(name: &str, listen: f32, device: &str) -> Result<()> {
    let accelerator = FftAccelerator::open_path(device).map_err(|e| anyhow::anyhow!(e))?;

    let cfg = PipelineConfig::default();
    println!("Listening for {:.0} seconds...", listen);
    let spec = accelerator.record(listen);
    println!("Done listening: {} columns captured.", spec.len());

    let constellation = constellation_map(&spec, &cfg).map_err(|e| anyhow::anyhow!(e))?;
    let output = PathBuf::from(format!("{}.{}", name, PEAK_FILE_EXT));
    Writer::new()
        .write_file(&constellation, &output)
        .map_err(|e| anyhow::anyhow!(e))?;
    println!(
        "Wrote constellation map for {} ({} peaks) to {}",
        name,
        constellation.len(),
        output.display()
    );
    Ok(())
}

#[cfg(not(unix))]
fn capture(_name: &str, _listen: f32, _device: &str) -> Result<()> {
    bail!("live capture requires the FFT accelerator character device")
}

#[allow(clippy::too_many_arguments)]
fn identify_file(
    query: &Path,
    list: &Path,
    library: &Path,
    clip: Option<String>,
    audio: bool,
    json: bool,
    legacy: bool,
) -> Result<()> {
    let cfg = pipeline_config(legacy);
    let db = enroll_from_list(list, library, &cfg)?;
    if db.num_songs() == 0 {
        bail!("no songs could be enrolled from {}", list.display());
    }

    let clip = clip.map(|s| parse_clip(&s)).transpose()?;
    let spec = load_spectrogram(query, audio, clip, &cfg)?;

    let ranking = identify_spectrogram(&db, &spec, &cfg).map_err(|e| anyhow::anyhow!(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranking)?);
    } else {
        print_ranking(&ranking);
    }
    Ok(())
}

fn info(input: &Path, json: bool, legacy: bool) -> Result<()> {
    let cfg = pipeline_config(legacy);
    let constellation = Reader::new()
        .read_file(input)
        .map_err(|e| anyhow::anyhow!(e))?;

    let span = constellation.time_span();
    let seconds = span.map(|(first, last)| {
        // one column per DOWN_SAMPLING_FACTOR input samples
        (last - first) as f32 * 512.0 / SAMPLING_FREQ as f32
    });
    let bands = constellation.band_counts(&cfg.bands);

    if json {
        let value = serde_json::json!({
            "peaks": constellation.len(),
            "bytes": constellation.len() * 4,
            "time_span": span.map(|(first, last)| [first, last]),
            "seconds": seconds,
            "band_counts": &bands[1..],
            "content_hash": constellation.content_hash().to_hex().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Constellation file");
    println!("───────────────────────────────");
    println!("  Peaks:       {}", constellation.len());
    println!("  Size:        {} bytes", constellation.len() * 4);
    if let (Some((first, last)), Some(secs)) = (span, seconds) {
        println!("  Time span:   {}..{} ({:.1}s)", first, last, secs);
    }
    for (band, count) in bands.iter().enumerate().skip(1) {
        println!("  Band {}:      {} peaks", band, count);
    }
    println!(
        "  Content:     {}",
        constellation.content_hash().to_hex()
    );
    Ok(())
}

fn print_ranking(ranking: &[MatchScore]) {
    match best_match(ranking) {
        Some(top) => println!("Best match: {}", top.name),
        None => println!("No match."),
    }
    for score in ranking {
        println!("  -{} /{:.4}/ {}", score.name, score.score, score.count);
    }
}

fn pipeline_config(legacy: bool) -> PipelineConfig {
    if legacy {
        PipelineConfig::legacy_file()
    } else {
        PipelineConfig::default()
    }
}

/// Load a query/enrollment spectrogram from text or audio input
fn load_spectrogram(
    input: &Path,
    audio: bool,
    clip: Option<Range<usize>>,
    cfg: &PipelineConfig,
) -> Result<Spectrogram> {
    if audio {
        let (samples, rate) = audio::read_audio_mono(input)?;
        if rate != SAMPLING_FREQ {
            log::warn!(
                "{}: sample rate {} differs from the pipeline rate {}; peak times will be scaled",
                input.display(),
                rate,
                SAMPLING_FREQ
            );
        }
        let nfft = cfg.n_frequencies * 2;
        Ok(spectrogram_from_samples(&samples, nfft))
    } else {
        read_spectrogram_file(input, clip).map_err(|e| anyhow::anyhow!(e))
    }
}

/// Parse a `start:width` column window
fn parse_clip(text: &str) -> Result<Range<usize>> {
    let (start, width) = text
        .split_once(':')
        .context("clip window must be start:width")?;
    let start: usize = start.trim().parse().context("bad clip start")?;
    let width: usize = width.trim().parse().context("bad clip width")?;
    Ok(start..start + width)
}
