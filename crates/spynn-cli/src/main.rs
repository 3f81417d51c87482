//! `spynn`: host-side tooling for population cores.
//!
//! ```text
//! USAGE:
//!   spynn estimate [population]              Per-core resource estimate
//!   spynn dataspec [population] --out <dir>  Write per-core data specifications
//!   spynn dump <spec>                        Report and region table of a specification
//!   spynn provenance <file> --x --y --p      Decode a provenance region
//!   spynn extract [population] --dir <dir>   Decode recorded regions read back from cores
//! ```
//!
//! Population flags are shared: `--neurons`, `--atoms-per-core`,
//! `--run-ms` (repeat for consecutive runs), `--timestep-us`,
//! `--time-scale-factor` and `--record`.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use spynn_chip::PopulationRegion;
use spynn_dataspec::DataSpecification;
use spynn_population::prelude::*;
use spynn_population::provenance::decode_population_provenance;
use spynn_population::{ProvenanceSource, ReceivesBuffersToHost};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cores per chip available to populations (core 0 runs the monitor).
const APPLICATION_CORES_PER_CHIP: usize = 16;

/// Key space per core; routing keys of consecutive cores are this far apart.
const KEYS_PER_CORE_SHIFT: u32 = 11;

#[derive(Parser)]
#[command(name = "spynn", about = "Population data specification and recording tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Estimate CPU, DTCM and SDRAM for every core of a population.
    Estimate {
        #[command(flatten)]
        population: PopulationArgs,
    },
    /// Generate the data specification of every core.
    Dataspec {
        #[command(flatten)]
        population: PopulationArgs,
        /// Output directory, one `<x>_<y>_<p>.dsg` per core.
        #[arg(long)]
        out: PathBuf,
        /// Also write a text report next to each specification.
        #[arg(long)]
        report: bool,
    },
    /// Print the report and executed region table of a specification file.
    Dump {
        /// Binary specification written by `dataspec`.
        spec: PathBuf,
    },
    /// Decode a provenance region read back from a population core.
    Provenance {
        /// Raw region bytes.
        file: PathBuf,
        /// Population label used in item names.
        #[arg(long, default_value = "pop_1")]
        label: String,
        /// Chip x.
        #[arg(long, default_value_t = 0)]
        x: u32,
        /// Chip y.
        #[arg(long, default_value_t = 0)]
        y: u32,
        /// Processor.
        #[arg(long, default_value_t = 1)]
        p: u32,
    },
    /// Decode recorded regions, one `<x>_<y>_<p>.<signal>` file per core.
    Extract {
        #[command(flatten)]
        population: PopulationArgs,
        /// Directory holding the region files.
        #[arg(long)]
        dir: PathBuf,
        /// Signal to decode.
        #[arg(long, value_enum, default_value_t = Signal::Spikes)]
        signal: Signal,
    },
}

#[derive(Args)]
struct PopulationArgs {
    /// Population label.
    #[arg(long, default_value = "pop_1")]
    label: String,
    /// Number of LIF neurons.
    #[arg(long, default_value_t = 200)]
    neurons: usize,
    /// Largest slice placed on one core.
    #[arg(long, default_value_t = 100)]
    atoms_per_core: usize,
    /// Run length in ms; repeat for runs continued without reset.
    #[arg(long = "run-ms", default_values_t = [1000.0])]
    run_ms: Vec<f64>,
    /// Machine time step in µs.
    #[arg(long, default_value_t = 1000)]
    timestep_us: u32,
    /// Slow-down factor; derived from the time step when omitted.
    #[arg(long)]
    time_scale_factor: Option<u32>,
    /// Accept wall-clock ticks shorter than 1 ms.
    #[arg(long)]
    allow_sub_millisecond: bool,
    /// Signals to record.
    #[arg(long, value_enum)]
    record: Vec<Signal>,
    /// Sampling interval for voltage and conductance, in ticks.
    #[arg(long, default_value_t = 1)]
    sampling_interval: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Signal {
    Spikes,
    V,
    Gsyn,
}

impl Signal {
    const fn extension(self) -> &'static str {
        match self {
            Self::Spikes => "spikes",
            Self::V => "v",
            Self::Gsyn => "gsyn",
        }
    }

    const fn region(self) -> PopulationRegion {
        match self {
            Self::Spikes => PopulationRegion::SpikeHistory,
            Self::V => PopulationRegion::PotentialHistory,
            Self::Gsyn => PopulationRegion::GsynHistory,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Estimate { population } => cmd_estimate(&population)?,
        Cmd::Dataspec {
            population,
            out,
            report,
        } => cmd_dataspec(&population, &out, report)?,
        Cmd::Dump { spec } => cmd_dump(&spec)?,
        Cmd::Provenance { file, label, x, y, p } => {
            cmd_provenance(&file, &label, CoreLocation::new(x, y, p))?;
        }
        Cmd::Extract {
            population,
            dir,
            signal,
        } => cmd_extract(&population, &dir, signal)?,
    }

    Ok(())
}

fn build_population(args: &PopulationArgs) -> Result<PopulationVertex> {
    let Some((&first, rest)) = args.run_ms.split_first() else {
        bail!("At least one --run-ms is required");
    };
    let config = SimulationConfig::new(
        args.timestep_us,
        args.time_scale_factor,
        args.allow_sub_millisecond,
    )?
    .with_run_time_ms(first)?;

    let mut pop = PopulationVertex::lif_curr_exp(args.label.clone(), args.neurons, config)?;
    for &run in rest {
        pop.extend_run_ms(run)?;
    }
    for signal in &args.record {
        match signal {
            Signal::Spikes => pop.set_recording_spikes(),
            Signal::V => pop.set_recording_v(args.sampling_interval),
            Signal::Gsyn => pop.set_recording_gsyn(args.sampling_interval),
        }
    }
    Ok(pop)
}

/// Slices in order, filling each chip's application cores before the next chip
fn place(args: &PopulationArgs) -> Result<Vec<(Placement, Option<u32>)>> {
    let slices = split_population(args.neurons, args.atoms_per_core)?;
    slices
        .into_iter()
        .enumerate()
        .map(|(i, slice)| -> Result<(Placement, Option<u32>)> {
            let x = u32::try_from(i / APPLICATION_CORES_PER_CHIP)?;
            let p = u32::try_from(i % APPLICATION_CORES_PER_CHIP + 1)?;
            let key = u32::try_from(i)? << KEYS_PER_CORE_SHIFT;
            Ok((Placement::new(slice, CoreLocation::new(x, 0, p)), Some(key)))
        })
        .collect()
}

fn core_file(dir: &Path, location: CoreLocation, extension: &str) -> PathBuf {
    let CoreLocation { x, y, p } = location;
    dir.join(format!("{x}_{y}_{p}.{extension}"))
}

fn cmd_estimate(args: &PopulationArgs) -> Result<()> {
    let pop = build_population(args)?;
    let placements = place(args)?;
    let limits = pop.cost_table().limits(pop.config().timer_period_us()?);

    println!(
        "{}: {} neurons, {} ticks, {} core(s)",
        pop.label(),
        pop.n_atoms(),
        pop.config().n_machine_time_steps,
        placements.len()
    );
    println!("Limits       : {limits}");
    println!();

    let buffered = !pop.recorded_region_ids().is_empty();
    let mut misfits = 0;
    for (placement, _) in &placements {
        let slice = placement.slice;
        let needed = pop.resources_required(&slice);
        let fits = needed.fits(&limits);
        if !fits {
            misfits += 1;
        }
        println!(
            "{:<12} {:<10} {}{}",
            placement.location.to_string(),
            slice.to_string(),
            needed,
            if fits { "" } else { "  (does not fit)" }
        );
        if buffered {
            println!(
                "             buffered {} B/tick, minimum buffer {} B",
                pop.buffered_sdram_per_timestep(&slice),
                pop.minimum_buffer_sdram_usage(&slice)
            );
        }
    }

    if misfits > 0 {
        bail!("{misfits} core(s) exceed the per-core limits; lower --atoms-per-core");
    }
    Ok(())
}

fn cmd_dataspec(args: &PopulationArgs, out: &Path, report: bool) -> Result<()> {
    let mut pop = build_population(args)?;
    let placements = place(args)?;
    let specs = pop.generate_data_specs(&placements)?;

    std::fs::create_dir_all(out).with_context(|| format!("Creating {}", out.display()))?;
    for ((placement, _), spec) in placements.iter().zip(&specs) {
        let path = core_file(out, placement.location, "dsg");
        std::fs::write(&path, spec.to_bytes())
            .with_context(|| format!("Writing {}", path.display()))?;
        if report {
            let path = core_file(out, placement.location, "txt");
            std::fs::write(&path, spec.report())
                .with_context(|| format!("Writing {}", path.display()))?;
        }
        info!("Wrote {} for {}", path.display(), placement.slice);
        println!(
            "{:<12} {:<10} {} B reserved",
            placement.location.to_string(),
            placement.slice.to_string(),
            spec.total_reserved_bytes()
        );
    }
    println!("Binary: {}", pop.binary_file_name());
    Ok(())
}

fn cmd_dump(path: &Path) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let spec = DataSpecification::from_bytes(&data)?;
    print!("{}", spec.report());

    let image = spec.execute()?;
    println!();
    println!("{:<28} {:>10} {:>10}  empty", "region", "size", "written");
    for (index, region) in image.regions() {
        let name = PopulationRegion::from_index(index)
            .map_or_else(|| format!("region {index}"), |r| r.to_string());
        println!(
            "{:<28} {:>10} {:>10}  {}",
            name,
            region.size(),
            region.written,
            region.empty
        );
    }
    println!("{:<28} {:>10}", "total", image.total_bytes());
    Ok(())
}

fn cmd_provenance(path: &Path, label: &str, location: CoreLocation) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let items = decode_population_provenance(&data, &ProvenanceSource { label, location })?;
    for item in &items {
        println!("{item}");
    }
    for item in items.iter().filter(|i| i.reportable) {
        if let Some(message) = &item.message {
            println!();
            println!("{}: {message}", item.name());
        }
    }
    Ok(())
}

fn cmd_extract(args: &PopulationArgs, dir: &Path, signal: Signal) -> Result<()> {
    let mut pop = build_population(args)?;
    let placements = place(args)?;
    // registers the placements with the recorders
    pop.generate_data_specs(&placements)?;

    let mut reader = InMemoryReader::new();
    for (placement, _) in &placements {
        let path = core_file(dir, placement.location, signal.extension());
        let data = std::fs::read(&path).with_context(|| format!("Reading {}", path.display()))?;
        reader.insert(placement.location, signal.region(), data);
    }

    let step_ms = pop.config().time_step_ms();
    match signal {
        Signal::Spikes => {
            let spikes = pop.get_spikes(&reader)?;
            for spike in &spikes.spikes {
                println!("{}\t{}", spike.neuron_id, spike.time_ms(step_ms));
            }
            println!("# {} spikes", spikes.len());
        }
        Signal::V | Signal::Gsyn => {
            let recording = if signal == Signal::V {
                pop.get_v(&reader)?
            } else {
                pop.get_gsyn(&reader)?
            };
            for sample in &recording.samples {
                println!(
                    "{}\t{}\t{}",
                    sample.neuron_id,
                    f64::from(sample.timestep) * step_ms,
                    sample.value
                );
            }
            println!("# {} samples", recording.samples.len());
        }
    }
    Ok(())
}
