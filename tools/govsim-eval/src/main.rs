use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, warn};

use govsim_core::parallel::{
    evaluate_baseline, evaluate_population, evaluate_population_n_workers, EvalInputs, EvalResult,
};
use govsim_core::{MiscConst, Score, Tunables};
use govsim_dump::Dumper;
use govsim_model::soc::Soc;
use govsim_model::workload::Workload;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Scores governor tunables against a baseline on a recorded workload
struct Args {
    /// Path to YAML file with SoC description
    #[arg(short, long)]
    soc: PathBuf,

    /// Path to CSV file with active workload trace
    #[arg(short, long)]
    workload: PathBuf,

    /// Path to CSV file with idle workload trace
    #[arg(short, long)]
    idleload: PathBuf,

    /// Path to YAML file with simulation constants (default - built-in constants)
    #[arg(short, long)]
    misc: Option<PathBuf>,

    /// Path to YAML file with baseline tunables (default - stock kernel tunables)
    #[arg(short, long)]
    baseline: Option<PathBuf>,

    /// Paths to YAML files with candidate tunables
    #[arg(short, long, num_args = 1..)]
    candidates: Vec<PathBuf>,

    /// Directory for produced TXT, CSV and JSON files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Number of threads to use (default - use all available cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

fn load_tunables(path: &Path, soc: &Soc) -> Result<Tunables> {
    let tunables = Tunables::from_file(path).with_context(|| format!("failed to load tunables {}", path.display()))?;
    tunables
        .validate(soc)
        .with_context(|| format!("tunables {} don't fit SoC {}", path.display(), soc.name))?;
    Ok(tunables)
}

fn main() -> Result<()> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let soc = Soc::from_file(&args.soc).context("failed to load SoC description")?;
    let workload = Workload::from_file(&args.workload).context("failed to load workload")?;
    let idleload = Workload::from_file(&args.idleload).context("failed to load idle workload")?;
    if workload.is_empty() || idleload.is_empty() {
        bail!("workload traces must not be empty");
    }
    let misc = match &args.misc {
        Some(path) => MiscConst::from_file(path).context("failed to load simulation constants")?,
        None => MiscConst::default(),
    };
    let baseline = match &args.baseline {
        Some(path) => load_tunables(path, &soc)?,
        None => Tunables::default_for(&soc),
    };
    let candidates = args
        .candidates
        .iter()
        .map(|path| load_tunables(path, &soc))
        .collect::<Result<Vec<_>>>()?;

    let inputs = Arc::new(EvalInputs {
        workload,
        idleload,
        soc,
    });
    let baseline = evaluate_baseline(baseline, Score::default(), misc.clone(), &inputs)
        .context("baseline run failed")?;
    let reference = Arc::new(baseline.score.ref_power_consumed.clone());

    info!("scoring {} candidates", candidates.len());
    let scored = match args.threads {
        Some(n_workers) => {
            evaluate_population_n_workers(candidates, Score::default(), misc, inputs.clone(), reference, n_workers)
        }
        None => evaluate_population(candidates, Score::default(), misc, inputs.clone(), reference),
    };

    let mut results: Vec<EvalResult> = vec![baseline];
    for (idx, result) in scored.into_iter().enumerate() {
        match result {
            Ok(result) => results.push(result),
            Err(e) => warn!("candidate {} ({}) skipped: {}", idx, args.candidates[idx].display(), e),
        }
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let dumper = Dumper::new(inputs.soc.clone(), &args.output);
    dumper.dump_to_txt(&results).context("failed to write TXT report")?;
    dumper.dump_to_csv(&results).context("failed to write CSV report")?;

    let json = args.output.join(format!("{}-results.json", inputs.soc.name));
    std::fs::File::create(&json)
        .with_context(|| format!("failed to create {}", json.display()))?
        .write_all(serde_json::to_string_pretty(&results)?.as_bytes())?;
    info!("results saved to {}", json.display());
    Ok(())
}
