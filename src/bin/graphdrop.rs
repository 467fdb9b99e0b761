//! graphdrop : synthetic datasets and statistics of structural dropout experiments.
//!
//! example usage:
//! graphdrop pairs --csv ./data/ZINC --cache ./data/ZINC sd --distance 4 --seed 0
//! graphdrop pairs --csv ./data/ZINC --cache ./data/ZINC ct --alpha 0.5
//! graphdrop hedges --results ./results --preset node
//! graphdrop significance --results ./results --preset graph --level 0.1
//! graphdrop sweep --results ./results --kind ct --gnn GCN --configs "DropEdge:0.2,DropEdge:0.5"
//!
//!  pairs builds (or reloads) the node pair manifests of the 3 splits and reports the sizes of the synthetic splits.
//!  hedges and significance read training logs under the results directory and print on stdout,
//!  LaTeX rows for hedges, one line per comparison for significance.
//!  sweep prints a csv summary of the synthetic dataset sweeps.

use anyhow::anyhow;
use clap::{arg, Arg, ArgMatches, Command};

use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use std::path::PathBuf;

use graphdrop::prelude::*;

/// arguments of the pairs subcommand
struct PairsParams {
    csv_dir: PathBuf,
    name: String,
    cache_dir: PathBuf,
    mode: PairMode,
    seed: Option<u64>,
}

/// arguments of hedges and significance subcommands
struct TableParams {
    aggregation: AggregationParams,
    datasets: &'static [&'static str],
    level: f64,
}

fn parse_value<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<T>> {
    match matches.value_of(name) {
        Some(str) => match str.parse::<T>() {
            Ok(val) => Ok(Some(val)),
            _ => Err(anyhow!("could not parse {} : {}", name, str)),
        },
        None => Ok(None),
    }
} // end of parse_value

fn parse_pairs(matches: &ArgMatches) -> anyhow::Result<PairsParams> {
    log::debug!("in parse_pairs");
    let csv_dir = parse_value::<PathBuf>(matches, "csv")?.ok_or_else(|| anyhow!("csv directory is required"))?;
    let cache_dir = parse_value::<PathBuf>(matches, "cache")?.unwrap_or_else(|| csv_dir.clone());
    let name = matches.value_of("name").unwrap_or("ZINC").to_string();
    let seed = parse_value::<u64>(matches, "seed")?;
    let mode = match matches.subcommand() {
        Some(("sd", sub_m)) => {
            let distance = parse_value::<usize>(sub_m, "distance")?.ok_or_else(|| anyhow!("sd needs --distance"))?;
            PairMode::shortest_distance(distance)?
        }
        Some(("ct", sub_m)) => {
            let alpha = parse_value::<f64>(sub_m, "alpha")?.ok_or_else(|| anyhow!("ct needs --alpha"))?;
            PairMode::commute_time(alpha)?
        }
        _ => {
            log::error!("pairs expects subcommand sd or ct");
            return Err(anyhow!("could not parse pair mode"));
        }
    };
    Ok(PairsParams {
        csv_dir,
        name,
        cache_dir,
        mode,
        seed,
    })
} // end of parse_pairs

fn parse_aggregation(matches: &ArgMatches) -> anyhow::Result<AggregationParams> {
    let results = parse_value::<PathBuf>(matches, "results")?.ok_or_else(|| anyhow!("results directory is required"))?;
    let metric = matches.value_of("metric").unwrap_or("Accuracy");
    let mut params = AggregationParams::new(&results, metric);
    match matches.value_of("layers") {
        Some("none") => params = params.with_layers(None),
        Some(_) => {
            let layers = parse_value::<usize>(matches, "layers")?;
            params = params.with_layers(layers);
        }
        None => {}
    }
    if let Some(min_test_entries) = parse_value::<usize>(matches, "min-entries")? {
        params = params.with_min_test_entries(min_test_entries);
    }
    let min_samples = parse_value::<usize>(matches, "min-samples")?.unwrap_or_else(|| params.get_min_samples());
    let max_samples = parse_value::<usize>(matches, "max-samples")?.unwrap_or_else(|| params.get_max_samples());
    params = params.with_sample_range(min_samples, max_samples)?;
    Ok(params)
} // end of parse_aggregation

fn parse_table(matches: &ArgMatches) -> anyhow::Result<TableParams> {
    log::debug!("in parse_table");
    let aggregation = parse_aggregation(matches)?;
    let preset = parse_value::<DatasetPreset>(matches, "preset")?.ok_or_else(|| anyhow!("preset node or graph is required"))?;
    let level = parse_value::<f64>(matches, "level")?.unwrap_or(NORMALITY_LEVEL);
    if !(0. ..1.).contains(&level) {
        return Err(anyhow!("level must be in [0,1), got {}", level));
    }
    Ok(TableParams {
        aggregation,
        datasets: preset.get_datasets(),
        level,
    })
} // end of parse_table

fn parse_sweep(matches: &ArgMatches) -> anyhow::Result<SweepParams> {
    log::debug!("in parse_sweep");
    let results = parse_value::<PathBuf>(matches, "results")?.ok_or_else(|| anyhow!("results directory is required"))?;
    let kind = match matches.value_of("kind") {
        Some("sd") => SweepKind::ShortestDistance,
        Some("ct") => SweepKind::CommuteTime,
        _ => return Err(anyhow!("kind must be sd or ct")),
    };
    let gnn = matches.value_of("gnn").unwrap_or("GCN");
    let mut params = SweepParams::new(&results, kind, gnn);
    if let Some(metric) = matches.value_of("metric") {
        params = params.with_metric(metric);
    }
    if let Some(configs) = matches.value_of("configs") {
        let mut parsed = Vec::<(String, f64)>::new();
        for config in configs.split(',') {
            let (dropout, p) = config
                .split_once(':')
                .ok_or_else(|| anyhow!("bad config {}, expecting <dropout>:<p>", config))?;
            let dropout = dropout.parse::<DropoutMethod>()?;
            let p = p.trim().parse::<f64>().map_err(|_| anyhow!("bad drop probability in {}", config))?;
            parsed.push((dropout.to_string(), p));
        }
        params = params.with_configs(parsed);
    }
    Ok(params)
} // end of parse_sweep

fn run_pairs(params: &PairsParams) -> anyhow::Result<()> {
    let seed = match params.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::thread_rng().gen::<u64>();
            log::info!("no seed given, using seed {}", seed);
            seed
        }
    };
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let source = CsvGraphSource::new(&params.name, &params.csv_dir);
    let cache = NodePairCache::new(&params.cache_dir);
    let zinc = SyntheticZinc::build(&source, &cache, params.mode, &mut rng)?;
    println!("dataset {} task {} mode {:?} seed {}", zinc.get_name(), SyntheticZinc::TASK_NAME, zinc.get_mode(), seed);
    for (split, dataset) in Split::ALL.iter().zip([&zinc.train, &zinc.val, &zinc.test]) {
        let nb_graphs = source.load_split(*split)?.len();
        println!("{} : {} graphs kept out of {}", split, dataset.len(), nb_graphs);
    }
    Ok(())
} // end of run_pairs

fn run_hedges(params: &TableParams) -> anyhow::Result<()> {
    let records = collect_effect_sizes(&params.aggregation, params.datasets, &GNNS, &DropoutMethod::TABLE_ROWS)?;
    print!("{}", render_latex_rows(&records, &DropoutMethod::TABLE_ROWS, &GNNS, params.datasets));
    Ok(())
}

fn run_significance(params: &TableParams) -> anyhow::Result<()> {
    let records = collect_comparisons(&params.aggregation, params.datasets, &GNNS, &DropoutMethod::TABLE_ROWS, params.level)?;
    print!("{}", render_comparisons(&records));
    Ok(())
}

fn run_sweep(params: &SweepParams) -> anyhow::Result<()> {
    let curves = sweep_summary(params)?;
    write_sweep_csv(&curves, params.get_kind(), std::io::stdout())
}

fn aggregation_args() -> Vec<Arg<'static>> {
    vec![
        Arg::new("results")
            .long("results")
            .takes_value(true)
            .required(true)
            .help("root of the results tree"),
        Arg::new("metric")
            .long("metric")
            .takes_value(true)
            .help("metric name as written in logs, default Accuracy"),
        Arg::new("layers")
            .long("layers")
            .takes_value(true)
            .help("L=<layers> directory level, default 4, \"none\" if absent"),
        Arg::new("min-entries")
            .long("min-entries")
            .takes_value(true)
            .help("minimum number of test entries of a complete run"),
        Arg::new("min-samples")
            .long("min-samples")
            .takes_value(true)
            .help("minimum number of runs of a configuration, default 10"),
        Arg::new("max-samples")
            .long("max-samples")
            .takes_value(true)
            .help("maximum number of runs used, default 20"),
    ]
} // end of aggregation_args

pub fn main() {
    //
    let _ = graphdrop::init_log();
    //
    let matches = Command::new("graphdrop")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("pairs")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .arg(Arg::new("csv")
                    .long("csv")
                    .takes_value(true)
                    .required(true)
                    .help("directory of <split>_nodes.csv and <split>_edges.csv"))
                .arg(Arg::new("name")
                    .long("name")
                    .takes_value(true)
                    .help("name of base dataset, default ZINC"))
                .arg(Arg::new("cache")
                    .long("cache")
                    .takes_value(true)
                    .help("root of node pair cache, default the csv directory"))
                .arg(Arg::new("seed")
                    .long("seed")
                    .takes_value(true)
                    .help("seed of random stream"))
                .subcommand(Command::new("sd")
                    .arg_required_else_help(true)
                    .args(&[arg!(-d --distance <distance> "exact hop distance, at least 1")]))
                .subcommand(Command::new("ct")
                    .arg_required_else_help(true)
                    .args(&[arg!(-a --alpha <alpha> "commute time quantile in [0,1]")])),
        )
        .subcommand(
            Command::new("hedges")
                .arg_required_else_help(true)
                .args(aggregation_args())
                .args(&[arg!(--preset <preset> "node or graph datasets")]),
        )
        .subcommand(
            Command::new("significance")
                .arg_required_else_help(true)
                .args(aggregation_args())
                .args(&[arg!(--preset <preset> "node or graph datasets")])
                .arg(Arg::new("level")
                    .long("level")
                    .takes_value(true)
                    .help("normality level, default 0.1")),
        )
        .subcommand(
            Command::new("sweep")
                .arg_required_else_help(true)
                .arg(Arg::new("results")
                    .long("results")
                    .takes_value(true)
                    .required(true)
                    .help("root of the results tree"))
                .args(&[arg!(--kind <kind> "sd or ct")])
                .arg(Arg::new("gnn")
                    .long("gnn")
                    .takes_value(true)
                    .help("model, default GCN"))
                .arg(Arg::new("metric")
                    .long("metric")
                    .takes_value(true)
                    .help("metric name, default Mean Absolute Error"))
                .arg(Arg::new("configs")
                    .long("configs")
                    .takes_value(true)
                    .help("comma separated <dropout>:<p>, default DropEdge:0.2,DropEdge:0.5")),
        )
        .get_matches();
    //
    let res = match matches.subcommand() {
        Some(("pairs", sub_m)) => parse_pairs(sub_m).and_then(|params| {
            log::info!("pairs from {:?}, cache {:?}", params.csv_dir, params.cache_dir);
            run_pairs(&params)
        }),
        Some(("hedges", sub_m)) => parse_table(sub_m).and_then(|params| run_hedges(&params)),
        Some(("significance", sub_m)) => parse_table(sub_m).and_then(|params| run_significance(&params)),
        Some(("sweep", sub_m)) => parse_sweep(sub_m).and_then(|params| run_sweep(&params)),
        _ => {
            log::error!("expected subcommand pairs, hedges, significance or sweep");
            std::process::exit(1);
        }
    }; // end match subcommand
    //
    if let Err(e) = res {
        log::error!("graphdrop failed : {:#}", e);
        std::process::exit(1);
    }
    log::info!("graphdrop done");
} // end of main
