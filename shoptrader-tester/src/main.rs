mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;
use shoptrader_game::Variant;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    LogicTester, RunPlan, ScenarioResult, Strategy, get_scenario, list_scenarios,
    resolve_seed_inputs, scenario_names,
};

#[derive(Debug, Parser)]
#[command(name = "shoptrader-tester", version)]
#[command(about = "Automated headless play-testing for the Shop Trader game logic")]
struct Args {
    /// Shop variant to play
    #[arg(long, default_value = "all")]
    #[arg(value_parser = ["book_trader", "game_trader", "all"])]
    variant: String,

    /// Player strategy driving the runs
    #[arg(long, value_enum, default_value_t = Strategy::Greedy)]
    strategy: Strategy,

    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex or `now`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Day cap for a single run
    #[arg(long, default_value_t = 150)]
    max_days: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let plan = RunPlan {
        variants: resolve_variants(&args.variant),
        strategy: args.strategy,
        max_days: args.max_days,
        iterations: args.iterations,
    };
    info!(
        "running {} scenario(s) over {} seed(s) with {} strategy",
        scenarios.len(),
        seeds.len(),
        plan.strategy
    );

    let results = run_logic_scenarios(&args, &scenarios, &plan, &seeds);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }

    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🛒 Shop Trader Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        for name in scenario_names() {
            if !scenarios.contains(&name) {
                scenarios.push(name);
            }
        }
    }
    scenarios
}

fn resolve_variants(raw: &str) -> Vec<Variant> {
    raw.parse::<Variant>()
        .map_or_else(|()| Variant::ALL.to_vec(), |variant| vec![variant])
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    plan: &RunPlan,
    seeds: &[u64],
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(scenario, plan, seeds));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Shop Trader Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            variant: "all".to_string(),
            strategy: Strategy::Greedy,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            max_days: 5,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_file(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shoptrader-{label}-{}", std::process::id()))
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("all,smoke");
        assert_eq!(expanded[0], "smoke");
        assert!(expanded.contains(&"persistence".to_string()));
        assert_eq!(
            expanded.iter().filter(|s| s.as_str() == "smoke").count(),
            1
        );
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("victory, smoke,,custom");
        assert_eq!(expanded, vec!["victory", "smoke", "custom"]);
    }

    #[test]
    fn variants_resolve_from_cli_values() {
        assert_eq!(resolve_variants("game_trader"), vec![Variant::GameTrader]);
        assert_eq!(resolve_variants("all"), Variant::ALL.to_vec());
    }

    #[test]
    fn args_parse_strategy_and_report() {
        let args = Args::try_parse_from([
            "shoptrader-tester",
            "--strategy",
            "idle",
            "--report",
            "markdown",
            "--variant",
            "book_trader",
        ])
        .unwrap();
        assert_eq!(args.strategy, Strategy::Idle);
        assert_eq!(args.report, "markdown");
        assert!(Args::try_parse_from(["shoptrader-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let path = temp_file("report.json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let path = temp_file("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("determinism"));
    }

    #[test]
    fn unknown_scenarios_are_skipped() {
        let args = base_args();
        let plan = RunPlan {
            variants: vec![Variant::BookTrader],
            strategy: Strategy::Greedy,
            max_days: 2,
            iterations: 1,
        };
        let results = run_logic_scenarios(&args, &["missing".to_string()], &plan, &[1]);
        assert!(results.is_empty());
    }
}
