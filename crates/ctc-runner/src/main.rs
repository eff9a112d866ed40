use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ctc_engine::ProcessEngine;
use ctc_runner::{
    discover, logging, BatchRunner, Orchestrator, PolicyKind, RunContext, RunError, Settings,
};
use ctc_testcase::TestCase;

fn cli() -> Command {
    Command::new("ctc")
        .version(ctc_config::VERSION)
        .about("Concolic test-case generator")
        .subcommand_negates_reqs(true)
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("config")
                .value_name("CONFIG")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("batch")
                .conflicts_with("batch")
                .help("Configuration document of a single target"),
        )
        .arg(
            Arg::new("batch")
                .short('b')
                .long("batch")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Process every *.xml document of a directory"),
        )
        .arg(
            Arg::new("engine")
                .long("engine")
                .value_name("CMD")
                .help("Engine bridge command"),
        )
        .arg(
            Arg::new("engine-arg")
                .long("engine-arg")
                .value_name("ARG")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .help("Argument passed to the engine bridge (repeatable)"),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .value_parser(["single-fork", "timeout"])
                .help("Exploration termination policy"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("Budget for the timeout policy"),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory the run directory is created in"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Targets processed in parallel in batch mode"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML settings file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the elements of a test case")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Test case file"),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("verbose"));

    let code = match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(matches: &ArgMatches) -> anyhow::Result<i32> {
    if let Some(("inspect", args)) = matches.subcommand() {
        let path = args
            .get_one::<PathBuf>("file")
            .context("missing test case path")?;
        inspect(path)?;
        return Ok(0);
    }

    let settings = resolve_settings(matches)?;
    if let Some(dir) = matches.get_one::<PathBuf>("batch") {
        return run_batch(&settings, dir);
    }
    let document = matches
        .get_one::<PathBuf>("config")
        .context("missing configuration document")?;
    run_single(&settings, document)?;
    Ok(0)
}

/// Settings file first, then command line overrides
fn resolve_settings(matches: &ArgMatches) -> anyhow::Result<Settings> {
    let mut settings = match matches.get_one::<PathBuf>("settings") {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(command) = matches.get_one::<String>("engine") {
        settings.engine.command = Some(command.clone());
    }
    if let Some(args) = matches.get_many::<String>("engine-arg") {
        settings.engine.args = args.cloned().collect();
    }
    if let Some(policy) = matches.get_one::<String>("policy") {
        settings.exploration.policy = policy.parse::<PolicyKind>()?;
    }
    if let Some(secs) = matches.get_one::<u64>("timeout-secs") {
        settings.exploration.timeout_secs = *secs;
    }
    if let Some(dir) = matches.get_one::<PathBuf>("out-dir") {
        settings.output.parent = dir.clone();
    }
    if let Some(jobs) = matches.get_one::<usize>("jobs") {
        settings.jobs = *jobs;
    }

    settings.validate()?;
    Ok(settings)
}

fn spawn_engine(settings: &Settings) -> Result<ProcessEngine, RunError> {
    let command = settings.engine.command.as_deref().ok_or_else(|| {
        RunError::invalid_input("no engine bridge configured, pass --engine or set [engine] command")
    })?;
    Ok(ProcessEngine::spawn(command, &settings.engine.args)?)
}

fn run_single(settings: &Settings, document: &Path) -> anyhow::Result<()> {
    let config = ctc_config::load_file(document)
        .with_context(|| format!("failed to load {}", document.display()))?;
    let engine = spawn_engine(settings)?;
    let ctx = RunContext::create(&settings.output.parent)?;

    let report = Orchestrator::new(engine, settings.policy())
        .process(&ctx, document, &config)
        .with_context(|| format!("failed to process {}", document.display()))?;

    println!(
        "{}: {} test case(s) in {}",
        document.display(),
        report.test_cases.len(),
        report.output_dir.display()
    );
    Ok(())
}

fn run_batch(settings: &Settings, dir: &Path) -> anyhow::Result<i32> {
    let discovery = discover(dir)?;
    if settings.engine.command.is_none() {
        anyhow::bail!("no engine bridge configured, pass --engine or set [engine] command");
    }
    let ctx = RunContext::create(&settings.output.parent)?;

    let runner = BatchRunner::new(settings.policy(), settings.jobs);
    let report = runner.run(&ctx, discovery, || spawn_engine(settings));

    for target in &report.succeeded {
        println!(
            "{}: {} test case(s)",
            target.document.display(),
            target.test_cases.len()
        );
    }
    for (document, error) in &report.failed {
        println!("{}: FAILED ({error})", document.display());
    }
    println!(
        "{} processed, {} failed, {} skipped, {} test case(s) in {}",
        report.succeeded.len(),
        report.failed.len(),
        report.skipped.len(),
        report.test_cases_written(),
        ctx.root().display()
    );

    Ok(if report.all_succeeded() { 0 } else { 1 })
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let record = TestCase::decode(&bytes)
        .with_context(|| format!("{} is not a valid test case", path.display()))?;
    print!("{}: {record}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_settings() {
        let matches = cli()
            .try_get_matches_from([
                "ctc",
                "--engine",
                "python3",
                "--engine-arg",
                "bridge.py",
                "--policy",
                "timeout",
                "--timeout-secs",
                "3",
                "-j",
                "2",
                "target.xml",
            ])
            .unwrap();
        let settings = resolve_settings(&matches).unwrap();

        assert_eq!(settings.engine.command.as_deref(), Some("python3"));
        assert_eq!(settings.engine.args, ["bridge.py"]);
        assert_eq!(settings.exploration.policy, PolicyKind::Timeout);
        assert_eq!(settings.exploration.timeout_secs, 3);
        assert_eq!(settings.jobs, 2);
    }

    #[test]
    fn config_and_batch_conflict() {
        assert!(cli()
            .try_get_matches_from(["ctc", "-b", "dir", "target.xml"])
            .is_err());
    }

    #[test]
    fn inspect_needs_no_config() {
        let matches = cli()
            .try_get_matches_from(["ctc", "inspect", "1.bin"])
            .unwrap();
        assert!(matches.subcommand_matches("inspect").is_some());
    }

    #[test]
    fn config_or_batch_required() {
        assert!(cli().try_get_matches_from(["ctc"]).is_err());
    }
}
