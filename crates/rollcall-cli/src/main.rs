// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::{PolicyProbe, TableInput, TableRuntime};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_DEMO_SEED: u64 = 1;
const DEFAULT_DEMO_ROWS: usize = 12;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }
    init_logging(options.verbose);

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `rollcall --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let table = match (&options.input, options.demo) {
        (Some(_), true) => {
            return Err(anyhow!(
                "--input and --demo are mutually exclusive; pick one table source"
            ));
        }
        (Some(path), false) => runtime::load_table(path)?,
        (None, true) => runtime::demo_table(options.seed, options.rows),
        (None, false) => {
            return Err(anyhow!(
                "no table to project; pass --input <table.json> or --demo"
            ));
        }
    };
    if options.check_only {
        println!(
            "ok: {} columns, {} rows",
            table.columns.len(),
            table.rows.len()
        );
        return Ok(());
    }

    let probe = PolicyProbe::new(options.offline || config.offline(), config.blocked_hosts());
    let TableInput { columns, rows } = table;
    let mut table_runtime = TableRuntime::new(columns, config.projection_options(), probe);
    let projected = table_runtime.run(&rows);

    if options.json {
        println!("{}", runtime::render_json(&projected)?);
    } else {
        print!(
            "{}",
            runtime::render_text(table_runtime.columns(), &projected)
        );
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    input: Option<PathBuf>,
    demo: bool,
    seed: u64,
    rows: usize,
    json: bool,
    offline: bool,
    check_only: bool,
    verbose: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        input: None,
        demo: false,
        seed: DEFAULT_DEMO_SEED,
        rows: DEFAULT_DEMO_ROWS,
        json: false,
        offline: false,
        check_only: false,
        verbose: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--input" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--input requires a table file path"))?;
                options.input = Some(PathBuf::from(value.as_ref()));
            }
            "--seed" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--seed requires a number"))?;
                options.seed = value
                    .as_ref()
                    .parse()
                    .with_context(|| format!("invalid --seed value {:?}", value.as_ref()))?;
            }
            "--rows" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--rows requires a number"))?;
                options.rows = value
                    .as_ref()
                    .parse()
                    .with_context(|| format!("invalid --rows value {:?}", value.as_ref()))?;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--json" => {
                options.json = true;
            }
            "--offline" => {
                options.offline = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("rollcall");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --input <table.json>     Project the table in a JSON file");
    println!("  --demo                   Project a generated employee table");
    println!("  --seed <n>               Seed for --demo (default 1)");
    println!("  --rows <n>               Row count for --demo (default 12)");
    println!("  --json                   Print projected rows as JSON");
    println!("  --offline                Treat every image load as failed");
    println!("  --check                  Validate config + table, then exit");
    println!("  --verbose, -v            Log resolution steps to stderr");
    println!("  --help                   Show this help");
}
