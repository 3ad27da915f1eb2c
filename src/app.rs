use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::executor::Method;
use crate::output::{self, OutputFormat, ReportSink};
use crate::runner::{ListSource, Options, Runner, RunnerError, DEFAULT_CONCURRENCY};
use crate::utils;

const DEFAULT_WORKERS: usize = 10;

fn print_banner(no_color: bool) {
    const BANNER: &str = r#"
                          __    __
  _____ _____ __  __ ____/ /___/ /___   _____
 / ___// ___// / / // __  // __  // _ \ / ___/
/ /__ / /   / /_/ // /_/ // /_/ //  __// /
\___//_/    \__,_/ \__,_/ \__,_/ \___//_/
"#;
    if no_color {
        print!("{}", BANNER);
    } else {
        let _ = write!(&mut rainbowcoat::stdout(), "{}", BANNER);
    }
    println!(
        "       v{} - CRUD method enumeration tool",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn flag_label(arg: &clap::Arg) -> String {
    let mut names: Vec<String> = arg.get_short().map(|c| format!("-{c}")).into_iter().collect();
    names.extend(arg.get_long().map(|l| format!("--{l}")));
    for alias in arg.get_visible_aliases().unwrap_or_default() {
        let alias = format!("--{alias}");
        if !names.contains(&alias) {
            names.push(alias);
        }
    }
    let mut label = names.join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        label.push_str(&format!(" <{value}>"));
    }
    label
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n{}\n\nUsage: {} [OPTIONS]\n\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default(),
        cmd.get_about().map(|a| a.to_string()).unwrap_or_default(),
        cmd.get_name()
    );

    out.push_str("Methods:\n");
    for method in Method::ALL {
        out.push_str(&format!("  {}  {}\n", method.letter(), method));
    }
    out.push('\n');

    // headings keep the order their first flag was declared in
    let mut sections: Vec<(&str, Vec<(String, String)>)> = Vec::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options");
        let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
        let row = (flag_label(arg), help.trim().to_string());
        match sections.iter_mut().find(|(h, _)| *h == heading) {
            Some((_, rows)) => rows.push(row),
            None => sections.push((heading, vec![row])),
        }
    }

    let width = sections
        .iter()
        .flat_map(|(_, rows)| rows.iter().map(|(label, _)| label.len()))
        .max()
        .unwrap_or(0);
    for (heading, rows) in sections {
        out.push_str(&format!("{heading}:\n"));
        for (label, help) in rows {
            out.push_str(format!("  {label:<width$}  {help}").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push_str(&long_about.to_string());
        out.push('\n');
    }
    out
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    workers: usize,
    output: Option<PathBuf>,
    output_format: OutputFormat,
    no_color: bool,
    silent: bool,
    verbose: u8,
}

fn subdomain_source(
    file: Option<String>,
    inline: Option<Vec<String>>,
) -> Option<ListSource> {
    match (file, inline) {
        (Some(path), _) => Some(ListSource::FilePath(config::expand_tilde_string(&path))),
        (None, Some(values)) => Some(ListSource::Inline(values)),
        (None, None) => None,
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };
    let silent = args.silent || cfg.silent.unwrap_or(false);

    let methods_raw = args.methods.or(cfg.methods).unwrap_or_default();
    let methods = utils::parse_method_letters(&methods_raw);

    // the CLI pair wins over the config pair, a file wins within each pair
    let subdomains = subdomain_source(
        args.subdomains_file,
        args.subdomains.map(|s| utils::parse_subdomains_csv(&s)),
    )
    .or_else(|| subdomain_source(cfg.subdomains_file, cfg.subdomains))
    .unwrap_or(ListSource::Inline(Vec::new()));

    let endpoints = match args.endpoints.or(cfg.endpoints) {
        Some(path) => ListSource::FilePath(config::expand_tilde_string(&path)),
        None => ListSource::Inline(Vec::new()),
    };

    let concurrency = args
        .concurrency
        .or(cfg.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    let workers = args.workers.or(cfg.workers).unwrap_or(DEFAULT_WORKERS);
    if workers == 0 {
        return Err("invalid workers 0, expected positive integer".to_string());
    }
    let timeout_seconds = args.timeout.or(cfg.timeout);
    if timeout_seconds == Some(0) {
        return Err("invalid timeout 0, expected positive number of seconds".to_string());
    }

    let follow_redirects = !args.no_follow_redirects && cfg.follow_redirects.unwrap_or(true);

    let output = args
        .output
        .or(cfg.output)
        .filter(|p| !p.trim().is_empty())
        .map(|p| config::expand_tilde(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => output
            .as_ref()
            .and_then(|p| output::infer_format_from_path(&p.to_string_lossy()))
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        options: Options {
            subdomains,
            endpoints,
            methods,
            concurrency,
            timeout_seconds,
            proxy: args.proxy.or(cfg.proxy),
            follow_redirects,
            header: args.header.or(cfg.header),
            user_agent: args.user_agent.or(cfg.user_agent),
        },
        workers,
        output,
        output_format,
        no_color,
        silent,
        verbose: args.verbose,
    })
}

fn init_tracing(verbose: u8, no_color: bool) {
    let crate_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("crudder={crate_level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .try_init();
}

fn new_progress_bar() -> Result<ProgressBar, String> {
    let pb = ProgressBar::new(0);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Progress: [{pos}/{len}] :: {per_sec} :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );
    Ok(pb)
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    if !run.silent {
        print_banner(run.no_color);
    }

    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    let targets = runner.load_targets().await.map_err(|e| e.to_string())?;

    // created up front so an unwritable destination fails before any request
    let mut sink = match run.output.as_ref() {
        Some(path) => Some(
            ReportSink::create(path, run.output_format)
                .await
                .map_err(|e| {
                    RunnerError::OutputWrite {
                        path: path.display().to_string(),
                        source: e,
                    }
                    .to_string()
                })?,
        ),
        None => None,
    };

    if !run.silent {
        let options = runner.options();
        format_kv_line(
            "Targets",
            &format!(
                "subdomains={} endpoints={} methods={} ({})",
                targets.subdomains.len(),
                targets.endpoints.len(),
                utils::method_letters(&options.methods),
                options
                    .methods
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        );
        format_kv_line(
            "HTTP",
            &format!(
                "conc={} workers={} timeout={} redirects={} proxy={}",
                options.concurrency,
                run.workers,
                options
                    .timeout_seconds
                    .map(|t| format!("{t}s"))
                    .unwrap_or_else(|| "none".to_string()),
                format_bool(options.follow_redirects),
                if options.proxy.is_some() { "on" } else { "off" },
            ),
        );
        if let (Some(path), Some(sink)) = (run.output.as_ref(), sink.as_ref()) {
            let format = match sink.format() {
                OutputFormat::Text => "text",
                OutputFormat::Json => "json",
            };
            format_kv_line("Output", &format!("{} ({format})", path.display()));
        }
        println!();
    }

    let pb = if run.silent {
        ProgressBar::hidden()
    } else {
        new_progress_bar()?
    };
    let runner = runner.with_progress(pb.clone());
    let result = runner.scan(&targets).await.map_err(|e| e.to_string())?;
    pb.finish_and_clear();

    output::print_report(&result.report);

    if let Some(sink) = sink.as_mut() {
        if let Err(e) = sink.write(&result.report).await {
            tracing::error!(error = %e, "failed to write report");
            let path = run
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return Err(RunnerError::OutputWrite { path, source: e }.to_string());
        }
    }

    if !run.silent {
        println!();
        println!(
            ":: Completed :: {} requests ({} ok, {} failed) in {}s ::",
            result.requests,
            result.report.success_count().to_string().as_str().green(),
            result.report.failure_count().to_string().as_str().red(),
            result.elapsed.as_secs()
        );
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path))?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;
    init_tracing(run.verbose, run.no_color);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
