use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use gblibx_exec::RunCmd;
use gblibx_http::{HttpClient, JsonMap};
use gblibx_logging::{LogConfig, LogHandle, LogLevel};
use tracing::{debug, info};
use gblibx_yaap::{ParseOutcome, ParseReport, Surface};

/// Exit status for command lines rejected by a surface.
const USAGE_ERROR_EXIT: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "gbx", version)]
#[command(about = "Option parsing, process running, HTTP and logging utilities")]
struct Cli {
    /// Raise log verbosity (-d info, -dd debug, -ddd trace).
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    debug: u8,
    /// YAML logging configuration.
    #[arg(long, global = true)]
    log_config: Option<PathBuf>,
    /// Also write log lines to this file (truncated).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a command, streaming its output, and exit with its status.
    Run(RunArgs),
    /// Parse an argument vector against a surface file and print the result as JSON.
    Parse(ParseArgs),
    /// Parse like a program built from the surface: help, missing arguments
    /// and usage errors print to stderr and exit 1.
    Check(ParseArgs),
    /// Print the usage text of a surface file.
    Usage(UsageArgs),
    /// GET a JSON resource and print it.
    Get(GetArgs),
    /// POST a JSON body and print the response.
    Post(PostArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Pass the command line to /bin/sh -c.
    #[arg(long)]
    shell: bool,
    /// Kill the command after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Program and arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Surface definition (YAML, or JSON with a .json extension).
    #[arg(long)]
    surface: PathBuf,
    /// Accept an empty argument vector.
    #[arg(long)]
    allow_empty: bool,
    /// Arguments to parse, after `--`.
    #[arg(last = true)]
    argv: Vec<String>,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Surface definition (YAML, or JSON with a .json extension).
    #[arg(long)]
    surface: PathBuf,
    /// Print every group's option descriptions.
    #[arg(long)]
    detailed: bool,
}

#[derive(Debug, Args)]
struct GetArgs {
    url: String,
    /// Query parameters as key=value.
    params: Vec<String>,
}

#[derive(Debug, Args)]
struct PostArgs {
    url: String,
    /// JSON body.
    #[arg(long, default_value = "{}")]
    data: String,
    /// Attempts while the server cannot be reached.
    #[arg(long)]
    retries: Option<u32>,
    /// Seconds between attempts.
    #[arg(long, default_value_t = 5)]
    retry_delay_secs: u64,
}

fn main() {
    let cli = Cli::parse();

    let handle = match setup_logging(&cli) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run(args) => run_run(args),
        Command::Parse(args) => run_parse(args),
        Command::Check(args) => run_check(args),
        Command::Usage(args) => run_usage(args),
        Command::Get(args) => run_get(args),
        Command::Post(args) => run_post(args),
    };

    debug!(
        elapsed = %gblibx_logging::format_hhmmss(handle.elapsed()),
        warnings = handle.count(LogLevel::Warn),
        errors = handle.count(LogLevel::Error),
        "done"
    );

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<LogHandle, String> {
    let mut config = match &cli.log_config {
        Some(path) => LogConfig::load(path).map_err(|e| e.to_string())?,
        None => LogConfig::default().with_level(LogLevel::from_verbosity(0)),
    };
    if cli.debug > 0 {
        config.level = LogLevel::from_verbosity(cli.debug);
    }
    if let Some(path) = &cli.log_file {
        config = config.with_file(path, false);
    }
    gblibx_logging::init(&config).map_err(|e| e.to_string())
}

fn run_run(args: RunArgs) -> Result<i32, String> {
    let mut cmd = if args.shell {
        RunCmd::shell(&args.command.join(" "))
    } else {
        RunCmd::new(args.command)
    };
    if let Some(ms) = args.timeout_ms {
        cmd = cmd.timeout(Duration::from_millis(ms));
    }
    let command_line = cmd.command_line();
    info!(command = %command_line, "running");

    let status = cmd
        .stdout(|line| println!("{line}"))
        .stderr(|line| eprintln!("{line}"))
        .run()
        .map_err(|e| e.to_string())?;
    info!(command = %command_line, code = status.exit_code(), "finished");
    Ok(status.exit_code())
}

fn run_parse(args: ParseArgs) -> Result<i32, String> {
    let surface = load_surface(&args.surface)?;
    let mut parser = surface
        .build()
        .map_err(|e| format!("Invalid surface '{}': {e}", args.surface.display()))?;

    let result = parser.parse_args(args.argv, !args.allow_empty);
    let report = ParseReport::from_parser(&parser, &result);
    let json = report
        .to_json()
        .map_err(|e| format!("JSON serialization failed: {e}"))?;
    println!("{json}");

    Ok(match result {
        Ok(ParseOutcome::Parsed) | Ok(ParseOutcome::Help(_)) => 0,
        Ok(ParseOutcome::MissingArguments(_)) | Err(_) => USAGE_ERROR_EXIT,
    })
}

fn run_check(args: ParseArgs) -> Result<i32, String> {
    let surface = load_surface(&args.surface)?;
    let mut parser = surface
        .build()
        .map_err(|e| format!("Invalid surface '{}': {e}", args.surface.display()))?;

    parser.parse_or_exit(args.argv, !args.allow_empty);
    let report = ParseReport::from_parser(&parser, &Ok(ParseOutcome::Parsed));
    let json = report
        .to_json()
        .map_err(|e| format!("JSON serialization failed: {e}"))?;
    println!("{json}");
    Ok(0)
}

fn run_usage(args: UsageArgs) -> Result<i32, String> {
    let surface = load_surface(&args.surface)?;
    let parser = surface
        .build()
        .map_err(|e| format!("Invalid surface '{}': {e}", args.surface.display()))?;
    if args.detailed {
        print!("{}", parser.detailed_usage());
    } else {
        print!("{}", parser.short_usage());
    }
    Ok(0)
}

fn run_get(args: GetArgs) -> Result<i32, String> {
    let client = HttpClient::new().map_err(|e| e.to_string())?;
    let params: Vec<&str> = args.params.iter().map(String::as_str).collect();
    let response = client
        .get_key_values(&args.url, &params)
        .map_err(|e| e.to_string())?;
    print_json(&response)
}

fn run_post(args: PostArgs) -> Result<i32, String> {
    let body: serde_json::Value = serde_json::from_str(&args.data)
        .map_err(|e| format!("Invalid --data JSON: {e}"))?;
    let mut client = HttpClient::new().map_err(|e| e.to_string())?;
    if let Some(retries) = args.retries {
        client = client.with_post_retry(retries, Duration::from_secs(args.retry_delay_secs));
    }
    info!(url = %args.url, "posting");
    let response = client
        .post_json(&args.url, &body)
        .map_err(|e| e.to_string())?;
    print_json(&response)
}

fn print_json(map: &JsonMap) -> Result<i32, String> {
    let json = serde_json::to_string_pretty(map)
        .map_err(|e| format!("JSON serialization failed: {e}"))?;
    println!("{json}");
    Ok(0)
}

fn load_surface(path: &Path) -> Result<Surface, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    if is_json(path) {
        Surface::from_json(&raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
    } else {
        serde_yaml::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_is_json_by_extension() {
        assert!(is_json(Path::new("surface.json")));
        assert!(is_json(Path::new("SURFACE.JSON")));
        assert!(!is_json(Path::new("surface.yaml")));
        assert!(!is_json(Path::new("surface")));
    }

    #[test]
    fn test_run_args_keep_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["gbx", "-dd", "run", "--timeout-ms", "5", "ls", "-l", "/"])
            .unwrap();
        assert_eq!(cli.debug, 2);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.timeout_ms, Some(5));
        assert_eq!(args.command, vec!["ls", "-l", "/"]);
    }

    #[test]
    fn test_http_args() {
        let cli = Cli::try_parse_from(["gbx", "get", "http://h/x", "a=1", "b=2"]).unwrap();
        let Command::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.params, vec!["a=1", "b=2"]);

        let cli = Cli::try_parse_from(["gbx", "post", "http://h/x", "--retries", "2"]).unwrap();
        let Command::Post(args) = cli.command else {
            panic!("expected post");
        };
        assert_eq!(args.data, "{}");
        assert_eq!(args.retries, Some(2));
        assert_eq!(args.retry_delay_secs, 5);
    }

    #[test]
    fn test_parse_args_after_double_dash() {
        let cli = Cli::try_parse_from(["gbx", "parse", "--surface", "s.yaml", "--", "-n", "x"])
            .unwrap();
        let Command::Parse(args) = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(args.surface, PathBuf::from("s.yaml"));
        assert_eq!(args.argv, vec!["-n", "x"]);
    }
}
