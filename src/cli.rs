//! Command-line interface for code-analyzer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::analysis::languages::css;
use crate::analysis::{analyze_language, AnalysisResult, Language};
use crate::config::{self, Config};
use crate::lint::{CommandLinter, Linter};
use crate::report::{self, FileReport, OutputFormat};
use crate::summary::{summarize, AnalyzeSummary};
use crate::walker::{CancellationFlag, ProgressEvent, RepositoryWalker};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Heuristic multi-language code analyzer.
///
/// Produces structured quality reports for Python, JavaScript, HTML and CSS
/// files, with basic statistics for Ruby, PHP and Go. Whole git
/// repositories can be analyzed with the `repo` command.
#[derive(Parser)]
#[command(name = "code-analyzer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze local source files
    Analyze(AnalyzeArgs),
    /// Clone and analyze a git repository
    Repo(RepoArgs),
    /// Write a configuration file with default values
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Files to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Language tag (py, js, html, css, rb, php, go); default: from extension
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Output format: pretty, json, or csv
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// HTML document to check CSS selectors against
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit with status 1 when any warning section is reported
    #[arg(long)]
    pub fail_on_issues: bool,
}

/// Arguments for the repo command.
#[derive(Args)]
pub struct RepoArgs {
    /// Repository URL or local path accepted by `git clone`
    pub url: String,

    /// Branch to clone
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with status 1 when any file has warnings
    #[arg(long)]
    pub fail_on_issues: bool,
}

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "code-analyzer.yaml")]
    pub output: PathBuf,
}

/// Initialize tracing on stderr. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.parse::<tracing::Level>().map_or("warn", |_| level)));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Option<Config> {
    match Config::load(explicit) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error: {}", e);
            None
        }
    }
}

/// Analyze one local file.
pub fn analyze_file(
    path: &Path,
    forced: Option<Language>,
    html: Option<&str>,
    linter: Option<&dyn Linter>,
) -> anyhow::Result<FileReport> {
    let language = match forced.or_else(|| Language::from_path(path)) {
        Some(l) => l,
        None => anyhow::bail!(
            "cannot determine the language of {}; pass --lang",
            path.display()
        ),
    };

    let bytes = fs::read(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
    if bytes.is_empty() {
        anyhow::bail!("{} is empty", path.display());
    }
    let source = String::from_utf8_lossy(&bytes);
    let file_name = path.to_string_lossy().to_string();

    let result = match (language, html) {
        (Language::Css, Some(html)) => AnalysisResult::Css(css::analyze_with_html(&source, Some(html))),
        _ => analyze_language(language, &source),
    };

    let result = match (result, linter) {
        (AnalysisResult::JavaScript(js), Some(linter)) => match linter.lint(&source, &file_name) {
            Ok(problems) => {
                debug!(file = %file_name, count = problems.len(), "lint problems attached");
                AnalysisResult::JavaScript(js.with_lint_problems(problems))
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "lint failed; continuing without lint findings");
                AnalysisResult::JavaScript(js)
            }
        },
        (result, _) => result,
    };

    let summary = AnalyzeSummary::new(summarize(&result));
    Ok(FileReport {
        file_type: language,
        file_name: Some(file_name),
        result,
        summary,
    })
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let format: OutputFormat = match args.format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if format == OutputFormat::Csv && args.files.len() != 1 {
        eprintln!("Error: csv output supports exactly one file");
        return Ok(EXIT_ERROR);
    }

    // Reject unknown tags before any file is touched
    let forced = match &args.lang {
        Some(tag) => match tag.parse::<Language>() {
            Ok(l) => Some(l),
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => None,
    };

    let Some(config) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };

    let html = match &args.html {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", path.display(), e);
                return Ok(EXIT_ERROR);
            }
        },
        None => None,
    };

    let linter = config.lint.command.clone().map(CommandLinter::new);
    let linter_ref: Option<&dyn Linter> = linter.as_ref().map(|l| l as &dyn Linter);

    let outcomes: Vec<anyhow::Result<FileReport>> = args
        .files
        .par_iter()
        .map(|path| analyze_file(path, forced, html.as_deref(), linter_ref))
        .collect();

    let mut reports = Vec::new();
    let mut had_errors = false;
    for outcome in outcomes {
        match outcome {
            Ok(r) => reports.push(r),
            Err(e) => {
                eprintln!("Error: {}", e);
                had_errors = true;
            }
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            if let [single] = reports.as_slice() {
                report::write_json(&mut out, single)?;
            } else {
                report::write_json(&mut out, &reports)?;
            }
        }
        OutputFormat::Csv => {
            if let Some(r) = reports.first() {
                report::write_csv(&mut out, &r.summary)?;
            }
        }
        OutputFormat::Pretty => {
            for r in &reports {
                report::write_pretty_file(&mut out, r)?;
            }
        }
    }

    if had_errors {
        return Ok(EXIT_ERROR);
    }
    let issues: usize = reports.iter().map(|r| r.summary.issues_count).sum();
    if args.fail_on_issues && issues > 0 {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    bar.set_style(style);
    bar
}

/// Run the repo command.
pub fn run_repo(args: &RepoArgs) -> anyhow::Result<i32> {
    let format: OutputFormat = match args.format.parse() {
        Ok(f @ (OutputFormat::Pretty | OutputFormat::Json)) => f,
        Ok(OutputFormat::Csv) => {
            eprintln!("Error: csv output is not available for repositories");
            return Ok(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let Some(config) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };
    let limits = match config.walker.limits() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let max_files = limits.max_files;
    let walker = RepositoryWalker::new(limits);

    let bar = progress_bar(args.quiet);
    let on_progress = |event: ProgressEvent| match event {
        ProgressEvent::Start { total_candidates } => {
            bar.set_length(total_candidates.min(max_files) as u64);
            bar.set_message("analyzing");
        }
        ProgressEvent::File { path, analyzed, .. } => {
            bar.set_position(analyzed as u64);
            bar.set_message(path);
        }
        ProgressEvent::Done { .. } | ProgressEvent::Cancelled { .. } => bar.finish_and_clear(),
    };

    let cancel = CancellationFlag::new();
    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(async {
        let flag = cancel.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.cancel();
            }
        });
        let outcome = walker
            .walk(&args.url, args.branch.as_deref(), &on_progress, &cancel)
            .await;
        signal.abort();
        outcome
    });
    bar.finish_and_clear();

    let analysis = match outcome {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => report::write_json(&mut out, &analysis)?,
        _ => report::write_pretty_repository(&mut out, &analysis)?,
    }

    if analysis.cancelled {
        eprintln!("Warning: analysis cancelled; results are partial");
        return Ok(EXIT_ERROR);
    }
    if args.fail_on_issues && analysis.total_issues > 0 {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    let content = default_config_yaml()?;
    if let Err(e) = fs::write(&args.output, content) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Environment variables override the walker budgets:");
    for key in [
        config::ENV_MAX_FILES,
        config::ENV_MAX_FILE_SIZE,
        config::ENV_MAX_TOTAL_SIZE,
        config::ENV_CONCURRENCY,
    ] {
        println!("  {}", key);
    }
    Ok(EXIT_SUCCESS)
}

/// The default configuration as YAML, with a header comment.
pub fn default_config_yaml() -> anyhow::Result<String> {
    let body = serde_yaml::to_string(&Config::default())?;
    Ok(format!("# code-analyzer configuration\n{}", body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{LintError, LintProblem};

    struct FixedLinter(Vec<LintProblem>);

    impl Linter for FixedLinter {
        fn lint(&self, _source: &str, _file_name: &str) -> Result<Vec<LintProblem>, LintError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenLinter;

    impl Linter for BrokenLinter {
        fn lint(&self, _source: &str, _file_name: &str) -> Result<Vec<LintProblem>, LintError> {
            Err(LintError::EmptyCommand)
        }
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["code-analyzer", "analyze", "a.py", "b.js", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.format, "json");
            }
            _ => panic!("expected analyze"),
        }

        let cli = Cli::try_parse_from(["code-analyzer", "--log-level", "debug", "repo", "https://x/y.git", "-b", "dev"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Repo(args) => assert_eq!(args.branch.as_deref(), Some("dev")),
            _ => panic!("expected repo"),
        }

        assert!(Cli::try_parse_from(["code-analyzer", "analyze"]).is_err());
    }

    #[test]
    fn test_analyze_file_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<div><span></div>").unwrap();

        let report = analyze_file(&path, None, None, None).unwrap();
        assert_eq!(report.file_type, Language::Html);
        assert_eq!(report.summary.issues_count, 1);
    }

    #[test]
    fn test_analyze_file_rejects_unknown_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let unknown = dir.path().join("notes.txt");
        fs::write(&unknown, "hello").unwrap();
        assert!(analyze_file(&unknown, None, None, None).is_err());
        // A forced tag overrides the extension
        assert!(analyze_file(&unknown, Some(Language::Rb), None, None).is_ok());

        let empty = dir.path().join("empty.py");
        fs::write(&empty, "").unwrap();
        assert!(analyze_file(&empty, None, None, None).is_err());
    }

    #[test]
    fn test_analyze_file_attaches_lint_problems() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "var a = 1;\nfunction x(){ eval(\"alert(1)\") }\n").unwrap();

        let linter = FixedLinter(vec![LintProblem {
            rule_id: Some("no-eval".to_string()),
            severity: 2,
            message: "eval can be harmful.".to_string(),
            line: 2,
            column: 15,
        }]);
        let report = analyze_file(&path, None, None, Some(&linter)).unwrap();
        let ids: Vec<_> = report.summary.sections.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&"js-eval"));
        assert!(ids.contains(&"js-eslint-errors"));

        // A failing linter degrades to no lint findings
        let report = analyze_file(&path, None, None, Some(&BrokenLinter)).unwrap();
        assert!(report.summary.sections.iter().all(|s| s.id != "js-eslint-errors"));
    }

    #[test]
    fn test_analyze_css_with_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.css");
        fs::write(&path, ".used { color: red; }\n.gone { color: red; }\n").unwrap();

        let report = analyze_file(&path, None, Some("<p class=\"used\"></p>"), None).unwrap();
        let unused = report
            .summary
            .sections
            .iter()
            .find(|s| s.id == "css-unused-selectors")
            .unwrap();
        assert_eq!(unused.items, vec![".gone".to_string()]);
    }

    #[test]
    fn test_default_config_yaml_round_trips() {
        let yaml = default_config_yaml().unwrap();
        assert!(yaml.starts_with("# code-analyzer configuration"));
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_run_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("code-analyzer.yaml");
        let args = InitArgs { output: output.clone() };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(Config::parse_file(&output).is_ok());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
