use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the telemetry Quickwit stack workspace",
    long_about = "A unified CLI for synthesizing the stack, publishing its assets,\n\
                  and running CI checks in the telemetry Quickwit workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the CODE stack into cdk.out
    Synth {
        /// Deployment stage
        #[arg(long, default_value = "CODE")]
        stage: String,
        /// Output directory
        #[arg(long, default_value = "cdk.out")]
        out: String,
    },
    /// Print the declared functions and outputs
    Show {
        /// Deployment stage
        #[arg(long, default_value = "CODE")]
        stage: String,
    },
    /// Publish staged assets to the assets bucket
    Publish {
        /// Deployment stage
        #[arg(long, default_value = "CODE")]
        stage: String,
        /// Target AWS account id
        #[arg(long, env = "TELEMETRY_QW_ACCOUNT")]
        account: String,
        /// Only list what would be uploaded
        #[arg(long)]
        dry_run: bool,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Workspace tests
    Test,
    /// Lint + test
    Check,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_stack_cli(args: &[&str]) {
    let mut cargo_args = vec!["run", "-p", "telemetry_qw_deploy", "--"];
    cargo_args.extend_from_slice(args);
    run_cargo(&cargo_args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test telemetry_qw_core");
    run_cargo(&["test", "-p", "telemetry_qw_core"]);

    step("Test telemetry_qw_deploy");
    run_cargo(&["test", "-p", "telemetry_qw_deploy"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { stage, out } => {
            step(&format!("Synthesize {stage} stack"));
            run_stack_cli(&["synth", "--stage", &stage, "--out", &out]);
        }
        Commands::Show { stage } => {
            run_stack_cli(&["show", "--stage", &stage]);
        }
        Commands::Publish {
            stage,
            account,
            dry_run,
        } => {
            step(&format!("Publish {stage} assets"));
            let mut args = vec![
                "publish",
                "--stage",
                stage.as_str(),
                "--account",
                account.as_str(),
            ];
            if dry_run {
                args.push("--dry-run");
            }
            run_stack_cli(&args);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
