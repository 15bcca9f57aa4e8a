use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eqr_codec::Tag;
use std::process;
use tracing::Level;

mod commands;

/// Standardized exit codes for CLI.
/// 2 = input error, 3 = payload could not be decoded or compiled, 1 = other.
const EXIT_OTHER: i32 = 1;
const EXIT_INPUT: i32 = 2;
const EXIT_DECODE: i32 = 3;

#[derive(Parser)]
#[command(name = "eqrx", version, about = "eQR CLI: decode payloads, run and check exercises")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct GlobalOpts {
    /// Payload input is hex text instead of raw bytes
    #[arg(long, global = true)]
    pub hex: bool,

    /// Seed for variable rerolls (random when omitted)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Session config JSON file (decoder and vm sections)
    #[arg(long, global = true, env = "EQR_CONFIG")]
    pub config: Option<String>,

    /// Override the VM step limit
    #[arg(long, global = true, env = "EQR_STEP_LIMIT")]
    pub step_limit: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a payload and print its contents
    Decode {
        /// Payload file (or - for stdin)
        #[arg(default_value = "-")]
        payload: String,
    },
    /// Execute every exercise of a payload
    Run {
        /// Payload file (or - for stdin)
        #[arg(default_value = "-")]
        payload: String,
    },
    /// Generate exercise instances for a tag
    Exercises {
        /// Payload file (or - for stdin)
        #[arg(default_value = "-")]
        payload: String,
        /// PLUS, MINUS, STAR or MORE_OPERANDS
        #[arg(long, value_parser = parse_tag)]
        tag: Tag,
    },
    /// Generate exercises for a tag and check an answer to one of them
    Check {
        /// Payload file (or - for stdin)
        payload: String,
        #[arg(long, value_parser = parse_tag)]
        tag: Tag,
        /// 1-based exercise id within the generated batch
        #[arg(long, default_value_t = 1)]
        index: usize,
        #[arg(long, allow_hyphen_values = true)]
        answer: f64,
    },
    /// Compile and evaluate an expression or equation
    Eval {
        expr: String,
        /// Variable binding, name=value (repeatable)
        #[arg(long = "var", value_parser = commands::parse_var)]
        vars: Vec<(String, f64)>,
        /// Also print the compiled program
        #[arg(long)]
        disasm: bool,
    },
}

fn parse_tag(s: &str) -> Result<Tag, String> {
    Tag::parse(s).ok_or_else(|| format!("unknown tag: {s}"))
}

/// Map error strings to exit codes based on their prefix.
fn exit_code_for(err: &str) -> i32 {
    if err.starts_with("decode")
        || err.starts_with("compile")
        || err.starts_with("invalid payload")
    {
        EXIT_DECODE
    } else if err.starts_with("read ")
        || err.starts_with("parse ")
        || err.starts_with("missing ")
        || err.starts_with("hex ")
    {
        EXIT_INPUT
    } else {
        EXIT_OTHER
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.opts.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let result = match cli.command {
        Commands::Decode { payload } => commands::decode(&cli.opts, &payload),
        Commands::Run { payload } => commands::run(&cli.opts, &payload),
        Commands::Exercises { payload, tag } => commands::exercises(&cli.opts, &payload, tag),
        Commands::Check {
            payload,
            tag,
            index,
            answer,
        } => commands::check(&cli.opts, &payload, tag, index, answer),
        Commands::Eval { expr, vars, disasm } => commands::eval(&cli.opts, &expr, &vars, disasm),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(exit_code_for(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exit_codes_by_error_class() {
        assert_eq!(exit_code_for("invalid payload: too short: 2 bytes"), EXIT_DECODE);
        assert_eq!(exit_code_for("compile: malformed equation"), EXIT_DECODE);
        assert_eq!(exit_code_for("read payload: No such file"), EXIT_INPUT);
        assert_eq!(exit_code_for("hex payload: Odd number of digits"), EXIT_INPUT);
        assert_eq!(exit_code_for("no exercise with id 4"), EXIT_OTHER);
    }

    #[test]
    fn parses_check_arguments() {
        let cli = Cli::try_parse_from([
            "eqrx", "check", "p.bin", "--tag", "minus", "--index", "2", "--answer", "-3.5",
            "--seed", "7",
        ])
        .unwrap();
        assert_eq!(cli.opts.seed, Some(7));
        match cli.command {
            Commands::Check { tag, index, answer, .. } => {
                assert_eq!(tag, Tag::Minus);
                assert_eq!(index, 2);
                assert_eq!(answer, -3.5);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(Cli::try_parse_from(["eqrx", "exercises", "-", "--tag", "divide"]).is_err());
    }
}
