use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, LevelFilter};

use sdrc::{lexer, util::fmt::tree};

#[derive(Parser, Debug)]
#[command(name = "sdrc", version, about = "Compiles Slider sources to LLVM assembly")]
struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a source file to a `.ll` file.
    Build {
        source: PathBuf,
        #[arg(short, long, value_name = "PATH", default_value = "build/out.ll")]
        out: PathBuf,
    },
    /// Print the token stream, one token per line.
    Tokens { source: PathBuf },
    /// Print the syntax tree.
    Ast { source: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("[sdrc] error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Build { source, out } => {
            let src = read_source(&source)?;
            let ir = sdrc::emit_llvm_ir(&src, &module_name(&source))
                .with_context(|| format!("failed to compile {}", source.display()))?;
            write_output(&out, ir.as_bytes())?;
            println!("[sdrc] wrote {}", out.display());
        }
        Command::Tokens { source } => {
            let src = read_source(&source)?;
            let tokens = lexer::lex_in_new(&src)
                .map_err(sdrc::Error::from)
                .with_context(|| format!("failed to lex {}", source.display()))?;
            for token in &tokens {
                println!("{token:?}");
            }
        }
        Command::Ast { source } => {
            let src = read_source(&source)?;
            let module = sdrc::parse_source(&src)
                .with_context(|| format!("failed to parse {}", source.display()))?;
            print!("{}", tree::print_module_string(&module));
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    debug!("reading {}", path.display());
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// The IR module is named after the source file, without its extension.
fn module_name(source: &Path) -> String {
    source
        .file_stem()
        .map_or_else(|| "main".to_owned(), |stem| stem.to_string_lossy().into_owned())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
