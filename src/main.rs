mod config;
mod highlighter;

use std::path::PathBuf;

use clap::Parser;
use highlighter::MscriptHelper;
use mscript::{EngineError, Engine};
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

/// MATLAB-compatible scripting engine: lexer, parser, tree-walking
/// evaluator, and symbolic math, with a REPL front end.
#[derive(Parser, Debug)]
#[command(name = "mscript")]
#[command(version)]
#[command(about = "A MATLAB-compatible scripting language interpreter")]
#[command(long_about = "Evaluates MATLAB-style source: matrix algebra, numerical routines, \
symbolic mathematics, and plot/audio descriptors. Runs a script file if one is given, \
otherwise starts an interactive REPL.")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print every plot/audio descriptor emitted, instead of just console text
    #[arg(long = "show-events")]
    show_events: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(script_path) = args.script {
        run_script(&script_path, args.show_events)?;
        return Ok(());
    }

    run_repl(args.show_events)
}

/// Executes a script file end to end and exits. Output/plot callbacks
/// print straight to stdout; there is no host UI shell in this binary.
fn run_script(path: &PathBuf, show_events: bool) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;

    let mut engine = new_engine(show_events);
    match engine.execute(&contents) {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{}", format_engine_error(&e));
            std::process::exit(1);
        }
    }
}

fn run_repl(show_events: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = new_engine(show_events);

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).map_err(|e| format!("failed to initialize REPL: {e}"))?;
    rl.set_helper(Some(MscriptHelper::new()));

    let history_file = ".mscript_history";
    let _ = rl.load_history(history_file);

    println!("{} (v{})", config::WELCOME_MESSAGE, config::VERSION);
    println!("{}", config::WELCOME_SUBTITLE);

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                match engine.execute(&line) {
                    Ok(_) => {}
                    Err(e) => eprintln!("{}", format_engine_error(&e)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

/// Wires the engine's output/plot callbacks to stdout. `__audio:`/`__plot3d:`
/// sentinel-prefixed text is host out-of-band payload (spec.md §6); the CLI
/// either echoes it verbatim (`--show-events`) or swallows it, since there is
/// no renderer here.
fn new_engine(show_events: bool) -> Engine {
    let mut engine = Engine::new();

    engine.set_output_callback(move |text| {
        if text.starts_with("__audio:") || text.starts_with("__plot3d:") || text.starts_with("__sym:") {
            if show_events {
                print!("{text}");
            }
            return;
        }
        print!("{text}");
    });

    engine.set_plot_callback(move |figure| {
        if show_events {
            match serde_json::to_string(&figure) {
                Ok(json) => println!("__figure:{json}"),
                Err(e) => eprintln!("failed to serialize figure: {e}"),
            }
        }
    });

    engine
}

fn format_engine_error(e: &EngineError) -> String {
    match e {
        EngineError::Lex(err) => format!("lexer error: {err}"),
        EngineError::Parse(err) => format!("parse error: {err}"),
        EngineError::Runtime(err) => format!("runtime error: {err}"),
    }
}
