// valvesheet CLI - headless valve data sheet operations

mod exit_codes;
mod serve;
mod wire;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use valvesheet_engine::engine::SheetEngine;
use valvesheet_engine::param::{Role, ValueType};
use valvesheet_engine::sheet::Sheet;

use exit_codes::{
    engine_exit_code, ErrorOutput, EXIT_CHECK_FAILED, EXIT_ERROR, EXIT_SERVE_IO, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "vsheet")]
#[command(about = "Valve data sheet computation engine (CLI, headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the data sheet with default inputs
    #[command(after_help = "\
Examples:
  vsheet show
  vsheet show --json")]
    Show {
        /// Emit the snapshot as a single JSON object
        #[arg(long)]
        json: bool,
    },

    /// Read one parameter value
    #[command(after_help = "\
Examples:
  vsheet get face_to_face
  vsheet get face_to_face --set pressure_class=300
  vsheet get wall_thickness --set nominal_pipe_size=6in --set pressure_class=900 --json")]
    Get {
        /// Parameter key
        key: String,

        /// Input writes applied before reading (key=value, repeatable)
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Emit {key, value} as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write input parameters and print the resulting sheet
    #[command(after_help = "\
Each write recomputes every dependent value before the next one applies;
a rejected write leaves the sheet exactly as it was.

Examples:
  vsheet set pressure_class=300
  vsheet set nominal_pipe_size=6in pressure_class=900 --json
  vsheet set design_temp_max=90 -v")]
    Set {
        /// Input writes (key=value)
        #[arg(required = true, value_name = "KEY=VALUE")]
        writes: Vec<String>,

        /// Emit the resulting snapshot as a single JSON object
        #[arg(long)]
        json: bool,

        /// Print a recompute report line per write to stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// List registered parameters, their roles, and constraints
    Params {
        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the registry/table consistency self-check
    Check,

    /// Serve JSONL requests over stdin/stdout (one session, one sheet)
    Serve {
        /// Print a recompute report line per write to stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Show { json } => cmd_show(json),
        Commands::Get { key, set, json } => cmd_get(&key, &set, json),
        Commands::Set {
            writes,
            json,
            verbose,
        } => cmd_set(&writes, json, verbose),
        Commands::Params { json } => cmd_params(json),
        Commands::Check => cmd_check(),
        Commands::Serve { verbose } => cmd_serve(verbose),
    };

    ExitCode::from(code)
}

/// Build the standard engine, reporting a startup failure uniformly.
fn standard_engine() -> Result<SheetEngine, u8> {
    SheetEngine::standard().map_err(|err| {
        eprintln!("error: {}", err);
        EXIT_ERROR
    })
}

fn cmd_show(json: bool) -> u8 {
    let engine = match standard_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let sheet = match engine.create_sheet() {
        Ok(sheet) => sheet,
        Err(err) => {
            ErrorOutput::from_engine_error(&err).print(json);
            return engine_exit_code(&err);
        }
    };
    print_sheet(&engine, &sheet, json);
    EXIT_SUCCESS
}

fn cmd_get(key: &str, sets: &[String], json: bool) -> u8 {
    let engine = match standard_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let mut sheet = match engine.create_sheet() {
        Ok(sheet) => sheet,
        Err(err) => {
            ErrorOutput::from_engine_error(&err).print(json);
            return engine_exit_code(&err);
        }
    };

    if let Err(code) = apply_writes(&engine, &mut sheet, sets, json, false) {
        return code;
    }

    let param = match engine.resolve(key) {
        Ok(param) => param,
        Err(err) => {
            ErrorOutput::from_engine_error(&err).print(json);
            return engine_exit_code(&err);
        }
    };
    match engine.get(&sheet, param) {
        Ok(value) => {
            if json {
                let entry = valvesheet_protocol::WireEntry {
                    key: key.to_string(),
                    value: wire::wire_value(value),
                };
                match serde_json::to_string(&entry) {
                    Ok(line) => println!("{}", line),
                    Err(_) => return EXIT_ERROR,
                }
            } else {
                println!("{}", value.raw_display());
            }
            EXIT_SUCCESS
        }
        Err(err) => {
            ErrorOutput::from_engine_error(&err).print(json);
            engine_exit_code(&err)
        }
    }
}

fn cmd_set(writes: &[String], json: bool, verbose: bool) -> u8 {
    let engine = match standard_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let mut sheet = match engine.create_sheet() {
        Ok(sheet) => sheet,
        Err(err) => {
            ErrorOutput::from_engine_error(&err).print(json);
            return engine_exit_code(&err);
        }
    };

    if let Err(code) = apply_writes(&engine, &mut sheet, writes, json, verbose) {
        return code;
    }

    print_sheet(&engine, &sheet, json);
    EXIT_SUCCESS
}

fn cmd_params(json: bool) -> u8 {
    let engine = match standard_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };

    if json {
        let params: Vec<_> = engine.registry().specs().map(wire::param_info).collect();
        match serde_json::to_string(&params) {
            Ok(line) => println!("{}", line),
            Err(_) => return EXIT_ERROR,
        }
        return EXIT_SUCCESS;
    }

    for spec in engine.registry().specs() {
        let domain = match &spec.value_type {
            ValueType::Enum { allowed } => {
                let values: Vec<String> = allowed.iter().map(|v| v.raw_display()).collect();
                format!("one of: {}", values.join(", "))
            }
            ValueType::Number { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("number in [{}, {}]", min, max),
                _ => "number".to_string(),
            },
            ValueType::Text => "text".to_string(),
        };
        let deps = if spec.dependencies.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = spec.dependencies.iter().map(|k| k.as_str()).collect();
            format!("  <- {}", names.join(", "))
        };
        println!(
            "{:<22} {:<10} {}{}",
            spec.key.as_str(),
            spec.role.as_str(),
            domain,
            deps
        );
    }
    EXIT_SUCCESS
}

fn cmd_check() -> u8 {
    match SheetEngine::standard() {
        Ok(engine) => {
            println!(
                "ok: {} parameters, registry and tables consistent",
                engine.registry().len()
            );
            EXIT_SUCCESS
        }
        Err(err) => {
            eprintln!("check failed: {}", err);
            EXIT_CHECK_FAILED
        }
    }
}

fn cmd_serve(verbose: bool) -> u8 {
    let engine = match standard_engine() {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    match serve::run(&engine, verbose) {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            EXIT_SERVE_IO
        }
    }
}

/// Apply `key=value` writes in order. Returns the exit code of the first
/// failure; the sheet keeps every write that succeeded before it.
fn apply_writes(
    engine: &SheetEngine,
    sheet: &mut Sheet,
    writes: &[String],
    json: bool,
    verbose: bool,
) -> Result<(), u8> {
    for write in writes {
        let Some((key, raw)) = write.split_once('=') else {
            eprintln!("error: expected KEY=VALUE, got '{}'", write);
            return Err(EXIT_USAGE);
        };
        let param = match engine.resolve(key) {
            Ok(param) => param,
            Err(err) => {
                ErrorOutput::from_engine_error(&err).print(json);
                return Err(engine_exit_code(&err));
            }
        };
        // validate_write re-checks the domain; parsing only picks the shape
        let spec = match engine.registry().get(param) {
            Some(spec) => spec,
            None => return Err(EXIT_ERROR),
        };
        let value = match wire::parse_cli_value(spec, raw) {
            Ok(value) => value,
            Err(message) => {
                eprintln!("error: {}: {}", key, message);
                return Err(EXIT_USAGE);
            }
        };
        match engine.set_input(sheet, param, value) {
            Ok(outcome) => {
                if verbose {
                    eprintln!("{}", outcome.report.log_line());
                }
            }
            Err(err) => {
                ErrorOutput::from_engine_error(&err).print(json);
                return Err(engine_exit_code(&err));
            }
        }
    }
    Ok(())
}

fn print_sheet(engine: &SheetEngine, sheet: &Sheet, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(&wire::snapshot_output(engine, sheet)) {
            println!("{}", line);
        }
        return;
    }

    for spec in engine.registry().specs() {
        let value = match sheet.value(spec.key) {
            Some(value) => value.raw_display(),
            None => String::new(),
        };
        let marker = match spec.role {
            Role::Input => " ",
            Role::Computed => "*",
        };
        println!(
            "{} {:<22} {:>12} {:<4} {}",
            marker,
            spec.key.as_str(),
            value,
            spec.unit.unwrap_or(""),
            spec.label
        );
    }
    println!("\n* computed");
}
