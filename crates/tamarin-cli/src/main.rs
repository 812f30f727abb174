// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! tamarin CLI - run, compile, and inspect scripts.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tamarin_core::compiler::disasm;
use tamarin_core::{Engine, Value};

#[derive(Parser)]
#[command(
    name = "tamarin",
    about = "Bytecode compiler and stack VM for an ES3-style scripting subset",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a script file and print its completion value
    Run {
        /// Script file to execute
        script: PathBuf,
    },
    /// Evaluate source text from the command line
    Eval {
        /// Source text
        #[arg(short = 'e', long = "expression")]
        expression: String,
    },
    /// Compile a script to bytecode
    Build {
        /// Script file to compile
        script: PathBuf,
        /// Output path for the assembled bytecode
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compile a script and print its bytecode listing
    Disasm {
        /// Script file to disassemble
        script: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "tamarin_core=debug"
    } else {
        "tamarin_core=warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Some(Command::Run { script }) => run_file(&script),
        Some(Command::Eval { expression }) => eval_source(&expression),
        Some(Command::Build { script, output }) => build_file(&script, &output),
        Some(Command::Disasm { script }) => disasm_file(&script),
        None => {
            repl();
            Ok(())
        }
    };

    if let Err(message) = result {
        eprintln!("{}: {}", "error".red().bold(), message);
        std::process::exit(1);
    }
}

fn run_file(script: &PathBuf) -> Result<(), String> {
    let mut engine = Engine::new();
    let value = engine.eval_file(script).map_err(|e| e.to_string())?;
    if !value.is_undefined() {
        println!("{}", value);
    }
    Ok(())
}

fn eval_source(source: &str) -> Result<(), String> {
    let mut engine = Engine::new();
    let value = engine.eval(source).map_err(|e| e.to_string())?;
    if !value.is_undefined() {
        println!("{}", value);
    }
    Ok(())
}

fn build_file(script: &PathBuf, output: &PathBuf) -> Result<(), String> {
    let source = std::fs::read_to_string(script).map_err(|e| e.to_string())?;
    let program = Engine::compile(&source).map_err(|e| e.to_string())?;
    std::fs::write(output, &program.code[..]).map_err(|e| e.to_string())?;
    println!(
        "{} {} ({} bytes, entry {:#x})",
        "wrote".green(),
        output.display(),
        program.code.len(),
        program.entry
    );
    Ok(())
}

fn disasm_file(script: &PathBuf) -> Result<(), String> {
    let source = std::fs::read_to_string(script).map_err(|e| e.to_string())?;
    let program = Engine::compile(&source).map_err(|e| e.to_string())?;
    print!("{}", disasm::disassemble(&program.code).map_err(|e| e.to_string())?);
    Ok(())
}

fn repl() {
    println!("Tamarin v{}", env!("CARGO_PKG_VERSION"));
    if std::io::stdin().is_terminal() {
        println!("Type code to evaluate, or 'exit' to quit.\n");
    }

    let mut engine = Engine::new();
    let stdin = std::io::stdin();
    let mut input = String::new();

    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        input.clear();
        match stdin.read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let trimmed = input.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        match engine.eval(trimmed) {
            Ok(Value::Undefined) => {}
            Ok(value) => println!("{}", value),
            Err(e) => eprintln!("{}: {}", "error".red().bold(), e),
        }
    }

    println!("Goodbye!");
}
