use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::Result;

use lc3vm::output::{MsgColor, Output};
use lc3vm::{Machine, ObjectImage, TerminalConsole};

/// Run pre-assembled LC-3 object files on an observable 16-bit machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.obj` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Load an object file and execute it until it halts
    Run {
        /// Object file to run
        name: PathBuf,
        /// Print each opcode before it executes
        #[arg(short, long)]
        trace: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print registers after the program stops
        #[arg(short, long)]
        dump: bool,
    },
    /// Check that an object file loads, without running it
    Check {
        /// Object file to check
        name: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    lc3vm::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().context_lines(2).build())
    }))?;

    let args = Args::parse();
    match (args.command, args.path) {
        (
            Some(Command::Run {
                name,
                trace,
                minimal,
                dump,
            }),
            _,
        ) => run(&name, trace, minimal, dump),
        (Some(Command::Check { name }), _) => check(&name),
        (None, Some(path)) => run(&path, false, false, false),
        (None, None) => {
            println!("\n~ lc3vm v{VERSION} ~");
            println!("{}", SHORT_INFO.trim().bold());
            Ok(())
        }
    }
}

fn check(name: &Path) -> Result<()> {
    let out = Output::Status;
    out.file_message(MsgColor::Green, "Checking", name);
    let image = ObjectImage::open(name)?;
    // Range is validated exactly as a real load would
    image.range()?;
    out.message(
        MsgColor::Green,
        "Success",
        format_args!(
            "{} words at 0x{:04x}..0x{:04x}",
            image.len(),
            image.origin(),
            image.origin() as usize + image.len()
        ),
    );
    Ok(())
}

fn run(name: &Path, trace: bool, minimal: bool, dump: bool) -> Result<()> {
    Output::set_minimal(minimal);
    let out = Output::Status;

    out.file_message(MsgColor::Green, "Loading", name);
    let image = ObjectImage::open(name)?;
    let mut machine = Machine::new(TerminalConsole::new());
    machine.load(&image)?;
    machine.set_trace(trace || lc3vm::env::is_trace_enabled());
    machine.set_prompt(lc3vm::env::prompt());

    out.message(
        MsgColor::Green,
        "Running",
        format_args!("{} words from 0x{:04x}", image.len(), image.origin()),
    );
    let result = machine.run();
    match machine.fault() {
        None => out.message(
            MsgColor::Cyan,
            "Halted",
            format_args!("after {} instructions", machine.instructions()),
        ),
        Some((addr, fault)) => {
            out.message(MsgColor::Red, "Faulted", format_args!("at 0x{addr:04x}: {fault}"))
        }
    }

    if dump || minimal {
        out.print_registers(machine.registers());
    }
    result?;

    out.file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

const SHORT_INFO: &str = r"
Welcome to lc3vm, an emulator for the LC-3 educational computer.
Give it an object file produced by an LC-3 assembler to run it.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
