// src/main.rs

//! Interactive console for the simulator
//!
//! A thin line-oriented REPL over the [`Kernel`] facade. Commands other
//! than `initialize`, `help`, `clear` and `exit` are restricted until a
//! config has been loaded.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use log::LevelFilter;

use sim_os::{Config, Kernel};

const DEFAULT_CONFIG_PATH: &str = "config.txt";

fn print_help(initialized: bool) {
    println!();
    println!("Available commands:");
    println!("  initialize [path]     load the config (default: {DEFAULT_CONFIG_PATH})");
    if initialized {
        println!("  screen -s <name>      create a process");
        println!("  screen -r <name>      show a process");
        println!("  screen -ls            list processes");
        println!("  scheduler-start       start the batch generator");
        println!("  scheduler-stop        stop the batch generator");
        println!("  report-util           write the utilization report");
        println!("  process-smi           show cpu/memory summary");
        println!("  vmstat                show memory and tick counters");
    }
    println!("  clear");
    println!("  exit");
    println!();
}

fn show_process(kernel: &Kernel, name: &str) {
    match kernel.process_view(name) {
        Ok(process) => {
            println!();
            println!("Process: {}", process.name());
            println!("Created: {}", process.created_at());
            println!("State: {}", process.state().as_str());
            match process.core() {
                Some(core) => println!("Core: {core}"),
                None => println!("Core: -"),
            }
            match process.memory_size() {
                Some(size) => println!("Memory: {size}"),
                None => println!("Memory: -"),
            }
            println!(
                "Instructions: {} / {}",
                process.current_instruction(),
                process.total_instructions()
            );
            println!();
        }
        Err(e) => println!("{e}"),
    }
}

fn dispatch(kernel: &mut Kernel, line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => {}
        ["exit"] => {
            kernel.shutdown();
            println!("Toodles!");
            return false;
        }
        ["help"] => print_help(kernel.is_initialized()),
        ["clear"] => print!("\x1b[2J\x1b[1;1H"),
        ["initialize", rest @ ..] => {
            let path = rest.first().copied().unwrap_or(DEFAULT_CONFIG_PATH);
            let result = Config::load(path)
                .map_err(sim_os::KernelError::from)
                .and_then(|config| kernel.initialize(config));
            match result {
                Ok(()) => println!("Initialized from {path}."),
                Err(e) => println!("{e}"),
            }
        }
        _ if !kernel.is_initialized() => {
            println!("Other commands are restricted until initialization. Type 'help'.");
        }
        ["screen", "-s", name] => match kernel.create_named_process(name) {
            Ok(_) => println!("Created process {name}."),
            Err(e) => println!("{e}"),
        },
        ["screen", "-r", name] => show_process(kernel, name),
        ["screen", "-ls"] => match kernel.context() {
            Ok(ctx) => print!("\n{}\n", sim_os::kernel::report::utilization_report(ctx)),
            Err(e) => println!("{e}"),
        },
        ["scheduler-test" | "scheduler-start"] => match kernel.start_generator() {
            Ok(()) => println!("Scheduler has started."),
            Err(e) => println!("{e}"),
        },
        ["scheduler-stop"] => match kernel.stop_generator() {
            Ok(()) => println!("Scheduler stopped."),
            Err(e) => println!("{e}"),
        },
        ["report-util"] => match kernel.report() {
            Ok(_) => println!("Report generated at csopesy_log.txt"),
            Err(e) => println!("{e}"),
        },
        ["process-smi"] => match kernel.process_smi() {
            Ok(smi) => println!("{smi}"),
            Err(e) => println!("{e}"),
        },
        ["vmstat"] => match kernel.vmstat() {
            Ok(stat) => println!("{stat}"),
            Err(e) => println!("{e}"),
        },
        _ => println!("Unknown command. Type 'help'."),
    }
    true
}

fn main() -> ExitCode {
    sim_os::logger::init(LevelFilter::Info);

    println!("Welcome to the sim_os command line.");
    println!("Type 'initialize' to load a config, 'help' for commands.");

    let mut kernel = Kernel::new();
    let stdin = io::stdin();

    loop {
        print!("Enter a command: ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {
                if !dispatch(&mut kernel, &line) {
                    break;
                }
            }
            Err(e) => {
                eprintln!("stdin error: {e}");
                break;
            }
        }
    }

    kernel.shutdown();
    ExitCode::SUCCESS
}
