//! gpir-opt: parse a textual module, run passes, print the result.
//!
//! Usage:
//!   gpir-opt input.gpir --passes DCE,CSE
//!   gpir-opt input.gpir --passes CFGCan -o out.gpir
//!   gpir-opt input.gpir --passes DeadCodeElimination --no-verify

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use gpir::ir::print_module;
use gpir::transform::{
    CfgCanonicalization, CfgSimplification, CommonSubexpressionElimination, DeadCodeElimination,
};
use gpir::Module;
use gpir_parser::parse_module;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command-line arguments
#[derive(Debug)]
struct Args {
    /// Input file path
    input_file: Option<String>,
    /// Output file path (stdout when absent)
    output_file: Option<String>,
    /// Comma-separated pass list
    passes: Vec<String>,
    /// Skip post-pass verification
    no_verify: bool,
    /// Show help
    show_help: bool,
    /// Show version
    show_version: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args {
            input_file: None,
            output_file: None,
            passes: Vec::new(),
            no_verify: false,
            show_help: false,
            show_version: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => parsed.show_help = true,
                "-v" | "--version" => parsed.show_version = true,
                "-o" | "--output" => {
                    i += 1;
                    if i < args.len() {
                        parsed.output_file = Some(args[i].clone());
                    }
                }
                "--passes" => {
                    i += 1;
                    if i < args.len() {
                        parsed
                            .passes
                            .extend(args[i].split(',').map(|p| p.trim().to_string()));
                    }
                }
                "--no-verify" => parsed.no_verify = true,
                arg if !arg.starts_with('-') => {
                    if parsed.input_file.is_none() {
                        parsed.input_file = Some(arg.to_string());
                    }
                }
                _ => {
                    eprintln!("Unknown option: {}", args[i]);
                }
            }
            i += 1;
        }

        parsed
    }
}

fn print_help() {
    println!(
        r#"gpir-opt v{}

USAGE:
    gpir-opt [OPTIONS] <input.gpir>

OPTIONS:
    -h, --help       Show this help message
    -v, --version    Show version information
    -o, --output     Output file path (default: stdout)
    --passes         Comma-separated pass list (abbreviation or full name):
                       AS      | AlgebraSimplification
                       CFGCan  | CFGCanonicalization
                       CFGSimp | CFGSimplification
                       CSE     | CommonSubexpressionElimination
                       DCE     | DeadCodeElimination
                       LBP     | LiteralBroadcastingPromotion
                       SP      | StackPromotion
                       VP      | ValuePromotion
    --no-verify      Skip post-pass verification

EXAMPLES:
    gpir-opt module.gpir --passes DCE,CSE
    gpir-opt module.gpir --passes CFGCan -o canonical.gpir
"#,
        VERSION
    );
}

fn run_pass(module: &mut Module, pass: &str, verify: bool) -> Result<bool, String> {
    let result = match pass {
        "DCE" | "DeadCodeElimination" => {
            module.map_transform(&DeadCodeElimination::new(), verify)
        }
        "CSE" | "CommonSubexpressionElimination" => {
            module.map_transform(&CommonSubexpressionElimination::new(), verify)
        }
        "CFGCan" | "CFGCanonicalization" => {
            module.map_transform(&CfgCanonicalization::new(), verify)
        }
        "CFGSimp" | "CFGSimplification" => {
            module.map_transform(&CfgSimplification::new(), verify)
        }
        "AS" | "AlgebraSimplification"
        | "LBP" | "LiteralBroadcastingPromotion"
        | "SP" | "StackPromotion"
        | "VP" | "ValuePromotion" => {
            return Err(format!("pass '{}' is not implemented", pass));
        }
        unknown => {
            return Err(format!("unknown pass '{}'", unknown));
        }
    };
    result.map_err(|e| format!("verification failed after {}: {}", pass, e))
}

fn main() {
    let args = Args::parse();

    if args.show_help {
        print_help();
        return;
    }
    if args.show_version {
        println!("gpir-opt v{}", VERSION);
        return;
    }

    let Some(input_file) = &args.input_file else {
        eprintln!("Error: No input file provided");
        eprintln!("Use --help for usage information");
        process::exit(1);
    };
    if !Path::new(input_file).exists() {
        eprintln!("Error: File '{}' not found", input_file);
        process::exit(1);
    }
    let source = fs::read_to_string(input_file).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", input_file, e);
        process::exit(1);
    });

    let mut module = match parse_module(&source) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    };

    // The input must be valid before any pass runs.
    if let Err(e) = gpir::verify_module(&module) {
        eprintln!("Verification error: {}", e);
        process::exit(1);
    }

    for pass in &args.passes {
        if let Err(e) = run_pass(&mut module, pass, !args.no_verify) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    let printed = print_module(&module);
    match &args.output_file {
        Some(path) => {
            if let Err(e) = fs::write(path, &printed) {
                eprintln!("Error writing output file '{}': {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", printed),
    }
}
