// ccheck: lexical and semantic analyzer for a small C-like language

use std::fs;
use std::path::Path;

use ccheck::analyze_source;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        let program_name = args.first().map(|s| s.as_str()).unwrap_or("ccheck");
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} <file.c>", program_name);
        eprintln!();
        eprintln!("Examples:");
        eprintln!(
            "  {} demos/valid_program.c    # Analyze a valid program",
            program_name
        );
        eprintln!(
            "  {} demos/error_program.c    # See semantic diagnostics",
            program_name
        );
        std::process::exit(1);
    }

    let input_file = &args[1];

    if !Path::new(input_file).exists() {
        eprintln!("Error: File '{}' not found", input_file);
        eprintln!(
            "Usage: {} <file.c>",
            args.first().map(|s| s.as_str()).unwrap_or("ccheck")
        );
        std::process::exit(1);
    }

    // Read source code
    let source = match fs::read_to_string(input_file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Failed to read '{}': {}", input_file, e);
            std::process::exit(1);
        }
    };

    log::info!("Analyzing {}...", input_file);

    let analysis = match analyze_source(&source) {
        Ok(analysis) => analysis,
        Err(e) => {
            // Lexical and syntax errors are fatal for the file
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Parsed successfully. Found {} top-level declarations.",
        analysis.program.nodes.len()
    );

    if analysis.is_clean() {
        println!("{}: no problems found", input_file);
        return;
    }

    // Every diagnostic is printed, in emission order
    for diagnostic in &analysis.diagnostics {
        println!("{}", diagnostic);
    }

    log::info!(
        "Found {} diagnostic(s) in {}",
        analysis.diagnostics.len(),
        input_file
    );
    std::process::exit(1);
}
