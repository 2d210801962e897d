use clap::Parser;
use std::fs::File;
use std::io;
use voltaic::output;
use voltaic::parser;

/// Circuit netlist parser and canonicalizer
#[derive(Parser)]
#[command(name = "voltaic", version)]
struct Cli {
    /// Netlist file to load
    netlist: String,

    /// Write the canonical netlist to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let input = std::fs::read_to_string(&cli.netlist).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", cli.netlist, e);
        std::process::exit(1);
    });

    let netlist = parser::parse(&input).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    tracing::info!(
        elements = netlist.elements.len(),
        max_node = netlist.max_node().unwrap_or(0),
        "netlist loaded"
    );

    let result = match cli.output {
        Some(path) => {
            let mut file = File::create(&path).unwrap_or_else(|e| {
                eprintln!("Error creating {}: {}", path, e);
                std::process::exit(1);
            });
            output::write_netlist(&netlist, &mut file)
        }
        None => output::write_netlist(&netlist, &mut io::stdout()),
    };

    result.unwrap_or_else(|e| {
        eprintln!("Output error: {}", e);
        std::process::exit(1);
    });
}
