//! Arbor replay CLI.

use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut log_tree = false;
    let mut script_path = None;
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--log-tree" => log_tree = true,
            "-h" | "--help" => {
                print_usage();
                return;
            }
            _ if arg.starts_with('-') => {
                eprintln!("error: unknown option `{arg}`");
                print_usage();
                std::process::exit(1);
            }
            _ if script_path.is_none() => script_path = Some(arg.as_str()),
            _ => {
                eprintln!("error: unexpected argument `{arg}`");
                std::process::exit(1);
            }
        }
    }

    let Some(path) = script_path else {
        print_usage();
        std::process::exit(1);
    };

    arbor_replay::init_tracing(log_tree);

    match arbor_replay::load(Path::new(path)).and_then(|script| arbor_replay::replay(&script)) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: arbor-replay <script> [--log-tree]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --log-tree    Nest log output by span (requires RUST_LOG)");
}
