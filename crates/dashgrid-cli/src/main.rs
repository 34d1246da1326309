#![forbid(unsafe_code)]

use clap::Parser;

fn main() {
    let cli = dashgrid_cli::Cli::parse();
    let json = cli.json;
    let result = dashgrid_cli::logging::init(cli.log_json).and_then(|()| dashgrid_cli::run(cli));
    if let Err(error) = result {
        if json {
            eprintln!(
                "{}",
                serde_json::json!({
                    "status": "error",
                    "error": error.to_string(),
                    "exit_code": error.exit_code(),
                })
            );
        } else {
            eprintln!("dashgrid: {error}");
        }
        std::process::exit(error.exit_code());
    }
}
