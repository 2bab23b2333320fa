fn main() {
    if let Err(error) = stocktake_cli::run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
