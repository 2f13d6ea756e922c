fn main() {
    if let Err(error) = trackrepo_cli::run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
