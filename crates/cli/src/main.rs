fn main() {
    if let Err(e) = tagscope_cli::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
