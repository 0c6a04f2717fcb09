fn main() {
    if let Err(err) = vocsort::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
