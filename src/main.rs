fn main() {
    if let Err(err) = repo_prune::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
