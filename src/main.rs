fn main() {
    if let Err(err) = csv_schema_rename::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
