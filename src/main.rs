fn main() {
    if let Err(err) = sales_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
