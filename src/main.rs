fn main() {
    if let Err(err) = sheet_records::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
