#[actix_web::main]
async fn main() {
    if let Err(e) = taxsorter_lib::run().await {
        eprintln!("taxsorter failed to start: {}", e);
        std::process::exit(1);
    }
}
