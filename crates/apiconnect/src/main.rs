#[tokio::main]
async fn main() {
    let code = apiconnect_cli::run_cli_async(std::env::args().collect()).await;
    std::process::exit(code);
}
