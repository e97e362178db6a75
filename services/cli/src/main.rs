use selection_dw_cli::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("selection-dw error: {err}");
        std::process::exit(1);
    }
}
