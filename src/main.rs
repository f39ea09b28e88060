mod app;
mod audio;
mod commands;
mod config;
mod installation;
mod logging;
mod scene;
mod setup;
mod sonify;
mod spectrogram;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("Fatal error: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
