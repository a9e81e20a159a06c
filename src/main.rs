// Prevents an extra console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;

use dlp_app::Cli;

#[tokio::main]
async fn main() {
    dlp_infra::logging::init();
    let cli = Cli::parse();
    let code = dlp_app::cli::run(cli).await;
    std::process::exit(code);
}
