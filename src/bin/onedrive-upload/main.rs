//! Command-line uploader.
//!
//! Usage:
//!   onedrive-upload --file video.mp4 --remote videos [--remote-config oned] [--parallel 4]
//!   onedrive-upload --show-quota

mod cli;

use std::path::Path;
use std::process;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use onedrive_uploader::upload::select_chunk_size;
use onedrive_uploader::{
    ConfigRegistry, HttpClient, IntegrityStatus, Result, TransferProgress, UploadError,
    UploadOptions, Uploader,
};
use tracing_subscriber::{fmt, EnvFilter};

use cli::Cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("onedrive_uploader=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let registry = match ConfigRegistry::load(&cli.config).await {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let http = match HttpClient::build(cli.timeout, cli.proxy.as_deref()) {
        Ok(http) => http,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if cli.show_quota {
        show_quota(&registry, &http).await;
        return;
    }

    if let Err(e) = upload(&cli, &registry, http).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn show_quota(registry: &ConfigRegistry, http: &HttpClient) {
    for name in registry.remote_names() {
        let remote = match registry.remote(name) {
            Ok(remote) => remote,
            Err(e) => {
                println!("Failed to initialize client for remote '{}': {}", name, e);
                continue;
            }
        };

        let uploader = Uploader::from_remote(&remote, http.clone(), UploadOptions::default());
        match uploader.quota().await {
            Ok(quota) => println!("Quota for remote '{}':\n{}", name, quota),
            Err(e) => println!(
                "Failed to fetch quota information for remote '{}': {}",
                name, e
            ),
        }
    }
}

async fn upload(cli: &Cli, registry: &ConfigRegistry, http: HttpClient) -> Result<()> {
    let (Some(file), Some(folder)) = (cli.file.as_deref(), cli.remote.as_deref()) else {
        return Err(UploadError::InvalidInput(
            "both --file and --remote are required".to_string(),
        ));
    };

    let remote = registry.remote(&cli.remote_config)?;
    let file_name = match &cli.remote_name {
        Some(name) => name.clone(),
        None => local_file_name(file)?,
    };
    let remote_path = remote.remote_path(folder, &file_name);
    println!("Full remote path: {}", remote_path);

    let file_size = tokio::fs::metadata(file).await?.len();
    if cli.chunk_size == 0 {
        println!(
            "Selected chunk size: {} bytes (based on file size: {} bytes)",
            select_chunk_size(file_size),
            file_size
        );
    } else {
        println!("Using user-specified chunk size: {} bytes", cli.chunk_size);
    }

    let options = UploadOptions {
        chunk_size: cli.chunk_size,
        parallelism: cli.parallel,
        max_retries: cli.retries,
        retry_delay: cli.retry_delay,
        hash_retries: cli.hash_retries,
        hash_retry_delay: cli.hash_retry_delay,
        skip_hash: cli.skip_hash,
    };
    let mut uploader = Uploader::from_remote(&remote, http, options);

    let cancel = uploader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, waiting for chunks in flight...");
            cancel.cancel();
        }
    });

    let progress_bar = ProgressBar::new(file_size.max(1));
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress_bar.set_message(file_name.clone());
    let progress_bar_for_cb = progress_bar.clone();
    uploader.watch_status(Box::new(move |progress: &TransferProgress| {
        progress_bar_for_cb.set_position(progress.done.min(progress.total));
        progress_bar_for_cb.set_message(format!(
            "{} ({}/{} chunks)",
            progress.filename, progress.chunks_done, progress.chunks_total
        ));
        true // Continue upload
    }));

    let report = match uploader.upload(file, &remote_path).await {
        Ok(report) => {
            progress_bar.finish_with_message(format!("{} complete", file_name));
            report
        }
        Err(e) => {
            progress_bar.abandon();
            return Err(e);
        }
    };

    let result = &report.result;
    println!("File uploaded successfully.");
    println!("File ID: {}", result.item_id);
    if result.name != file_name {
        println!("Stored as: {} (renamed on conflict)", result.name);
    }
    if let Some(url) = remote.download_url(folder, &result.name) {
        println!("Download URL: {}", url);
    }

    match &report.integrity {
        IntegrityStatus::Mismatch { .. } => eprintln!("Warning: {}", report.integrity),
        status => println!("{}", status),
    }

    Ok(())
}

fn local_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            UploadError::InvalidInput(format!("{} has no file name", path.display()))
        })
}
