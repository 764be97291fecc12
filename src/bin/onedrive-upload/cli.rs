use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Upload large files to OneDrive in parallel chunks",
    long_about = None
)]
pub struct Cli {
    /// Local file to upload
    #[arg(long, required_unless_present = "show_quota")]
    pub file: Option<PathBuf>,

    /// Remote folder, relative to the remote's root folder
    #[arg(long, required_unless_present = "show_quota")]
    pub remote: Option<String>,

    /// Remote file name (defaults to the local file name)
    #[arg(long = "remote-name")]
    pub remote_name: Option<String>,

    /// Section of the credential store to use
    #[arg(long = "remote-config", default_value = "oned")]
    pub remote_config: String,

    /// rclone-style credential store
    #[arg(long, default_value = "rclone.conf")]
    pub config: PathBuf,

    /// Chunk size in bytes; 0 picks one from the file size
    #[arg(long = "chunk-size", default_value_t = 0)]
    pub chunk_size: u64,

    /// Chunks uploaded in parallel
    #[arg(long, default_value_t = 1)]
    pub parallel: usize,

    /// Attempts per chunk
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Delay between chunk attempts (e.g. 500ms, 5s, 1m30s)
    #[arg(long = "retry-delay", default_value = "5s", value_parser = parse_duration)]
    pub retry_delay: Duration,

    /// Show quota for every configured remote and exit
    #[arg(long = "show-quota")]
    pub show_quota: bool,

    /// Skip QuickXorHash verification
    #[arg(long = "skip-hash")]
    pub skip_hash: bool,

    /// Attempts to fetch the remote QuickXorHash
    #[arg(long = "hash-retries", default_value_t = 5)]
    pub hash_retries: u32,

    /// Delay between remote hash attempts
    #[arg(long = "hash-retry-delay", default_value = "10s", value_parser = parse_duration)]
    pub hash_retry_delay: Duration,

    /// HTTP(S) or SOCKS5 proxy URL
    #[arg(long)]
    pub proxy: Option<String>,

    /// Per-request HTTP timeout
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,
}

/// Parse durations such as `250ms`, `5s`, `2m` or `1h30m`; a bare number is
/// seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = input.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|e| e.to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in '{}'", input))?;
        let unit_len = rest[number_len..]
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len() - number_len);

        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid number in '{}'", input))?;
        let secs = match &rest[number_len..number_len + unit_len] {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            other => return Err(format!("unknown unit '{}' in '{}'", other, input)),
        };

        let part = Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())?;
        total = total
            .checked_add(part)
            .ok_or_else(|| format!("duration '{}' is too large", input))?;
        rest = &rest[number_len + unit_len..];
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("10"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("10000000000000000000s10000000000000000000s").is_err());
        assert!(parse_duration("1e300").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["onedrive-upload", "--file", "a.bin", "--remote", "docs"]);
        assert_eq!(cli.remote_config, "oned");
        assert_eq!(cli.parallel, 1);
        assert_eq!(cli.retries, 3);
        assert_eq!(cli.retry_delay, Duration::from_secs(5));
        assert_eq!(cli.hash_retries, 5);
        assert_eq!(cli.hash_retry_delay, Duration::from_secs(10));
        assert_eq!(cli.timeout, Duration::from_secs(10));
        assert!(!cli.show_quota);
    }

    #[test]
    fn test_file_optional_with_show_quota() {
        let cli = Cli::try_parse_from(["onedrive-upload", "--show-quota"]).unwrap();
        assert!(cli.show_quota);
        assert!(cli.file.is_none());

        assert!(Cli::try_parse_from(["onedrive-upload", "--remote", "docs"]).is_err());
    }
}
