use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command line of the `dashboard` server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "dashboard")]
#[command(about = "Sales dashboard: upload a workbook, filter it, read KPIs and charts")]
#[command(version)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Directory served under /static
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 20)]
    pub max_upload_mb: usize,

    /// Idle lifetime of a browser session, in seconds
    #[arg(long, default_value_t = 24 * 60 * 60)]
    pub session_ttl_secs: u64,

    /// Width of rendered charts, in pixels
    #[arg(long, default_value_t = 800)]
    pub chart_width: u32,

    /// Height of rendered charts, in pixels
    #[arg(long, default_value_t = 450)]
    pub chart_height: u32,
}

/// Runtime settings for the HTTP dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: PathBuf::from("static"),
            max_upload_bytes: 20 * 1024 * 1024,
            session_ttl: Duration::from_secs(24 * 60 * 60),
            chart_width: 800,
            chart_height: 450,
        }
    }
}

impl DashboardConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<ServerArgs> for DashboardConfig {
    fn from(args: ServerArgs) -> Self {
        DashboardConfig {
            host: args.host,
            port: args.port,
            static_dir: args.static_dir,
            max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
            session_ttl: Duration::from_secs(args.session_ttl_secs),
            chart_width: args.chart_width,
            chart_height: args.chart_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_without_flags_match_default_config() {
        let args = ServerArgs::parse_from(["dashboard"]);
        assert_eq!(DashboardConfig::from(args), DashboardConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = ServerArgs::parse_from([
            "dashboard",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--max-upload-mb",
            "5",
            "--session-ttl-secs",
            "60",
        ]);
        let config = DashboardConfig::from(args);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.chart_width, 800);
    }
}
