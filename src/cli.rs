use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Parser, ValueEnum};
use gencert::chain::{ChainConfig, ChainShape};
use regex::Regex;
use time::Duration;

/// Generate a root CA plus server and client certificates for TLS testing.
#[derive(Debug, Parser)]
#[command(name = "generate-cert", version, about)]
pub struct Cli {
    /// Comma-separated hostnames and IPs to generate a certificate for
    #[arg(long, value_delimiter = ',')]
    pub host: Vec<String>,

    /// Duration that certificates are valid for, e.g. 8760h, 90m or 1h30m
    #[arg(long, default_value = "8760h", value_parser = parse_duration)]
    pub duration: Duration,

    /// Company to issue the certificates to
    #[arg(long, default_value = "Acme")]
    pub organization: String,

    /// Shape of the generated hierarchy
    #[arg(long, value_enum, default_value_t = Shape::Flat)]
    pub shape: Shape,

    /// Comma-separated server names, one certificate each (tiered shape only)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "server1.local,server2.local,server3.local"
    )]
    pub servers: Vec<String>,

    /// Comma-separated client names, one certificate each (tiered shape only)
    #[arg(long, value_delimiter = ',', default_value = "client1,client2,client3")]
    pub clients: Vec<String>,

    /// Directory the .pem and .key files are written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Log every signing step; applies on top of RUST_LOG
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    /// root, leaf and client
    Flat,
    /// root, server and client intermediates, and one leaf per name
    Tiered,
}

impl Cli {
    pub fn chain_config(&self) -> ChainConfig {
        let shape = match self.shape {
            Shape::Flat => ChainShape::Flat,
            Shape::Tiered => ChainShape::Tiered {
                servers: self.servers.clone(),
                clients: self.clients.clone(),
            },
        };
        ChainConfig::builder()
            .hosts(self.host.clone())
            .organization(self.organization.clone())
            .valid_for(self.duration)
            .shape(shape)
            .build()
    }
}

static DURATION_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h|d)").expect("duration pattern compiles")
});

/// Parses a Go-style duration such as `8760h`, `1h30m` or `1.5h`. `d` (24h) is accepted as an
/// extra unit. The total must fit in 64-bit nanoseconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut cursor = 0;
    let mut total_nanos: i128 = 0;
    for caps in DURATION_COMPONENT.captures_iter(input) {
        let whole = caps.get(0).ok_or("empty duration component")?;
        if whole.start() != cursor {
            break;
        }
        cursor = whole.end();

        let value: f64 = caps[1]
            .parse()
            .map_err(|e| format!("invalid number in duration {input:?}: {e}"))?;
        let unit_nanos: f64 = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3_600e9,
            _ => 86_400e9,
        };
        total_nanos += (value * unit_nanos).round() as i128;
    }

    if cursor == 0 || cursor != input.len() {
        return Err(format!(
            "invalid duration {input:?}, expected e.g. 8760h, 90m or 1h30m"
        ));
    }
    let nanos = i64::try_from(total_nanos).map_err(|_| format!("duration {input:?} is too long"))?;
    Ok(Duration::nanoseconds(nanos))
}
