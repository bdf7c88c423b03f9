//! Synthetic access log generator.
//!
//! Produces lines in the format the aggregator reads:
//! `<ipv4> <uid> <endpoint> <status> <execution-time-ms>`.
//! Output is fully determined by the seed.

use anyhow::{Context, Result};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UID_LEN: usize = 8;
const SUCCESS_CODES: &[u16] = &[200, 200, 200, 201, 204];
const ERROR_CODES: &[u16] = &[400, 401, 403, 404, 429, 500, 502, 503];
const SEGMENTS: &[&str] = &[
    "admin", "user", "contacts", "messages", "orders", "search", "settings", "profile", "billing",
    "reports", "files", "auth",
];

/// Generator parameters.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub lines: u64,
    pub users: usize,
    pub endpoints: usize,
    pub error_rate: f64,
    pub seed: u64,
}

impl GenerateOptions {
    fn validate(&self) -> Result<()> {
        if self.users == 0 {
            anyhow::bail!("--users must be greater than 0");
        }
        if self.endpoints == 0 {
            anyhow::bail!("--endpoints must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            anyhow::bail!("--error-rate must be within [0, 1], got {}", self.error_rate);
        }
        Ok(())
    }
}

/// Generation statistics
#[derive(Debug, Default)]
pub struct GenerateStats {
    pub lines: u64,
    pub bytes: u64,
    pub errors: u64,
}

/// Writes a synthetic log to `path`.
pub fn generate_file(path: &Path, options: &GenerateOptions) -> Result<GenerateStats> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);
    let stats = generate(&mut writer, options)?;
    writer.flush()?;
    Ok(stats)
}

/// Writes a synthetic log to `sink`.
pub fn generate<W: Write>(sink: &mut W, options: &GenerateOptions) -> Result<GenerateStats> {
    options.validate()?;
    let mut rng = StdRng::seed_from_u64(options.seed);

    let uids: Vec<String> = (0..options.users)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(UID_LEN)
                .map(char::from)
                .collect()
        })
        .collect();
    let endpoints: Vec<String> = (0..options.endpoints).map(endpoint_path).collect();

    let mut stats = GenerateStats::default();
    let mut line = String::with_capacity(64);
    for _ in 0..options.lines {
        let is_error = rng.gen_bool(options.error_rate);
        let codes = if is_error { ERROR_CODES } else { SUCCESS_CODES };
        let status = codes.choose(&mut rng).copied().unwrap_or(200);

        line.clear();
        let _ = writeln!(
            line,
            "{}.{}.{}.{} {} {} {} {}",
            rng.gen_range(1..=223u8),
            rng.gen::<u8>(),
            rng.gen::<u8>(),
            rng.gen_range(1..=254u8),
            uids[rng.gen_range(0..uids.len())],
            endpoints[rng.gen_range(0..endpoints.len())],
            status,
            rng.gen_range(1..=5000u32),
        );
        sink.write_all(line.as_bytes())?;

        stats.lines += 1;
        stats.bytes += line.len() as u64;
        if is_error {
            stats.errors += 1;
        }
    }

    Ok(stats)
}

/// Deterministic, unique path for endpoint number `i`.
fn endpoint_path(i: usize) -> String {
    let n = SEGMENTS.len();
    let first = SEGMENTS[i % n];
    match i / n {
        0 => format!("/{first}"),
        round => format!("/{first}/{}/{round}", SEGMENTS[(i / n) % n]),
    }
}
