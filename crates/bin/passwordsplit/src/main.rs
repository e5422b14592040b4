//! passwordsplit - split a password into threshold shares
//!
//! # examples
//!
//! ```bash
//! # split into 5 parts, any 3 recover (custom passwords need a license)
//! echo -n 'hunter2' | PASSWORDSPLIT_LICENSE=eyJ... passwordsplit split -t 3 -n 5 --out-dir parts/
//!
//! # reconstruct from files, or one encoded part per stdin line
//! passwordsplit reconstruct parts/*.txt
//!
//! # check a license
//! passwordsplit verify-license eyJ...
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use passwordsplit::{
    authorize_split, format_time_left, split, LicenseIssuer, LicenseKey, LicenseVerifier,
    Part, PartCollector, SplitAccess,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

mod io_util;

#[derive(Parser)]
#[command(name = "passwordsplit")]
#[command(about = "split a password into threshold shares", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a password read from stdin into parts
    Split {
        /// Parts required to reconstruct
        #[arg(short, long, default_value_t = 3)]
        threshold: u8,

        /// Total parts to create (at most 20)
        #[arg(short = 'n', long, default_value_t = 5)]
        parts: u8,

        /// Label stored in every part (at most 100 characters)
        #[arg(short, long)]
        description: Option<String>,

        /// License token, required for anything but the demo password
        #[arg(long, env = "PASSWORDSPLIT_LICENSE")]
        license: Option<String>,

        /// PEM public key for license verification (default: production key)
        #[arg(long, env = "PASSWORDSPLIT_PUBLIC_KEY_FILE")]
        public_key_file: Option<PathBuf>,

        /// Write each part to its own file instead of stdout
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Reconstruct a password from part files (or stdin, one part per line)
    Reconstruct {
        /// Files holding encoded parts
        files: Vec<PathBuf>,
    },

    /// Show the metadata of an encoded part
    Inspect {
        /// Encoded part (read from stdin if omitted)
        part: Option<String>,
    },

    /// Verify a license token
    VerifyLicense {
        /// License token
        #[arg(env = "PASSWORDSPLIT_LICENSE")]
        token: String,

        /// PEM public key (default: production key)
        #[arg(long, env = "PASSWORDSPLIT_PUBLIC_KEY_FILE")]
        public_key_file: Option<PathBuf>,
    },

    /// Issue a license token (requires the issuer private key)
    IssueLicense {
        /// PEM private key (pkcs#8 or pkcs#1)
        #[arg(long, env = "PASSWORDSPLIT_PRIVATE_KEY_FILE")]
        private_key_file: PathBuf,

        /// Validity in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

fn main() -> Result<()> {
    // logs go to stderr, stdout carries parts and secrets
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passwordsplit=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            threshold,
            parts,
            description,
            license,
            public_key_file,
            out_dir,
        } => split_command(threshold, parts, description, license, public_key_file, out_dir),
        Commands::Reconstruct { files } => reconstruct_command(files),
        Commands::Inspect { part } => inspect_command(part),
        Commands::VerifyLicense {
            token,
            public_key_file,
        } => verify_license_command(&token, public_key_file),
        Commands::IssueLicense {
            private_key_file,
            days,
        } => issue_license_command(private_key_file, days),
    }
}

fn load_verifier(public_key_file: Option<PathBuf>) -> Result<LicenseVerifier> {
    match public_key_file {
        Some(path) => {
            let pem = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read public key {}", path.display()))?;
            Ok(LicenseVerifier::from_public_key_pem(&pem)?)
        }
        None => Ok(LicenseVerifier::production()?),
    }
}

fn split_command(
    threshold: u8,
    total_parts: u8,
    description: Option<String>,
    license: Option<String>,
    public_key_file: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let secret = io_util::read_secret(io::stdin().lock()).context("failed to read password from stdin")?;

    let license: Option<LicenseKey> = match license {
        Some(token) => Some(
            load_verifier(public_key_file)?
                .verify(&token)
                .map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?,
        ),
        None => None,
    };

    let access = authorize_split(&secret, license.as_ref(), Utc::now())?;
    if access == SplitAccess::Demo {
        warn!("splitting the demo password");
    }

    let description = description.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let result = split(&secret, threshold, total_parts, description)?;
    info!(
        scheme_id = %result.parts[0].metadata.scheme_id,
        "created {} parts, {} needed to reconstruct",
        total_parts,
        threshold
    );

    match out_dir {
        Some(dir) => {
            for path in io_util::write_parts(&dir, &result.parts)? {
                println!("{}", path.display());
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            for part in &result.parts {
                writeln!(stdout, "{}", part.to_base64())?;
            }
        }
    }

    Ok(())
}

fn reconstruct_command(files: Vec<PathBuf>) -> Result<()> {
    let inputs = if files.is_empty() {
        io_util::read_lines(io::stdin().lock())?
    } else {
        io_util::read_files(&files)?
    };

    let mut collector = PartCollector::new();
    for (source, encoded) in &inputs {
        let part = collector
            .add_encoded(encoded)
            .with_context(|| format!("rejected part from {}", source))?;
        info!("added part {} of {} from {}", part.position, part.metadata.total_parts, source);
    }

    if !collector.is_ready() {
        anyhow::bail!(
            "need {} more part(s) to reconstruct",
            collector.remaining().max(1)
        );
    }

    let reconstructed = collector.reconstruct()?;
    if let Some(description) = &reconstructed.metadata.description {
        info!("reconstructed \"{}\"", description);
    }
    println!("{}", reconstructed.secret);

    Ok(())
}

fn inspect_command(part: Option<String>) -> Result<()> {
    let encoded = match part {
        Some(p) => p,
        None => io_util::read_secret(io::stdin().lock())?,
    };
    let part = Part::from_base64(&encoded).context("invalid part")?;

    println!("{}", part.title());
    println!("position: {} of {}", part.position, part.metadata.total_parts);
    println!("{}", serde_json::to_string_pretty(&part.metadata)?);

    Ok(())
}

fn verify_license_command(token: &str, public_key_file: Option<PathBuf>) -> Result<()> {
    let verifier = load_verifier(public_key_file)?;
    let now = Utc::now();

    match verifier.verify_at(token, now) {
        Ok(license) => {
            println!("VALID");
            println!("expires at: {}", license.expires_at().to_rfc3339());
            println!("License expires in: {}", format_time_left(license.time_left(now)));
            if license.expires_soon(now) {
                warn!("license expires in less than 5 minutes");
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", e.kind());
            Err(e.into())
        }
    }
}

fn issue_license_command(private_key_file: PathBuf, days: i64) -> Result<()> {
    if days <= 0 {
        anyhow::bail!("--days must be positive");
    }

    let pem = std::fs::read_to_string(&private_key_file)
        .with_context(|| format!("failed to read private key {}", private_key_file.display()))?;
    let issuer = LicenseIssuer::from_private_key_pem(&pem)?;
    let ttl = Duration::try_days(days).context("--days out of range")?;

    println!("{}", issuer.issue(ttl)?);
    Ok(())
}
