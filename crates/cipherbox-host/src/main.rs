//! Cipherbox worker binary.
//!
//! # Usage
//!
//! ```bash
//! # ElGamal worker, message-id correlation
//! cipherbox --cipher elgamal
//!
//! # Passphrase worker for legacy tag-correlated callers
//! cipherbox --cipher passphrase --correlation operation-tag
//! ```
//!
//! Requests arrive on stdin, responses leave on stdout. Logs go to stderr.

use cipherbox_core::WorkerConfig;
use cipherbox_crypto::{DEFAULT_PBKDF2_ROUNDS, DEFAULT_RSA_BITS, PassphraseConfig, RsaConfig};
use cipherbox_host::{CipherChoice, CorrelationChoice, HostConfig};
use cipherbox_proto::{DEFAULT_MAX_CIPHERTEXT_LEN, DEFAULT_MAX_PLAINTEXT_LEN, PayloadLimits};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Isolated cryptographic worker
#[derive(Parser, Debug)]
#[command(name = "cipherbox")]
#[command(about = "Line-delimited JSON cryptographic worker")]
#[command(version)]
struct Args {
    /// Cipher backend
    #[arg(long, value_enum, default_value_t = CipherChoice::Elgamal)]
    cipher: CipherChoice,

    /// How responses are matched to requests
    #[arg(long, value_enum, default_value_t = CorrelationChoice::MessageId)]
    correlation: CorrelationChoice,

    /// Longest plaintext accepted by encrypt, in characters
    #[arg(long, default_value_t = DEFAULT_MAX_PLAINTEXT_LEN)]
    max_plaintext_len: usize,

    /// Longest ciphertext accepted by decrypt, in characters
    #[arg(long, default_value_t = DEFAULT_MAX_CIPHERTEXT_LEN)]
    max_ciphertext_len: usize,

    /// RSA modulus size in bits (1024 to 4096)
    #[arg(long, default_value_t = DEFAULT_RSA_BITS)]
    rsa_bits: usize,

    /// PBKDF2 rounds for the passphrase backend
    #[arg(long, default_value_t = DEFAULT_PBKDF2_ROUNDS)]
    pbkdf2_rounds: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            cipher: self.cipher.into(),
            worker: WorkerConfig {
                correlation: self.correlation.into(),
                limits: PayloadLimits {
                    max_plaintext_len: self.max_plaintext_len,
                    max_ciphertext_len: self.max_ciphertext_len,
                },
            },
            rsa: RsaConfig { key_bits: self.rsa_bits },
            passphrase: PassphraseConfig { pbkdf2_rounds: self.pbkdf2_rounds },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout is the protocol channel
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("cipherbox worker starting");

    let config = args.host_config();
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    cipherbox_host::run(config, stdin, stdout).await?;

    Ok(())
}
