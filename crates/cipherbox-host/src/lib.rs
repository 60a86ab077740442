//! Cipherbox worker host.
//!
//! Production glue around [`cipherbox_core`]'s action-based worker: reads one
//! JSON message per line, feeds it to the [`Worker`], writes each response as
//! one line, and turns log actions into `tracing` events.
//!
//! # Components
//!
//! - [`serve`]: the duplex loop, generic over reader, writer and cipher
//! - [`run`]: builds the worker selected by a [`HostConfig`] and serves it
//! - [`SystemEnv`]: production environment (real time, OS RNG)
//!
//! The loop is strictly sequential: each response is written and flushed
//! before the next line is read. At end of input the worker is shut down,
//! which wipes any resident key.
//!
//! Lines are read as bytes and capped at [`line_limit`]. A line over the cap
//! is discarded up to its newline and answered with `PayloadTooLarge`; a line
//! that is not UTF-8 is answered with `MalformedRequest`. Neither ends the
//! session.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod system_env;

use std::io;

use cipherbox_core::{Environment, LogLevel, Worker, WorkerAction, WorkerEvent};
use cipherbox_crypto::{Cipher, CipherSuite, ElGamalCipher, PassphraseCipher, RsaCipher};
use cipherbox_proto::PayloadLimits;
pub use config::{CipherChoice, CorrelationChoice, HostConfig};
pub use error::HostError;
pub use system_env::SystemEnv;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bytes allowed on a line beyond the payload itself: brackets, the operation
/// tag, the correlation id and the auxiliary key.
pub const LINE_OVERHEAD: usize = 64 * 1024;

/// Worst-case UTF-8 plus JSON escaping cost of one character (`\uXXXX`).
const MAX_ENCODED_CHAR_LEN: usize = 6;

/// Longest line the host will buffer for a worker with `limits`.
///
/// Any line that fits the payload bounds once decoded fits under this.
pub fn line_limit(limits: PayloadLimits) -> usize {
    limits
        .max_plaintext_len
        .max(limits.max_ciphertext_len)
        .saturating_mul(MAX_ENCODED_CHAR_LEN)
        .saturating_add(LINE_OVERHEAD)
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Non-blank lines handled.
    pub messages: u64,
    /// Responses that carried an error.
    pub failures: u64,
}

/// Build the worker described by `config` and serve it until end of input.
pub async fn run<R, W>(config: HostConfig, reader: R, writer: W) -> Result<SessionStats, HostError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let env = SystemEnv::new();
    match config.cipher {
        CipherSuite::Passphrase => {
            let cipher = PassphraseCipher::new(config.passphrase)?;
            serve(Worker::new(env, cipher, config.worker)?, reader, writer).await
        },
        CipherSuite::Rsa => {
            let cipher = RsaCipher::new(config.rsa)?;
            serve(Worker::new(env, cipher, config.worker)?, reader, writer).await
        },
        CipherSuite::ElGamal => {
            serve(Worker::new(env, ElGamalCipher::new(), config.worker)?, reader, writer).await
        },
    }
}

/// Serve `worker` over a line channel until end of input.
///
/// Blank lines are skipped. The worker is shut down on the way out whether
/// the channel closed cleanly or failed.
pub async fn serve<E, C, R, W>(
    mut worker: Worker<E, C>,
    reader: R,
    mut writer: W,
) -> Result<SessionStats, HostError>
where
    E: Environment,
    C: Cipher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(
        cipher = %worker.cipher().suite(),
        correlation = ?worker.config().correlation,
        "worker ready"
    );

    let mut stats = SessionStats::default();
    let outcome = pump(&mut worker, reader, &mut writer, &mut stats).await;

    for action in worker.shutdown() {
        log_action(action);
    }

    match &outcome {
        Ok(()) => tracing::info!(
            messages = stats.messages,
            failures = stats.failures,
            "input closed, worker stopped"
        ),
        Err(e) => tracing::error!("session aborted: {e}"),
    }

    outcome.map(|()| stats)
}

async fn pump<E, C, R, W>(
    worker: &mut Worker<E, C>,
    mut reader: R,
    writer: &mut W,
    stats: &mut SessionStats,
) -> Result<(), HostError>
where
    E: Environment,
    C: Cipher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limit = line_limit(worker.config().limits);

    while let Some(line) = read_line(&mut reader, limit).await? {
        let event = match line {
            RawLine::Complete(bytes) => {
                if std::str::from_utf8(&bytes).is_ok_and(|text| text.trim().is_empty()) {
                    continue;
                }
                WorkerEvent::Bytes(bytes)
            },
            RawLine::Oversized => WorkerEvent::Oversized { limit },
        };
        stats.messages += 1;

        for action in worker.handle(event) {
            let WorkerAction::Respond(response) = action else {
                log_action(action);
                continue;
            };

            if !response.is_success() {
                stats.failures += 1;
            }

            let mut encoded = response.to_json();
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

/// One line off the channel.
#[derive(Debug, PartialEq, Eq)]
enum RawLine {
    /// Line content without its terminator.
    Complete(Vec<u8>),
    /// The line ran past the limit and was discarded.
    Oversized,
}

/// Read one line of at most `limit` bytes. Returns `None` at end of input.
async fn read_line<R>(reader: &mut R, limit: usize) -> io::Result<Option<RawLine>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let read = (&mut *reader).take(cap).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        return Ok(Some(RawLine::Complete(buf)));
    }

    if buf.len() > limit {
        discard_line(reader).await?;
        return Ok(Some(RawLine::Oversized));
    }

    // Final line without a terminator
    Ok(Some(RawLine::Complete(buf)))
}

/// Skip everything up to and including the next newline.
async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        if let Some(end) = available.iter().position(|&byte| byte == b'\n') {
            reader.consume(end + 1);
            return Ok(());
        }
        let len = available.len();
        reader.consume(len);
    }
}

fn log_action(action: WorkerAction) {
    if let WorkerAction::Log { level, message } = action {
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}
