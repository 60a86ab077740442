//! Host session tests
//!
//! Drive the line loop over in-memory pipes, exactly as a caller would drive
//! the binary over stdin/stdout.

use cipherbox_core::{Worker, WorkerConfig};
use cipherbox_crypto::{CipherSuite, ElGamalCipher, PassphraseConfig, RsaConfig};
use cipherbox_host::{HostConfig, HostError, SessionStats, SystemEnv, line_limit, serve};
use cipherbox_proto::{CorrelationMode, PayloadLimits};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Run a fixed script through `run` and collect the output lines.
async fn script(config: HostConfig, input: &str) -> (Result<SessionStats, HostError>, Vec<String>) {
    script_bytes(config, input.as_bytes()).await
}

/// Same as `script`, for input that is not valid text.
async fn script_bytes(
    config: HostConfig,
    input: &[u8],
) -> (Result<SessionStats, HostError>, Vec<String>) {
    let mut output = Vec::new();
    let result = cipherbox_host::run(config, input, &mut output).await;
    let text = String::from_utf8(output).unwrap();
    (result, text.lines().map(str::to_string).collect())
}

fn passphrase_config() -> HostConfig {
    HostConfig {
        cipher: CipherSuite::Passphrase,
        passphrase: PassphraseConfig { pbkdf2_rounds: 1_000 },
        ..HostConfig::default()
    }
}

#[tokio::test]
async fn fixed_script_gets_one_line_per_message() {
    let input = concat!(
        "[\"decrypt\",\"corr-9\",\"anything\"]\n",
        "\n",
        "   \n",
        "[]\n",
        "not json\n",
        "[\"rotate\",7]\n",
    );

    let (result, lines) = script(HostConfig::default(), input).await;

    assert_eq!(result.unwrap(), SessionStats { messages: 4, failures: 4 });
    insta::assert_snapshot!(lines.join("\n"), @r#"
    ["corr-9",{"error":"KeyNotInitialized"}]
    ["error","MalformedRequest"]
    ["error","MalformedRequest"]
    [7,{"error":"UnsupportedOperation"}]
    "#);
}

#[tokio::test]
async fn invalid_utf8_line_does_not_end_session() {
    let input = b"[\"decrypt\",\"a\",\"\xff\xfe\"]\n[\"decrypt\",\"corr-9\",\"anything\"]\n";

    let (result, lines) = script_bytes(HostConfig::default(), input).await;

    assert_eq!(result.unwrap(), SessionStats { messages: 2, failures: 2 });
    insta::assert_snapshot!(lines.join("\n"), @r#"
    ["error","MalformedRequest"]
    ["corr-9",{"error":"KeyNotInitialized"}]
    "#);
}

#[tokio::test]
async fn overlong_line_is_discarded_and_answered() {
    let config = HostConfig {
        worker: WorkerConfig {
            correlation: CorrelationMode::MessageId,
            limits: PayloadLimits { max_plaintext_len: 8, max_ciphertext_len: 8 },
        },
        ..HostConfig::default()
    };
    let limit = line_limit(config.worker.limits);

    let mut input = b"[\"encrypt\",1,\"".to_vec();
    input.extend(std::iter::repeat_n(b'x', limit * 2));
    input.extend_from_slice(b"\",\"k\"]\n[\"decrypt\",\"corr-9\",\"anything\"]\n");

    let (result, lines) = script_bytes(config, &input).await;

    assert_eq!(result.unwrap(), SessionStats { messages: 2, failures: 2 });
    insta::assert_snapshot!(lines.join("\n"), @r#"
    ["error","PayloadTooLarge"]
    ["corr-9",{"error":"KeyNotInitialized"}]
    "#);
}

#[tokio::test]
async fn generate_keys_returns_public_blob() {
    let (result, lines) = script(HostConfig::default(), "[\"generate-keys\",\"corr-1\"]\n").await;
    assert_eq!(result.unwrap(), SessionStats { messages: 1, failures: 0 });

    let response: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(response[0], json!("corr-1"));
    let blob = response[1]["publicKey"].as_str().unwrap();
    assert!(!blob.is_empty());
}

#[tokio::test]
async fn passphrase_round_trip_over_pipes() {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (client_read, mut client_write) = tokio::io::split(client);

    let host = cipherbox_host::run(passphrase_config(), BufReader::new(server_read), server_write);

    let caller = async move {
        let mut responses = BufReader::new(client_read).lines();

        client_write
            .write_all(b"[\"encrypt\",1,\"  attack at dawn  \",\"swordfish\"]\n")
            .await
            .unwrap();
        let sealed: Value =
            serde_json::from_str(&responses.next_line().await.unwrap().unwrap()).unwrap();
        let ciphertext = sealed[1].as_str().unwrap().to_string();

        let request = json!(["decrypt", 2, ciphertext, "swordfish"]).to_string() + "\n";
        client_write.write_all(request.as_bytes()).await.unwrap();
        let opened = responses.next_line().await.unwrap().unwrap();

        client_write.shutdown().await.unwrap();
        opened
    };

    let (stats, opened) = tokio::join!(host, caller);
    assert_eq!(stats.unwrap(), SessionStats { messages: 2, failures: 0 });
    insta::assert_snapshot!(opened, @r#"[2,"attack at dawn"]"#);
}

#[tokio::test]
async fn operation_tag_mode_over_pipes() {
    let config = HostConfig {
        worker: WorkerConfig {
            correlation: CorrelationMode::OperationTag,
            limits: PayloadLimits::default(),
        },
        ..passphrase_config()
    };

    let (result, lines) = script(config, "[\"generate-keys\"]\n[\"encrypt\",\"hi\"]\n").await;
    assert_eq!(result.unwrap().failures, 2);
    insta::assert_snapshot!(lines.join("\n"), @r#"
    ["error","UnsupportedOperation"]
    ["error","MissingParameter"]
    "#);
}

#[tokio::test]
async fn invalid_configuration_stops_before_serving() {
    let config = HostConfig {
        cipher: CipherSuite::Rsa,
        rsa: RsaConfig { key_bits: 512 },
        ..HostConfig::default()
    };
    let (result, lines) = script(config, "[\"generate-keys\",1]\n").await;

    assert!(matches!(result, Err(HostError::Cipher(_))));
    assert!(lines.is_empty());

    let config = HostConfig {
        worker: WorkerConfig {
            correlation: CorrelationMode::MessageId,
            limits: PayloadLimits { max_plaintext_len: 0, max_ciphertext_len: 10 },
        },
        ..HostConfig::default()
    };
    let (result, _) = script(config, "").await;
    assert!(matches!(result, Err(HostError::Config(_))));
}

#[tokio::test]
async fn serve_stops_at_end_of_input() {
    let worker =
        Worker::new(SystemEnv::new(), ElGamalCipher::new(), WorkerConfig::default()).unwrap();
    let mut output = Vec::new();

    let stats = serve(worker, "[\"generate-keys\",1]\n".as_bytes(), &mut output).await.unwrap();

    assert_eq!(stats.messages, 1);
    assert!(String::from_utf8(output).unwrap().starts_with("[1,{\"publicKey\":"));
}
