//! End-to-end command tests against the in-memory device

use std::path::PathBuf;

use clap::Parser;
use wasmgatt_cli::cli::{ControlCommand, DataCommand, SpriteCommand};
use wasmgatt_cli::{AppConfig, Cli, CliError, CommandDispatcher, Commands, Outcome};
use wasmgatt_core::protocol::data::{TransferState, TransferStatus};
use wasmgatt_core::protocol::upload::WASM_MAGIC;
use wasmgatt_core::uuids::wasm;
use wasmgatt_core::{
    Bitmap, EncodingError, ExecuteResult, MockTransport, ProtocolConfig, WasmErrorCode,
    WasmGattError, WasmStatus,
};

fn immediate_config() -> AppConfig {
    AppConfig {
        protocol: ProtocolConfig::immediate(),
        ..AppConfig::default()
    }
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("wasmgatt").chain(args.iter().copied())).unwrap()
}

fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("wasmgatt-cli-{}-{}", name, std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn wasm_module(len: usize) -> Vec<u8> {
    let mut module = WASM_MAGIC.to_vec();
    module.extend((0..len - WASM_MAGIC.len()).map(|i| i as u8));
    module
}

// ----------------------------------------------------------------------------
// Argument Parsing
// ----------------------------------------------------------------------------

#[test]
fn test_parse_execute_with_negative_args() {
    let cli = parse(&["execute", "add", "5", "-7"]);
    match cli.command {
        Commands::Execute { function, args } => {
            assert_eq!(function, "add");
            assert_eq!(args, vec![5, -7]);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = parse(&["status", "--dry-run", "--json", "--device", "BenchBoard"]);
    assert!(cli.dry_run);
    assert!(cli.json);
    assert_eq!(cli.device.as_deref(), Some("BenchBoard"));
    assert!(matches!(cli.command, Commands::Status));
}

#[test]
fn test_parse_nested_subcommands() {
    let cli = parse(&["sprite", "upload", "7", "digit-3"]);
    assert!(matches!(
        cli.command,
        Commands::Sprite(SpriteCommand::Upload { id: 7, ref pattern }) if pattern == "digit-3"
    ));

    let cli = parse(&["control", "set-config", "9"]);
    assert!(matches!(
        cli.command,
        Commands::Control(ControlCommand::SetConfig { value: 9, extra: 0 })
    ));

    let cli = parse(&["data", "mtu-probe"]);
    assert!(matches!(cli.command, Commands::Data(DataCommand::MtuProbe)));
}

#[test]
fn test_parse_rejects_out_of_range_sprite_id() {
    assert!(Cli::try_parse_from(["wasmgatt", "sprite", "download", "70000"]).is_err());
}

// ----------------------------------------------------------------------------
// Dry Runs
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_dry_run_upload() {
    let path = temp_file("upload.wasm", &wasm_module(512));
    let cli = parse(&["upload", path.to_str().unwrap(), "--dry-run", "--strict"]);

    let outcome = CommandDispatcher::outcome(&cli, &immediate_config()).await;
    std::fs::remove_file(&path).ok();

    assert_eq!(
        outcome.unwrap(),
        Outcome::Uploaded {
            bytes: 512,
            packets: 3,
            chunk_size: 236
        }
    );
}

#[tokio::test]
async fn test_dry_run_upload_chunk_too_large_for_mtu() {
    let path = temp_file("big-chunk.wasm", &wasm_module(300));
    let cli = parse(&[
        "upload",
        path.to_str().unwrap(),
        "--dry-run",
        "--chunk-size",
        "244",
    ]);

    let outcome = CommandDispatcher::outcome(&cli, &immediate_config()).await;
    std::fs::remove_file(&path).ok();

    assert!(matches!(
        outcome,
        Err(CliError::Device(WasmGattError::Encoding(
            EncodingError::ChunkTooLarge { packet: 252, max: 244 }
        )))
    ));
}

#[tokio::test]
async fn test_strict_upload_rejects_non_wasm() {
    let path = temp_file("not-wasm.bin", b"hello world");
    let cli = parse(&["upload", path.to_str().unwrap(), "--dry-run", "--strict"]);

    let outcome = CommandDispatcher::outcome(&cli, &immediate_config()).await;
    std::fs::remove_file(&path).ok();

    assert!(matches!(outcome, Err(CliError::NotWasm { .. })));
}

#[tokio::test]
async fn test_dry_run_execute() {
    let cli = parse(&["execute", "add", "5", "7", "--dry-run"]);
    let outcome = CommandDispatcher::outcome(&cli, &immediate_config())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Executed {
            function: "add".to_string(),
            args: vec![5, 7],
            return_value: 0,
            execution_time_us: Some(0)
        }
    );
}

#[tokio::test]
async fn test_dry_run_run() {
    let path = temp_file("run.wasm", &wasm_module(64));
    let cli = parse(&["run", path.to_str().unwrap(), "main", "--dry-run"]);

    let outcome = CommandDispatcher::outcome(&cli, &immediate_config()).await;
    std::fs::remove_file(&path).ok();

    assert!(matches!(
        outcome,
        Ok(Outcome::Executed { return_value: 0, .. })
    ));
}

#[tokio::test]
async fn test_dry_run_sprite_download() {
    let cli = parse(&["sprite", "download", "12", "--dry-run"]);
    let outcome = CommandDispatcher::outcome(&cli, &immediate_config())
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::sprite(12, Bitmap::checkerboard()));
}

#[tokio::test]
async fn test_dry_run_sprite_upload_unknown_pattern() {
    let cli = parse(&["sprite", "upload", "1", "smiley", "--dry-run"]);
    let outcome = CommandDispatcher::outcome(&cli, &immediate_config()).await;
    assert!(matches!(outcome, Err(CliError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_dry_run_control_and_data() {
    let config = immediate_config();

    let version = CommandDispatcher::outcome(&parse(&["control", "version", "--dry-run"]), &config)
        .await
        .unwrap();
    assert!(matches!(version, Outcome::Version { .. }));

    let echo = CommandDispatcher::outcome(&parse(&["data", "send", "hello", "--dry-run"]), &config)
        .await
        .unwrap();
    assert_eq!(
        echo,
        Outcome::Echo {
            bytes: 5,
            echoed: true
        }
    );

    let probe = CommandDispatcher::outcome(&parse(&["data", "mtu-probe", "--dry-run"]), &config)
        .await
        .unwrap();
    match probe {
        Outcome::Probe { results } => {
            let sizes: Vec<usize> = results.iter().map(|r| r.size).collect();
            assert_eq!(sizes, vec![20, 47, 244]);
            assert!(results.iter().all(|r| r.echoed));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let status = CommandDispatcher::outcome(&parse(&["data", "status", "--dry-run"]), &config)
        .await
        .unwrap();
    assert_eq!(
        status,
        Outcome::Transfer(TransferStatus {
            state: TransferState::Idle,
            buffer_size: 0
        })
    );
}

#[tokio::test]
async fn test_dry_run_dfu_command_rejects_long_params() {
    let params = "00".repeat(20);
    let cli = parse(&["dfu", "command", "start", &params, "--dry-run"]);
    let outcome = CommandDispatcher::outcome(&cli, &immediate_config()).await;
    assert!(matches!(
        outcome,
        Err(CliError::Device(WasmGattError::Encoding(
            EncodingError::PayloadTooLarge { len: 20, max: 19 }
        )))
    ));
}

#[tokio::test]
async fn test_services_needs_no_device() {
    let cli = parse(&["services"]);
    let outcome = CommandDispatcher::outcome(&cli, &AppConfig::default())
        .await
        .unwrap();
    match outcome {
        Outcome::Services { markdown } => {
            assert!(markdown.contains(&wasm::SERVICE.to_string()));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

// ----------------------------------------------------------------------------
// Scripted Transport
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_run_reports_remote_execution_error() {
    let mock = MockTransport::new();
    mock.set_value(
        wasm::RESULT,
        ExecuteResult {
            status: WasmStatus::Error,
            error_code: WasmErrorCode::FunctionNotFound,
            return_value: 0,
            execution_time_us: None,
        }
        .encode(),
    );

    let command = Commands::Execute {
        function: "missing".to_string(),
        args: vec![],
    };
    let outcome = CommandDispatcher::run(&command, &mock, &immediate_config()).await;
    assert!(matches!(
        outcome,
        Err(CliError::Device(WasmGattError::Remote(_)))
    ));
    assert_eq!(mock.writes_to(wasm::EXECUTE).len(), 1);
}
