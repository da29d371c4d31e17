//! Command handlers for the wasmgatt CLI

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use wasmgatt_ble::{BleConnection, BleDiscovery};
use wasmgatt_core::protocol::upload::validate_wasm_magic;
use wasmgatt_core::uuids::services_markdown;
use wasmgatt_core::{
    Bitmap, ControlClient, DataClient, DeviceInfoClient, DfuClient, GattTransport, SpriteClient,
    WasmClient,
};

use crate::cli::{Cli, Commands, ControlCommand, DataCommand, DfuSubcommand, SpriteCommand};
use crate::config::AppConfig;
use crate::dry_run;
use crate::error::{CliError, Result};
use crate::outcome::{Outcome, ScannedDevice};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command and print its outcome
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        let outcome = Self::outcome(&cli, &config).await?;
        println!("{}", outcome.render(config.cli.json)?);
        Ok(())
    }

    /// Execute a CLI command against the device, or the in-memory device on a dry run
    pub async fn outcome(cli: &Cli, config: &AppConfig) -> Result<Outcome> {
        if !cli.command.needs_device() {
            return Self::handle_local_command(&cli.command, config, cli.dry_run).await;
        }

        if cli.dry_run {
            info!("Dry run: no BLE connection will be made");
            let mock = dry_run::transport(&cli.command, config.ble.assumed_mtu);
            let result = Self::run(&cli.command, &mock, config).await;
            if config.cli.dump_writes {
                for line in dry_run::format_writes(&mock.writes()) {
                    eprintln!("{}", line);
                }
            }
            return result;
        }

        let connection = BleConnection::connect(config.ble.clone()).await?;
        let result = Self::run(&cli.command, &connection, config).await;
        if let Err(e) = connection.disconnect().await {
            warn!("Disconnect failed: {}", e);
        }
        result
    }

    async fn handle_local_command(
        command: &Commands,
        config: &AppConfig,
        dry_run: bool,
    ) -> Result<Outcome> {
        match command {
            Commands::Services => Ok(Outcome::Services {
                markdown: services_markdown(),
            }),
            Commands::Scan if dry_run => {
                info!("Dry run: skipping BLE scan");
                Ok(Outcome::Devices {
                    devices: Vec::new(),
                })
            }
            Commands::Scan => Self::handle_scan(config).await,
            other => Err(CliError::InvalidArgument(format!(
                "{:?} requires a device",
                other
            ))),
        }
    }

    async fn handle_scan(config: &AppConfig) -> Result<Outcome> {
        info!(
            "Scanning for {}s...",
            config.ble.scan_timeout.as_secs_f32()
        );
        let mut discovery = BleDiscovery::new(config.ble.clone());
        let devices = discovery
            .scan()
            .await?
            .into_iter()
            .map(|device| ScannedDevice {
                name: device.name,
                address: device.address,
                rssi: device.rssi,
            })
            .collect();
        Ok(Outcome::Devices { devices })
    }

    /// Run a device command over any transport
    pub async fn run<T: GattTransport>(
        command: &Commands,
        transport: &T,
        config: &AppConfig,
    ) -> Result<Outcome> {
        match command {
            Commands::Info => {
                let info = DeviceInfoClient::new(transport).read_all().await?;
                Ok(Outcome::Info(info))
            }
            Commands::Status => {
                let report = WasmClient::new(transport, config.protocol.clone())
                    .status()
                    .await?;
                Ok(Outcome::Status(report))
            }
            Commands::Upload {
                file,
                chunk_size,
                delay_ms,
                strict,
            } => {
                Self::handle_upload(transport, config, file, *chunk_size, *delay_ms, *strict).await
            }
            Commands::Execute { function, args } => {
                let client = WasmClient::new(transport, config.protocol.clone());
                let result = client.execute_raw(function, args).await?;
                let return_value = result.into_return_value()?;
                Ok(Outcome::Executed {
                    function: function.clone(),
                    args: args.clone(),
                    return_value,
                    execution_time_us: result.execution_time_us,
                })
            }
            Commands::Run {
                file,
                function,
                args,
            } => {
                let module = read_file(file).await?;
                let return_value = WasmClient::new(transport, config.protocol.clone())
                    .upload_and_execute(&module, function, args)
                    .await?;
                Ok(Outcome::Executed {
                    function: function.clone(),
                    args: args.clone(),
                    return_value,
                    execution_time_us: None,
                })
            }
            Commands::Reset => {
                WasmClient::new(transport, config.protocol.clone())
                    .reset()
                    .await?;
                Ok(Outcome::Reset)
            }
            Commands::Sprite(sprite) => Self::handle_sprite(transport, sprite).await,
            Commands::Control(control) => Self::handle_control(transport, control).await,
            Commands::Data(data) => Self::handle_data(transport, data).await,
            Commands::Dfu(dfu) => Self::handle_dfu(transport, config, dfu).await,
            Commands::Scan | Commands::Services => {
                Self::handle_local_command(command, config, true).await
            }
        }
    }

    async fn handle_upload<T: GattTransport>(
        transport: &T,
        config: &AppConfig,
        file: &Path,
        chunk_size: Option<usize>,
        delay_ms: Option<u64>,
        strict: bool,
    ) -> Result<Outcome> {
        let module = read_file(file).await?;
        if strict && !validate_wasm_magic(&module) {
            return Err(CliError::NotWasm {
                path: file.display().to_string(),
            });
        }

        let mut protocol = config.protocol.clone();
        if let Some(size) = chunk_size {
            protocol = protocol.with_chunk_size(size);
        }
        if let Some(ms) = delay_ms {
            protocol = protocol.with_inter_packet_delay(Duration::from_millis(ms));
        }
        let chunk_size = protocol.chunk_size;

        let report = WasmClient::new(transport, protocol).upload(&module).await?;
        Ok(Outcome::Uploaded {
            bytes: report.bytes,
            packets: report.packets,
            chunk_size,
        })
    }

    async fn handle_sprite<T: GattTransport>(
        transport: &T,
        command: &SpriteCommand,
    ) -> Result<Outcome> {
        let client = SpriteClient::new(transport);
        match command {
            SpriteCommand::Upload { id, pattern } => {
                let bitmap = Bitmap::pattern(pattern).ok_or_else(|| {
                    CliError::InvalidArgument(format!(
                        "Unknown pattern '{}': expected checkerboard, border, diagonal, empty, full or digit-0..digit-9",
                        pattern
                    ))
                })?;
                client.upload(*id, &bitmap).await?;
                Ok(Outcome::SpriteUploaded {
                    id: *id,
                    crc16: bitmap.crc(),
                })
            }
            SpriteCommand::Download { id } => {
                let bitmap = client.download(*id).await?;
                Ok(Outcome::sprite(*id, bitmap))
            }
            SpriteCommand::Verify { id } => Ok(Outcome::Verified(client.verify(*id).await?)),
            SpriteCommand::Status => Ok(Outcome::Registry(client.registry_status().await?)),
        }
    }

    async fn handle_control<T: GattTransport>(
        transport: &T,
        command: &ControlCommand,
    ) -> Result<Outcome> {
        let client = ControlClient::new(transport);
        match command {
            ControlCommand::Status => Ok(Outcome::ControlStatus(client.status().await?)),
            ControlCommand::Version => {
                let (major, minor, patch) = client.version().await?;
                Ok(Outcome::Version {
                    major,
                    minor,
                    patch,
                })
            }
            ControlCommand::Reset => {
                client.reset_device().await?;
                Ok(Outcome::ControlAcknowledged {
                    command: "RESET_DEVICE".to_string(),
                })
            }
            ControlCommand::SetConfig { value, extra } => {
                client.set_config(*value, *extra).await?;
                Ok(Outcome::ControlAcknowledged {
                    command: format!("SET_CONFIG({}, {})", value, extra),
                })
            }
        }
    }

    async fn handle_data<T: GattTransport>(
        transport: &T,
        command: &DataCommand,
    ) -> Result<Outcome> {
        let client = DataClient::new(transport);
        match command {
            DataCommand::Send { text } => {
                let echoed = client.echo(text.as_bytes()).await?;
                Ok(Outcome::Echo {
                    bytes: text.len(),
                    echoed,
                })
            }
            DataCommand::Read => Ok(Outcome::data(&client.download().await?)),
            DataCommand::MtuProbe => Ok(Outcome::Probe {
                results: client.mtu_probe().await,
            }),
            DataCommand::Status => Ok(Outcome::Transfer(client.transfer_status().await?)),
        }
    }

    async fn handle_dfu<T: GattTransport>(
        transport: &T,
        config: &AppConfig,
        command: &DfuSubcommand,
    ) -> Result<Outcome> {
        let client = DfuClient::new(transport, config.protocol.clone());
        match command {
            DfuSubcommand::Command { step, params } => {
                let params = hex::decode(params)?;
                client.send_command((*step).into(), &params).await?;
                Ok(Outcome::DfuCommandSent {
                    command: format!("{:?}", step).to_uppercase(),
                })
            }
            DfuSubcommand::Image { file } => {
                let image = read_file(file).await?;
                let packets = client.send_image(&image).await?;
                Ok(Outcome::DfuImageSent {
                    bytes: image.len(),
                    packets,
                })
            }
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    let data = tokio::fs::read(path).await?;
    info!("Read {} ({} bytes)", path.display(), data.len());
    Ok(data)
}
