//! Command results and their text rendering

use std::fmt;

use serde::Serialize;

use wasmgatt_core::protocol::control::ControlStatus;
use wasmgatt_core::protocol::data::TransferStatus;
use wasmgatt_core::protocol::sprite::{RegistryStatus, VerifyResponse};
use wasmgatt_core::{Bitmap, DeviceInfo, ProbeResult, WasmStatusReport};

/// A device seen during `scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
}

/// What a command produced, printed as text or JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Devices {
        devices: Vec<ScannedDevice>,
    },
    Info(DeviceInfo),
    Status(WasmStatusReport),
    Uploaded {
        bytes: usize,
        packets: usize,
        chunk_size: usize,
    },
    Executed {
        function: String,
        args: Vec<i32>,
        return_value: i32,
        execution_time_us: Option<u32>,
    },
    Reset,
    SpriteUploaded {
        id: u16,
        crc16: u16,
    },
    Sprite {
        id: u16,
        data: String,
        #[serde(skip)]
        bitmap: Bitmap,
    },
    Verified(VerifyResponse),
    Registry(RegistryStatus),
    ControlStatus(ControlStatus),
    Version {
        major: u8,
        minor: u8,
        patch: u8,
    },
    ControlAcknowledged {
        command: String,
    },
    Echo {
        bytes: usize,
        echoed: bool,
    },
    Data {
        data: String,
        text: Option<String>,
    },
    Probe {
        results: Vec<ProbeResult>,
    },
    Transfer(TransferStatus),
    DfuCommandSent {
        command: String,
    },
    DfuImageSent {
        bytes: usize,
        packets: usize,
    },
    Services {
        markdown: String,
    },
}

impl Outcome {
    pub fn sprite(id: u16, bitmap: Bitmap) -> Self {
        Outcome::Sprite {
            id,
            data: hex::encode(bitmap.as_bytes()),
            bitmap,
        }
    }

    pub fn data(bytes: &[u8]) -> Self {
        Outcome::Data {
            data: hex::encode(bytes),
            text: std::str::from_utf8(bytes).ok().map(str::to_string),
        }
    }

    /// Render for the terminal, as JSON when `json` is set
    pub fn render(&self, json: bool) -> Result<String, serde_json::Error> {
        if json {
            serde_json::to_string_pretty(self)
        } else {
            Ok(self.to_string())
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Devices { devices } if devices.is_empty() => write!(f, "No devices found"),
            Outcome::Devices { devices } => {
                writeln!(f, "{} device(s):", devices.len())?;
                for device in devices {
                    match device.rssi {
                        Some(rssi) => {
                            writeln!(f, "  {:<24} {} ({} dBm)", device.name, device.address, rssi)?
                        }
                        None => writeln!(f, "  {:<24} {}", device.name, device.address)?,
                    }
                }
                Ok(())
            }
            Outcome::Info(info) => {
                writeln!(f, "Manufacturer:      {}", info.manufacturer)?;
                writeln!(f, "Model:             {}", info.model)?;
                writeln!(f, "Firmware revision: {}", info.firmware_revision)?;
                writeln!(f, "Hardware revision: {}", info.hardware_revision)?;
                write!(f, "Software revision: {}", info.software_revision)
            }
            Outcome::Status(report) => {
                write!(
                    f,
                    "WASM {:?} (error {:?}), {}/{} bytes, uptime {}s",
                    report.status,
                    report.error_code,
                    report.bytes_received,
                    report.total_size,
                    report.uptime_secs
                )?;
                if let Some(progress) = report.progress() {
                    write!(f, " [{:.1}%]", progress)?;
                }
                Ok(())
            }
            Outcome::Uploaded {
                bytes,
                packets,
                chunk_size,
            } => write!(
                f,
                "Uploaded {} bytes in {} packet(s) of up to {} bytes",
                bytes, packets, chunk_size
            ),
            Outcome::Executed {
                function,
                args,
                return_value,
                execution_time_us,
            } => {
                let args: Vec<String> = args.iter().map(i32::to_string).collect();
                write!(f, "{}({}) = {}", function, args.join(", "), return_value)?;
                if let Some(us) = execution_time_us {
                    write!(f, " in {} us", us)?;
                }
                Ok(())
            }
            Outcome::Reset => write!(f, "WASM state reset"),
            Outcome::SpriteUploaded { id, crc16 } => {
                write!(f, "Sprite {} uploaded (crc {:#06x})", id, crc16)
            }
            Outcome::Sprite { id, bitmap, .. } => {
                writeln!(f, "Sprite {} ({} pixels set):", id, bitmap.count_set())?;
                write!(f, "{}", bitmap)
            }
            Outcome::Verified(response) => write!(
                f,
                "Sprite {}: {:?} (stored {:#06x}, calculated {:#06x})",
                response.sprite_id,
                response.status,
                response.stored_crc16,
                response.calculated_crc16
            ),
            Outcome::Registry(status) => write!(
                f,
                "Registry {:?}: {} sprite(s), {} free, last id {}, last op {:?}, {} CRC error(s)",
                status.registry_state,
                status.total_sprites,
                status.free_slots,
                status.last_sprite_id,
                status.last_operation,
                status.crc_errors
            ),
            Outcome::ControlStatus(status) => write!(
                f,
                "Device {:?}, uptime {}s",
                status.device_status, status.uptime_secs
            ),
            Outcome::Version {
                major,
                minor,
                patch,
            } => write!(f, "Firmware {}.{}.{}", major, minor, patch),
            Outcome::ControlAcknowledged { command } => write!(f, "{} acknowledged", command),
            Outcome::Echo { bytes, echoed } => {
                let verdict = if *echoed { "echoed" } else { "NOT echoed" };
                write!(f, "{} bytes {}", bytes, verdict)
            }
            Outcome::Data { data, text } => match text {
                Some(text) if !text.is_empty() => write!(f, "{}", text),
                _ => write!(f, "[{}]", data),
            },
            Outcome::Probe { results } => {
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    match &result.error {
                        Some(error) => write!(f, "{:>4} bytes: failed ({})", result.size, error)?,
                        None if result.echoed => write!(f, "{:>4} bytes: ok", result.size)?,
                        None => write!(f, "{:>4} bytes: mismatch", result.size)?,
                    }
                }
                Ok(())
            }
            Outcome::Transfer(status) => write!(
                f,
                "Transfer {:?}, {} byte(s) buffered",
                status.state, status.buffer_size
            ),
            Outcome::DfuCommandSent { command } => write!(f, "DFU {} sent", command),
            Outcome::DfuImageSent { bytes, packets } => {
                write!(f, "DFU image: {} bytes in {} packet(s)", bytes, packets)
            }
            Outcome::Services { markdown } => write!(f, "{}", markdown.trim_end()),
        }
    }
}
