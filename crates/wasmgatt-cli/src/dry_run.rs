//! In-memory device for `--dry-run`
//!
//! Every read a command performs is answered with a plausible idle-device
//! value so the full write sequence can be inspected without hardware.

use wasmgatt_core::protocol::control::{
    ControlCommand as ControlPacket, ControlResponse, ControlResponseStatus, ControlStatus,
    DeviceStatus,
};
use wasmgatt_core::protocol::data::{TransferState, TransferStatus};
use wasmgatt_core::protocol::sprite::{
    RegistryState, RegistryStatus, SpriteDownloadResponse, SpriteOperation, SpriteStatus,
    VerifyResponse, VerifyStatus,
};
use wasmgatt_core::uuids::{self, characteristic_name};
use wasmgatt_core::{
    Bitmap, ExecuteResult, MockTransport, RecordedWrite, WasmErrorCode, WasmStatus,
    WasmStatusReport,
};

use crate::cli::{Commands, ControlCommand, SpriteCommand};

/// Sprite slots the simulated registry reports
const DRY_RUN_REGISTRY_SLOTS: u16 = 64;

/// Build a mock device scripted for `command`
pub fn transport(command: &Commands, mtu: u16) -> MockTransport {
    let mock = MockTransport::with_mtu(mtu);
    script_idle_device(&mock);

    match command {
        Commands::Sprite(SpriteCommand::Download { id }) => {
            let bitmap = Bitmap::checkerboard();
            let response = SpriteDownloadResponse {
                sprite_id: *id,
                bitmap,
                crc16: bitmap.crc(),
                status: SpriteStatus::Success,
            };
            mock.set_value(uuids::sprite::DOWNLOAD_RESPONSE, response.to_bytes().to_vec());
        }
        Commands::Sprite(SpriteCommand::Verify { id }) => {
            let crc = Bitmap::checkerboard().crc();
            let response = VerifyResponse {
                sprite_id: *id,
                stored_crc16: crc,
                calculated_crc16: crc,
                status: VerifyStatus::Valid,
            };
            mock.set_value(uuids::sprite::VERIFY_RESPONSE, response.to_bytes().to_vec());
        }
        Commands::Control(control) => {
            let packet = match control {
                ControlCommand::Version => ControlPacket::get_version(),
                ControlCommand::Reset => ControlPacket::reset_device(),
                ControlCommand::SetConfig { value, extra } => ControlPacket::set_config(*value, *extra),
                ControlCommand::Status => ControlPacket::get_status(),
            };
            let response = ControlResponse {
                cmd_id: packet.cmd_id,
                status: ControlResponseStatus::Success,
                result: [env_version(0), env_version(1), env_version(2), 0, 0, 0],
            };
            mock.set_value(uuids::control::RESPONSE, response.to_bytes().to_vec());
        }
        _ => {}
    }

    mock
}

fn script_idle_device(mock: &MockTransport) {
    mock.set_value(uuids::device_info::MANUFACTURER_NAME, b"wasmgatt".to_vec());
    mock.set_value(uuids::device_info::MODEL_NUMBER, b"dry-run".to_vec());
    mock.set_value(
        uuids::device_info::FIRMWARE_REVISION,
        env!("CARGO_PKG_VERSION").as_bytes().to_vec(),
    );
    mock.set_value(uuids::device_info::HARDWARE_REVISION, b"none".to_vec());
    mock.set_value(uuids::device_info::SOFTWARE_REVISION, b"none".to_vec());

    let status = WasmStatusReport {
        status: WasmStatus::Idle,
        error_code: WasmErrorCode::None,
        bytes_received: 0,
        total_size: 0,
        uptime_secs: 0,
    };
    mock.set_value(uuids::wasm::STATUS, status.to_bytes().to_vec());

    let result = ExecuteResult {
        status: WasmStatus::Complete,
        error_code: WasmErrorCode::None,
        return_value: 0,
        execution_time_us: Some(0),
    };
    mock.set_value(uuids::wasm::RESULT, result.encode());

    let control = ControlStatus {
        device_status: DeviceStatus::Idle,
        uptime_secs: 0,
    };
    mock.set_value(uuids::control::STATUS, control.to_bytes().to_vec());

    let registry = RegistryStatus {
        total_sprites: 0,
        free_slots: DRY_RUN_REGISTRY_SLOTS,
        last_sprite_id: 0,
        registry_state: RegistryState::Ready,
        last_operation: SpriteOperation::None,
        crc_errors: 0,
    };
    mock.set_value(uuids::sprite::REGISTRY_STATUS, registry.to_bytes().to_vec());

    mock.echo(uuids::data::UPLOAD, uuids::data::DOWNLOAD);
    mock.set_value(uuids::data::DOWNLOAD, Vec::new());
    let transfer = TransferStatus {
        state: TransferState::Idle,
        buffer_size: 0,
    };
    mock.set_value(uuids::data::TRANSFER_STATUS, transfer.to_bytes().to_vec());
}

/// Version component `index` of this binary, reported as the simulated firmware version
fn env_version(index: usize) -> u8 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .nth(index)
        .and_then(|part| part.parse().ok())
        .unwrap_or(0)
}

/// One line per recorded write: characteristic, write type and payload
pub fn format_writes(writes: &[RecordedWrite]) -> Vec<String> {
    writes
        .iter()
        .enumerate()
        .map(|(i, write)| {
            let name = characteristic_name(&write.characteristic)
                .map(str::to_string)
                .unwrap_or_else(|| write.characteristic.to_string());
            format!(
                "#{:<3} {} {:?} ({} bytes) {}",
                i,
                name,
                write.mode,
                write.data.len(),
                hex::encode(&write.data)
            )
        })
        .collect()
}
