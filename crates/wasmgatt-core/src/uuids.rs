//! GATT service and characteristic UUIDs exposed by the firmware
//!
//! Every UUID the client touches is defined here once. 16-bit assigned numbers
//! are expanded onto the Bluetooth base UUID.

use uuid::Uuid;

/// Expand a 16-bit assigned number onto the Bluetooth base UUID
/// (`0000xxxx-0000-1000-8000-00805f9b34fb`)
pub const fn uuid_from_u16(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_0080_5F9B_34FB)
}

/// Advertised name of the reference board
pub const DEFAULT_DEVICE_NAME: &str = "Dan5340BLE";

// ----------------------------------------------------------------------------
// Device Information Service (standard)
// ----------------------------------------------------------------------------

pub mod device_info {
    use super::*;

    pub const SERVICE: Uuid = uuid_from_u16(0x180A);
    pub const MANUFACTURER_NAME: Uuid = uuid_from_u16(0x2A29);
    pub const MODEL_NUMBER: Uuid = uuid_from_u16(0x2A24);
    pub const FIRMWARE_REVISION: Uuid = uuid_from_u16(0x2A26);
    pub const HARDWARE_REVISION: Uuid = uuid_from_u16(0x2A27);
    pub const SOFTWARE_REVISION: Uuid = uuid_from_u16(0x2A28);
}

// ----------------------------------------------------------------------------
// Control Service
// ----------------------------------------------------------------------------

pub mod control {
    use super::*;

    pub const SERVICE: Uuid = uuid_from_u16(0xFFE0);
    pub const COMMAND: Uuid = uuid_from_u16(0xFFE1);
    pub const RESPONSE: Uuid = uuid_from_u16(0xFFE2);
    pub const STATUS: Uuid = uuid_from_u16(0xFFE3);
}

// ----------------------------------------------------------------------------
// Data Service
// ----------------------------------------------------------------------------

pub mod data {
    use super::*;

    pub const SERVICE: Uuid = Uuid::from_u128(0x87654321_4321_8765_4321_87654321ABCD);
    pub const UPLOAD: Uuid = Uuid::from_u128(0x87654321_4321_8765_4321_87654321ACD0);
    pub const DOWNLOAD: Uuid = Uuid::from_u128(0x87654321_4321_8765_4321_87654321ACD1);
    pub const TRANSFER_STATUS: Uuid = Uuid::from_u128(0x87654321_4321_8765_4321_87654321ACD2);
}

// ----------------------------------------------------------------------------
// DFU Service
// ----------------------------------------------------------------------------

pub mod dfu {
    use super::*;

    pub const SERVICE: Uuid = uuid_from_u16(0xFE59);
    pub const CONTROL_POINT: Uuid = uuid_from_u16(0xFFD0);
    pub const PACKET: Uuid = uuid_from_u16(0xFFD1);
}

// ----------------------------------------------------------------------------
// Sprite Registry Service
// ----------------------------------------------------------------------------

pub mod sprite {
    use super::*;

    pub const SERVICE: Uuid = uuid_from_u16(0xFFF8);
    pub const UPLOAD: Uuid = uuid_from_u16(0xFFF9);
    pub const DOWNLOAD_REQUEST: Uuid = uuid_from_u16(0xFFFA);
    pub const DOWNLOAD_RESPONSE: Uuid = uuid_from_u16(0xFFFB);
    pub const REGISTRY_STATUS: Uuid = uuid_from_u16(0xFFFC);
    pub const VERIFY_REQUEST: Uuid = uuid_from_u16(0xFFFD);
    pub const VERIFY_RESPONSE: Uuid = uuid_from_u16(0xFFFE);
}

// ----------------------------------------------------------------------------
// WASM Service
// ----------------------------------------------------------------------------

pub mod wasm {
    use super::*;

    pub const SERVICE: Uuid = Uuid::from_u128(0x12345678_1234_5678_9ABC_DEF012345006);
    pub const UPLOAD: Uuid = Uuid::from_u128(0x12345678_1234_5678_9ABC_DEF012345016);
    pub const EXECUTE: Uuid = Uuid::from_u128(0x12345678_1234_5678_9ABC_DEF012345026);
    pub const STATUS: Uuid = Uuid::from_u128(0x12345678_1234_5678_9ABC_DEF012345036);
    pub const RESULT: Uuid = Uuid::from_u128(0x12345678_1234_5678_9ABC_DEF012345046);
}

// ----------------------------------------------------------------------------
// Service Table
// ----------------------------------------------------------------------------

/// GATT property set of a characteristic as the firmware declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub write_without_response: bool,
    pub notify: bool,
}

impl Properties {
    const R: Self = Self { read: true, write: false, write_without_response: false, notify: false };
    const RN: Self = Self { read: true, write: false, write_without_response: false, notify: true };
    const W: Self = Self { read: false, write: true, write_without_response: false, notify: false };
    const WWR: Self = Self { read: false, write: true, write_without_response: true, notify: false };

    /// Render as `READ | WRITE | ...`
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.read {
            parts.push("READ");
        }
        if self.write {
            parts.push("WRITE");
        }
        if self.write_without_response {
            parts.push("WRITE_WITHOUT_RESP");
        }
        if self.notify {
            parts.push("NOTIFY");
        }
        parts.join(" | ")
    }
}

/// A characteristic in the service table
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicInfo {
    pub name: &'static str,
    pub uuid: Uuid,
    pub properties: Properties,
    /// Wire layout written to or read from this characteristic
    pub packet: &'static str,
}

/// A service in the service table
#[derive(Debug, Clone, Copy)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub uuid: Uuid,
    pub characteristics: &'static [CharacteristicInfo],
}

const fn chr(
    name: &'static str,
    uuid: Uuid,
    properties: Properties,
    packet: &'static str,
) -> CharacteristicInfo {
    CharacteristicInfo { name, uuid, properties, packet }
}

/// Every service exposed by the firmware, in advertisement order
pub const SERVICES: &[ServiceInfo] = &[
    ServiceInfo {
        name: "Device Information",
        uuid: device_info::SERVICE,
        characteristics: &[
            chr("Manufacturer Name", device_info::MANUFACTURER_NAME, Properties::R, "UTF-8 string"),
            chr("Model Number", device_info::MODEL_NUMBER, Properties::R, "UTF-8 string"),
            chr("Firmware Revision", device_info::FIRMWARE_REVISION, Properties::R, "UTF-8 string"),
            chr("Hardware Revision", device_info::HARDWARE_REVISION, Properties::R, "UTF-8 string"),
            chr("Software Revision", device_info::SOFTWARE_REVISION, Properties::R, "UTF-8 string"),
        ],
    },
    ServiceInfo {
        name: "Control",
        uuid: control::SERVICE,
        characteristics: &[
            chr("Command", control::COMMAND, Properties::W, "ControlCommand (20 bytes)"),
            chr("Response", control::RESPONSE, Properties::RN, "ControlResponse (8 bytes)"),
            chr("Status", control::STATUS, Properties::RN, "ControlStatus (8 bytes)"),
        ],
    },
    ServiceInfo {
        name: "Data",
        uuid: data::SERVICE,
        characteristics: &[
            chr("Upload", data::UPLOAD, Properties::WWR, "raw bytes (1..=244)"),
            chr("Download", data::DOWNLOAD, Properties::RN, "raw bytes"),
            chr("Transfer Status", data::TRANSFER_STATUS, Properties::RN, "TransferStatus (3+ bytes)"),
        ],
    },
    ServiceInfo {
        name: "DFU",
        uuid: dfu::SERVICE,
        characteristics: &[
            chr("Control Point", dfu::CONTROL_POINT, Properties::W, "DfuControlPacket (20 bytes)"),
            chr("Packet", dfu::PACKET, Properties::WWR, "firmware chunk (<=20 bytes)"),
        ],
    },
    ServiceInfo {
        name: "Sprite Registry",
        uuid: sprite::SERVICE,
        characteristics: &[
            chr("Upload", sprite::UPLOAD, Properties::W, "SpriteUploadPacket (36 bytes)"),
            chr("Download Request", sprite::DOWNLOAD_REQUEST, Properties::W, "SpriteRequest (2 bytes)"),
            chr("Download Response", sprite::DOWNLOAD_RESPONSE, Properties::RN, "SpriteDownloadResponse (37 bytes)"),
            chr("Registry Status", sprite::REGISTRY_STATUS, Properties::RN, "RegistryStatus (12 bytes)"),
            chr("Verify Request", sprite::VERIFY_REQUEST, Properties::W, "SpriteRequest (2 bytes)"),
            chr("Verify Response", sprite::VERIFY_RESPONSE, Properties::RN, "VerifyResponse (8 bytes)"),
        ],
    },
    ServiceInfo {
        name: "WASM",
        uuid: wasm::SERVICE,
        characteristics: &[
            chr("Upload", wasm::UPLOAD, Properties::WWR, "UploadHeader (8 bytes) + chunk"),
            chr("Execute", wasm::EXECUTE, Properties::W, "ExecuteRequest (52 bytes)"),
            chr("Status", wasm::STATUS, Properties::RN, "WasmStatusReport (18 bytes)"),
            chr("Result", wasm::RESULT, Properties::RN, "ExecuteResult (6+ bytes)"),
        ],
    },
];

/// Look up a characteristic's human-readable name for log output
pub fn characteristic_name(uuid: &Uuid) -> Option<&'static str> {
    SERVICES
        .iter()
        .flat_map(|service| service.characteristics.iter())
        .find(|c| c.uuid == *uuid)
        .map(|c| c.name)
}

/// Render the service table as Markdown
pub fn services_markdown() -> String {
    let mut out = String::from("# GATT Services\n");
    for service in SERVICES {
        out.push_str(&format!("\n## {} (`{}`)\n\n", service.name, service.uuid));
        out.push_str("| Characteristic | UUID | Properties | Payload |\n");
        out.push_str("|---|---|---|---|\n");
        for c in service.characteristics {
            out.push_str(&format!(
                "| {} | `{}` | {} | {} |\n",
                c.name,
                c.uuid,
                c.properties.describe(),
                c.packet
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_short_uuid_expansion() {
        assert_eq!(
            uuid_from_u16(0x180A).to_string(),
            "0000180a-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            sprite::UPLOAD.to_string(),
            "0000fff9-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_wasm_uuids_match_firmware() {
        assert_eq!(
            wasm::UPLOAD.to_string(),
            "12345678-1234-5678-9abc-def012345016"
        );
        assert_eq!(
            wasm::RESULT.to_string(),
            "12345678-1234-5678-9abc-def012345046"
        );
    }

    #[test]
    fn test_characteristic_uuids_are_unique() {
        let mut seen = HashSet::new();
        for service in SERVICES {
            assert!(seen.insert(service.uuid), "duplicate {}", service.name);
            for c in service.characteristics {
                assert!(seen.insert(c.uuid), "duplicate {}", c.name);
            }
        }
    }

    #[test]
    fn test_services_markdown() {
        let doc = services_markdown();
        assert!(doc.contains("## WASM (`12345678-1234-5678-9abc-def012345006`)"));
        assert!(doc.contains("| Execute | `12345678-1234-5678-9abc-def012345026` | WRITE |"));
        assert_eq!(characteristic_name(&wasm::STATUS), Some("Status"));
    }
}
