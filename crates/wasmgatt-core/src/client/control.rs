//! Control service client

use tracing::{debug, info};

use crate::errors::{RemoteError, Result};
use crate::protocol::control::{ControlCommand, ControlResponse, ControlStatus};
use crate::transport::{GattTransport, WriteMode};
use crate::uuids::control;

pub struct ControlClient<T> {
    transport: T,
}

impl<T: GattTransport> ControlClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Write a command and read back its response
    pub async fn send(&self, command: ControlCommand) -> Result<ControlResponse> {
        debug!("Control command {:#04x}", command.cmd_id);
        self.transport
            .write(control::COMMAND, &command.to_bytes(), WriteMode::WithResponse)
            .await?;

        let bytes = self.transport.read(control::RESPONSE).await?;
        let response = ControlResponse::from_bytes(&bytes)?;
        if !response.is_success() {
            return Err(RemoteError::ControlRejected {
                command: command.cmd_id,
                status: response.status,
            }
            .into());
        }
        Ok(response)
    }

    pub async fn status(&self) -> Result<ControlStatus> {
        let bytes = self.transport.read(control::STATUS).await?;
        Ok(ControlStatus::from_bytes(&bytes)?)
    }

    pub async fn version(&self) -> Result<(u8, u8, u8)> {
        let version = self.send(ControlCommand::get_version()).await?.version();
        info!("Firmware version {}.{}.{}", version.0, version.1, version.2);
        Ok(version)
    }

    pub async fn reset_device(&self) -> Result<ControlResponse> {
        info!("Requesting device reset");
        self.send(ControlCommand::reset_device()).await
    }

    pub async fn set_config(&self, param1: u8, param2: u8) -> Result<ControlResponse> {
        self.send(ControlCommand::set_config(param1, param2)).await
    }
}
