//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wasmgatt_core::protocol::dfu::DfuCommand;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Advertised device name to connect to
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Run against an in-memory device and print every write as hex
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for advertising devices
    Scan,
    /// Read the Device Information Service
    Info,
    /// Read the WASM service status
    Status,
    /// Upload a WASM module
    Upload {
        /// Module file
        file: PathBuf,
        /// Payload bytes per packet
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Pause between packets in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Refuse files without the WASM magic
        #[arg(long)]
        strict: bool,
    },
    /// Call a function of the loaded module
    Execute {
        /// Exported function name
        function: String,
        /// Up to four i32 arguments
        #[arg(allow_negative_numbers = true)]
        args: Vec<i32>,
    },
    /// Upload a module then call one of its functions
    Run {
        file: PathBuf,
        function: String,
        #[arg(allow_negative_numbers = true)]
        args: Vec<i32>,
    },
    /// Send the WASM reset command
    Reset,
    /// Sprite registry operations
    #[command(subcommand)]
    Sprite(SpriteCommand),
    /// Control service operations
    #[command(subcommand)]
    Control(ControlCommand),
    /// Data service operations
    #[command(subcommand)]
    Data(DataCommand),
    /// DFU control point operations
    #[command(subcommand)]
    Dfu(DfuSubcommand),
    /// Print the GATT service table as Markdown
    Services,
}

#[derive(Subcommand, Debug)]
pub enum SpriteCommand {
    /// Store a built-in pattern (checkerboard, border, diagonal, empty, full, digit-N)
    Upload { id: u16, pattern: String },
    /// Fetch a sprite and print it
    Download { id: u16 },
    /// Ask the device to recheck a sprite's CRC
    Verify { id: u16 },
    /// Read registry statistics
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ControlCommand {
    /// Read device state and uptime
    Status,
    /// Query the firmware version
    Version,
    /// Reset the device
    Reset,
    /// Send SET_CONFIG with one or two parameter bytes
    SetConfig {
        value: u8,
        #[arg(default_value_t = 0)]
        extra: u8,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataCommand {
    /// Upload text and check the echo
    Send { text: String },
    /// Read the download characteristic
    Read,
    /// Echo payloads of increasing size
    MtuProbe,
    /// Read the transfer status characteristic
    Status,
}

#[derive(Subcommand, Debug)]
pub enum DfuSubcommand {
    /// Write one control point command
    Command {
        #[arg(value_enum)]
        step: DfuStep,
        /// Parameter bytes as hex, at most 19
        #[arg(default_value = "")]
        params: String,
    },
    /// Stream an image file to the DFU packet characteristic
    Image { file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DfuStep {
    Start,
    Initialize,
    Receive,
    Validate,
    Activate,
}

impl From<DfuStep> for DfuCommand {
    fn from(step: DfuStep) -> Self {
        match step {
            DfuStep::Start => DfuCommand::StartDfu,
            DfuStep::Initialize => DfuCommand::Initialize,
            DfuStep::Receive => DfuCommand::ReceiveFirmware,
            DfuStep::Validate => DfuCommand::ValidateFirmware,
            DfuStep::Activate => DfuCommand::ActivateAndReset,
        }
    }
}

impl Commands {
    /// Whether the command talks to a device at all
    pub fn needs_device(&self) -> bool {
        !matches!(self, Commands::Scan | Commands::Services)
    }
}
