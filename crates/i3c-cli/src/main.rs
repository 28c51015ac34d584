//! `i3c`: command-line register access for the I3C host controller.
//!
//! ```text
//! USAGE:
//!   i3c smoke                               Run the CSR/DAT/DCT smoke sequence
//!   i3c read <reg>                          Read a CSR by name or offset
//!   i3c write <reg> <value>                 Write a CSR
//!   i3c read-field <loc> <low> <mask>       Read a field (CSR offset or table index)
//!   i3c write-field <loc> <low> <mask> <v>  Read-modify-write a field
//!   i3c dat-read <index>                    Dump and decode a DAT entry
//!   i3c dat-write <index> <w0> [w1]         Write DAT entry words
//!   i3c dct-read <index>                    Dump and decode a DCT entry
//!   i3c dct-write <index> <w0> [w1..w3]     Write DCT entry words
//!   i3c discover                            Show the table layout the controller advertises
//! ```
//!
//! `--software` runs against the in-memory controller model instead of the
//! mapped device.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use i3c_driver::{
    parse_number, select_backend, smoke, BackendSelection, Field, HarnessState, I3cConfig,
    I3cController, RegisterTransport, Space, TableKind,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type Controller = I3cController<Box<dyn RegisterTransport>>;

#[derive(Parser)]
#[command(name = "i3c", about = "I3C host controller register CLI", version)]
struct Cli {
    /// Device file to map (overrides I3C_DEVICE_PATH).
    #[arg(long, global = true)]
    device: Option<PathBuf>,
    /// Byte offset of the controller in the device file (overrides I3C_BASE_ADDR).
    #[arg(long, global = true, value_parser = parse_u64)]
    base: Option<u64>,
    /// Bytes to map (overrides I3C_WINDOW_SIZE).
    #[arg(long, global = true, value_parser = parse_u64)]
    size: Option<u64>,
    /// Use the software controller model.
    #[arg(long, global = true)]
    software: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the CSR, DAT and DCT smoke sequence; fails if any check fails.
    Smoke,
    /// Read a CSR.
    Read {
        /// Register name (e.g. HC_CONTROL) or byte offset.
        reg: String,
    },
    /// Write a CSR.
    Write {
        /// Register name or byte offset.
        reg: String,
        /// Value to write.
        #[arg(value_parser = parse_u32)]
        value: u32,
    },
    /// Read a field.
    ReadField {
        #[command(flatten)]
        at: FieldArgs,
    },
    /// Read-modify-write a field.
    WriteField {
        #[command(flatten)]
        at: FieldArgs,
        /// Field value, before shifting.
        #[arg(value_parser = parse_u32)]
        value: u32,
    },
    /// Read and decode a DAT entry.
    DatRead {
        /// Entry index.
        index: usize,
    },
    /// Write DAT entry words, lowest first.
    DatWrite {
        /// Entry index.
        index: usize,
        /// Up to two words.
        #[arg(value_parser = parse_u32, num_args = 1..=2, required = true)]
        words: Vec<u32>,
    },
    /// Read and decode a DCT entry.
    DctRead {
        /// Entry index.
        index: usize,
    },
    /// Write DCT entry words, lowest first.
    DctWrite {
        /// Entry index.
        index: usize,
        /// Up to four words.
        #[arg(value_parser = parse_u32, num_args = 1..=4, required = true)]
        words: Vec<u32>,
    },
    /// Read the section offset registers and print the advertised tables.
    Discover,
}

#[derive(clap::Args)]
struct FieldArgs {
    /// CSR name or offset, or entry index for --space dat/dct.
    location: String,
    /// Lowest bit of the field.
    low: u8,
    /// Pre-shift mask.
    #[arg(value_parser = parse_u32)]
    mask: u32,
    /// Address space.
    #[arg(long, value_enum, default_value_t = SpaceArg::Csr)]
    space: SpaceArg,
    /// Word inside the table entry.
    #[arg(long, default_value_t = 0)]
    word: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum SpaceArg {
    Csr,
    Dat,
    Dct,
}

impl From<SpaceArg> for Space {
    fn from(arg: SpaceArg) -> Self {
        match arg {
            SpaceArg::Csr => Self::Csr,
            SpaceArg::Dat => Self::Dat,
            SpaceArg::Dct => Self::Dct,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut ctrl = open(&cli)?;

    match cli.command {
        Cmd::Smoke => cmd_smoke(&mut ctrl)?,
        Cmd::Read { reg } => cmd_read(&mut ctrl, &reg)?,
        Cmd::Write { reg, value } => cmd_write(&mut ctrl, &reg, value)?,
        Cmd::ReadField { at } => cmd_read_field(&mut ctrl, &at)?,
        Cmd::WriteField { at, value } => cmd_write_field(&mut ctrl, &at, value)?,
        Cmd::DatRead { index } => cmd_dat_read(&mut ctrl, index)?,
        Cmd::DatWrite { index, words } => cmd_table_write(&mut ctrl, TableKind::Dat, index, &words)?,
        Cmd::DctRead { index } => cmd_dct_read(&mut ctrl, index)?,
        Cmd::DctWrite { index, words } => cmd_table_write(&mut ctrl, TableKind::Dct, index, &words)?,
        Cmd::Discover => cmd_discover(&mut ctrl)?,
    }

    Ok(())
}

fn parse_u64(s: &str) -> std::result::Result<u64, String> {
    parse_number(s).map_err(|e| e.to_string())
}

fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let n = parse_u64(s)?;
    u32::try_from(n).map_err(|_| format!("{s} does not fit in 32 bits"))
}

fn open(cli: &Cli) -> Result<Controller> {
    let mut config = I3cConfig::from_env()?;
    if let Some(device) = &cli.device {
        config = config.with_device_path(device);
    }
    if let Some(base) = cli.base {
        config = config.with_base_address(base);
    }
    if let Some(size) = cli.size {
        config = config.with_window_size(usize::try_from(size).context("--size too large")?);
    }

    let selection = if cli.software {
        BackendSelection::Software
    } else {
        BackendSelection::Mmap
    };
    let io = select_backend(selection, &config)
        .with_context(|| format!("opening {}", config.device_path.display()))?;
    println!("Backend: {}", io.backend_type());
    Ok(I3cController::from_config(io, &config)?)
}

/// Register name from the map, or a raw offset.
fn resolve_register(reg: &str) -> Result<usize> {
    if let Some(offset) = i3c_driver::regs::by_name(reg) {
        return Ok(offset);
    }
    let offset = parse_number(reg).with_context(|| format!("unknown register {reg}"))?;
    Ok(usize::try_from(offset)?)
}

fn cmd_smoke(ctrl: &mut Controller) -> Result<()> {
    let state = HarnessState::new();
    let report = smoke::run(ctrl, &state)?;

    println!("---------------------------");
    println!(" I3C CSR Smoke Test");
    println!("---------------------------");
    println!("{report}");

    if !report.is_success() {
        bail!("{} smoke check(s) failed", report.failed());
    }
    Ok(())
}

fn cmd_read(ctrl: &mut Controller, reg: &str) -> Result<()> {
    let offset = resolve_register(reg)?;
    let value = ctrl.csr().read_register(offset)?;
    println!("{reg} @ {offset:#05x} = {value:#010x}");
    Ok(())
}

fn cmd_write(ctrl: &mut Controller, reg: &str, value: u32) -> Result<()> {
    let offset = resolve_register(reg)?;
    let mut csr = ctrl.csr();
    csr.write_register(offset, value)?;
    let readback = csr.read_register(offset)?;
    println!("{reg} @ {offset:#05x} <- {value:#010x} (reads {readback:#010x})");
    Ok(())
}

fn field_location(at: &FieldArgs) -> Result<(Space, usize, Field)> {
    let space = Space::from(at.space);
    let location = match space {
        Space::Csr => resolve_register(&at.location)?,
        Space::Dat | Space::Dct => at
            .location
            .parse()
            .with_context(|| format!("entry index {} is not a number", at.location))?,
    };
    Ok((space, location, Field::in_word(at.word, at.low, at.mask)))
}

fn cmd_read_field(ctrl: &mut Controller, at: &FieldArgs) -> Result<()> {
    let (space, location, field) = field_location(at)?;
    let value = ctrl.read_field(space, location, field)?;
    println!("{space:?}[{location:#x}] word {} [{:#010x} >> {}] = {value:#x}", field.word, field.mask, field.low_bit);
    Ok(())
}

fn cmd_write_field(ctrl: &mut Controller, at: &FieldArgs, value: u32) -> Result<()> {
    let (space, location, field) = field_location(at)?;
    ctrl.write_field(space, location, field, value)?;
    let readback = ctrl.read_field(space, location, field)?;
    println!("{space:?}[{location:#x}] word {} <- {value:#x} (reads {readback:#x})", field.word);
    Ok(())
}

fn cmd_dat_read(ctrl: &mut Controller, index: usize) -> Result<()> {
    let words = ctrl.dat().read_words::<2>(index)?;
    println!("DAT[{index}] = {:#010x} {:#010x}", words[0], words[1]);
    println!("{:#?}", ctrl.read_dat_entry(index)?);
    Ok(())
}

fn cmd_dct_read(ctrl: &mut Controller, index: usize) -> Result<()> {
    let words = ctrl.dct().read_words::<4>(index)?;
    println!(
        "DCT[{index}] = {:#010x} {:#010x} {:#010x} {:#010x}",
        words[0], words[1], words[2], words[3]
    );
    let entry = ctrl.read_dct_entry(index)?;
    println!("PID      : {:#014x}", entry.pid);
    println!("DCR      : {:#04x}", entry.dcr);
    println!("BCR      : {:#04x}", entry.bcr);
    println!("Address  : {:#04x}", entry.dynamic_address);
    Ok(())
}

fn cmd_table_write(ctrl: &mut Controller, kind: TableKind, index: usize, words: &[u32]) -> Result<()> {
    let mut table = ctrl.table(kind);
    table.write_entry(index, words)?;
    let readback = table.read_entry(index, words.len())?;
    println!("{kind}[{index}] <- {words:#010x?} (reads {readback:#010x?})");
    Ok(())
}

fn cmd_discover(ctrl: &mut Controller) -> Result<()> {
    let (dat, dct) = ctrl.discover_layout()?;
    for layout in [dat, dct] {
        let end = layout.end().context("discovered table overflows the address space")?;
        println!(
            "{}  offset {:#05x}  {} entries x {} bytes  (ends {end:#x})",
            layout.kind,
            layout.offset,
            layout.capacity,
            layout.entry_bytes(),
        );
    }
    Ok(())
}
