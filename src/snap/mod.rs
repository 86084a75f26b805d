//! # Snapshot Module
//!
//! Support for version 2 CPC snapshots.  A snapshot is a 256 byte header
//! holding the complete machine state (Z80 registers, gate array inks and
//! mode/ROM configuration, CRTC registers, machine type) followed by a flat
//! memory image of exactly 64K or 128K.  For 128K machines, offsets at and
//! above 0x10000 are banked RAM outside the Z80's direct address space.
//!
//! The format is specified at <https://www.cpcwiki.eu/index.php/Snapshot>
//!
//! ## Ink encodings
//!
//! Hardware ink colours live in two numeric namespaces: the plain 0-31 range,
//! and the 0x40-0x5F form that appears in the `OUT` instruction used to set
//! them on the real machine.  Every setter here accepts both and normalizes
//! to 0-31 before storage; readers mask the stored byte so values written by
//! other tools in `OUT` form also come back normalized.  Firmware colours
//! (0-26) relate to hardware colours through a fixed 32 entry table.

use std::fmt;
use log::{info,warn,error};
use num_traits::FromPrimitive;
use num_derive::FromPrimitive;
use crate::{STDRESULT,DYNERR};

/// 8 byte signature identifying a snapshot file
pub const SIGNATURE: &[u8;8] = b"MV - SNA";

const HEADER_SIZE: usize = 0x100;
const VERSION: usize = 0x10;
const IFF0: usize = 0x1b;
const IFF1: usize = 0x1c;
const INKS: usize = 0x2f;
const BORDER: usize = 0x3f;
const MODE_AND_ROM: usize = 0x40;
const CRTC_REGISTERS: usize = 0x43;
const UPPER_ROM: usize = 0x55;
const PPI_CONTROL: usize = 0x59;
const RAM_SIZE: usize = 0x6b;
const MACHINE_TYPE: usize = 0x6d;
/// the Z80's directly addressable 64K; memory beyond this is banked
const MAIN_RAM: usize = 0x10000;

/// 8-bit Z80 registers and their header offsets, in the order the snapshot
/// specification lists them (main set, then the shadow set)
const REGISTERS_8BIT: [(&str,usize);18] = [
    ("F",0x11),("A",0x12),("C",0x13),("B",0x14),("E",0x15),("D",0x16),("L",0x17),("H",0x18),("R",0x19),("I",0x1a),
    ("F'",0x26),("A'",0x27),("C'",0x28),("B'",0x29),("E'",0x2a),("D'",0x2b),("L'",0x2c),("H'",0x2d)
];
/// 16-bit Z80 register pairs and their header offsets, low byte first
const REGISTERS_16BIT: [(&str,usize);12] = [
    ("AF",0x11),("BC",0x13),("DE",0x15),("HL",0x17),("IX",0x1d),("IY",0x1f),("SP",0x21),("PC",0x23),
    ("AF'",0x26),("BC'",0x28),("DE'",0x2a),("HL'",0x2c)
];

/// Table for converting hardware ink values (0-31) to their corresponding
/// firmware ink values
pub const FIRMWARE_INKS: [u8;32] = [
    13,27,19,25, 1, 7,10,16,28,29,24,26, 6, 8,15,17,
    30,31,18,20, 0, 2, 9,11, 4,22,21,23, 3, 5,12,14
];

/// hardware ink for black, the blank snapshot default
const INK_BLACK: u8 = 20;
/// default CRTC timing for a standard 50Hz display, registers 0-15
const DEFAULT_CRTC_REGISTERS: [u8;16] = [63,40,46,142,38,0,25,30,0,7,0,0,48,0,192,0];
/// default PPI control word: ports A and C input, port B output
const DEFAULT_PPI_CONTROL: u8 = 0x82;

pub fn file_extensions() -> Vec<String> {
    vec!["sna".to_string()]
}

/// Enumerates snapshot errors.  The `Display` trait will print an equivalent
/// long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("not a CPC snapshot file")]
    FileFormat,
    #[error("only version 2 snapshot files are supported")]
    UnsupportedVersion,
    #[error("snapshot memory must be either 64K or 128K")]
    MemorySize,
    #[error("'{0}' is not a valid Z80 register")]
    InvalidRegister(String),
    #[error("list must contain between {min} and {max} items")]
    ListSize { min: usize, max: usize },
    #[error("invalid value {value} for {item}; must be between {min} and {max}")]
    Range { item: &'static str, value: usize, min: usize, max: usize },
    #[error("bytes to insert do not fit into main 64K of snapshot RAM")]
    MainRamOverflow,
    #[error("bytes to insert do not fit into snapshot RAM")]
    RamOverflow
}

/// Machine types a version 2 snapshot can declare.  Value 3 occurs in files
/// written by some emulators; it can be read back but not set through
/// `set_machine_type`.
#[derive(FromPrimitive,PartialEq,Eq,Clone,Copy,Debug)]
pub enum MachineType {
    Cpc464 = 0,
    Cpc664 = 1,
    Cpc6128 = 2,
    Unknown = 3
}

impl fmt::Display for MachineType {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpc464 => write!(f,"CPC464"),
            Self::Cpc664 => write!(f,"CPC664"),
            Self::Cpc6128 => write!(f,"CPC6128"),
            Self::Unknown => write!(f,"unknown")
        }
    }
}

fn verify_ink(ink: usize) -> Result<(),Error> {
    if ink > 15 {
        error!("ink number should be 0-15, got {}",ink);
        return Err(Error::Range { item: "ink", value: ink, min: 0, max: 15 });
    }
    Ok(())
}

fn verify_hardware_colour(colour: u8) -> Result<(),Error> {
    // either the plain 0-31 range or the OUT instruction's 0x40-0x5F form
    if colour < 0x20 || (0x40..0x60).contains(&colour) {
        return Ok(());
    }
    error!("hardware colour should be 0-31 or 0x40-0x5F, got {}",colour);
    Err(Error::Range { item: "hardware colour", value: colour as usize, min: 0, max: 31 })
}

fn verify_firmware_colour(colour: u8) -> Result<(),Error> {
    if colour > 26 {
        error!("firmware colour should be 0-26, got {}",colour);
        return Err(Error::Range { item: "firmware colour", value: colour as usize, min: 0, max: 26 });
    }
    Ok(())
}

/// firmware to hardware is by table search; the colour must already be
/// verified, the error branch only guards the table itself
fn hardware_from_firmware(colour: u8) -> Result<u8,Error> {
    match FIRMWARE_INKS.iter().position(|&c| c == colour) {
        Some(hw) => Ok(hw as u8),
        None => Err(Error::Range { item: "firmware colour", value: colour as usize, min: 0, max: 26 })
    }
}

/// Wrapper for version 2 snapshot data.  The header and memory image are
/// owned buffers; all accessors patch or read them in place, and `to_bytes`
/// flattens the pair back into the file layout.
#[derive(Clone)]
pub struct Snapshot {
    header: Vec<u8>,
    memory: Vec<u8>
}

impl Snapshot {
    /// Create a blank snapshot with `ram_size` of 64 or 128 (KiB).  Defaults:
    /// standard CRTC timing, all inks and the border black, screen mode 1,
    /// both ROMs disabled, interrupts disabled.
    pub fn new(ram_size: usize) -> Result<Self,Error> {
        if ram_size != 64 && ram_size != 128 {
            error!("RAM size must be either 64 or 128, got {}",ram_size);
            return Err(Error::MemorySize);
        }
        let mut ans = Self {
            header: vec![0;HEADER_SIZE],
            memory: vec![0;ram_size * 1024]
        };
        ans.header[0..SIGNATURE.len()].copy_from_slice(SIGNATURE);
        ans.header[VERSION] = 2;
        ans.header[RAM_SIZE] = ram_size as u8;
        ans.set_crtc_registers(&DEFAULT_CRTC_REGISTERS)?;
        ans.set_inks(&[INK_BLACK;16])?;
        ans.set_border(INK_BLACK)?;
        ans.set_screen_mode(1)?;
        ans.disable_lower_rom();
        ans.disable_upper_rom();
        ans.disable_interrupts();
        ans.header[PPI_CONTROL] = DEFAULT_PPI_CONTROL;
        Ok(ans)
    }
    pub fn from_bytes(buf: &[u8]) -> Result<Self,Error> {
        if buf.len() < HEADER_SIZE || &buf[0..SIGNATURE.len()] != SIGNATURE {
            error!("snapshot signature not found");
            return Err(Error::FileFormat);
        }
        if buf[VERSION] != 2 {
            error!("snapshot version {} is not supported",buf[VERSION]);
            return Err(Error::UnsupportedVersion);
        }
        let memory = buf[HEADER_SIZE..].to_vec();
        if memory.len() != 64*1024 && memory.len() != 128*1024 {
            error!("snapshot memory was {} bytes",memory.len());
            return Err(Error::MemorySize);
        }
        let ans = Self {
            header: buf[0..HEADER_SIZE].to_vec(),
            memory
        };
        if ans.get_ram_size() * 1024 != ans.memory.len() {
            warn!("header declares {}K but memory is {} bytes",ans.get_ram_size(),ans.memory.len());
        }
        info!("identified version 2 snapshot with {}K memory",ans.memory.len()/1024);
        Ok(ans)
    }
    pub fn from_file(path: &str) -> Result<Self,DYNERR> {
        let buf = std::fs::read(path)?;
        Ok(Self::from_bytes(&buf)?)
    }
    /// Save the snapshot file (make changes permanent)
    pub fn save(&self,path: &str) -> STDRESULT {
        std::fs::write(path,self.to_bytes())?;
        Ok(())
    }
    /// Flatten the snapshot: header followed by the memory image.
    pub fn to_bytes(&self) -> Vec<u8> {
        [self.header.clone(),self.memory.clone()].concat()
    }

    // ----------------------
    // Z80 register functions
    // ----------------------

    /// Get a Z80 register by name, e.g. `A`, `HL`, `BC'`, `SP`.  The answer
    /// is 0-255 for an 8-bit register, 0-65535 for a 16-bit pair.
    pub fn get_register(&self,register: &str) -> Result<u16,Error> {
        if let Some((_,offset)) = REGISTERS_8BIT.iter().find(|(name,_)| *name == register) {
            return Ok(self.header[*offset] as u16);
        }
        if let Some((_,offset)) = REGISTERS_16BIT.iter().find(|(name,_)| *name == register) {
            return Ok(self.header[*offset] as u16 + self.header[*offset + 1] as u16 * 0x100);
        }
        error!("{} is not a valid Z80 register",register);
        Err(Error::InvalidRegister(register.to_string()))
    }
    /// Set a Z80 register by name.  8-bit registers check the value fits in
    /// a byte; 16-bit pairs are stored low byte first.
    pub fn set_register(&mut self,register: &str,value: u16) -> Result<(),Error> {
        if let Some((_,offset)) = REGISTERS_8BIT.iter().find(|(name,_)| *name == register) {
            if value > 0xff {
                error!("value {} does not fit in 8-bit register {}",value,register);
                return Err(Error::Range { item: "8-bit register", value: value as usize, min: 0, max: 255 });
            }
            self.header[*offset] = value as u8;
            return Ok(());
        }
        if let Some((_,offset)) = REGISTERS_16BIT.iter().find(|(name,_)| *name == register) {
            self.header[*offset] = (value & 0xff) as u8;
            self.header[*offset + 1] = (value >> 8) as u8;
            return Ok(());
        }
        error!("{} is not a valid Z80 register",register);
        Err(Error::InvalidRegister(register.to_string()))
    }
    /// Get every Z80 register in specification order, 8-bit set first.
    pub fn get_registers(&self) -> Vec<(&'static str,u16)> {
        let mut ans = Vec::new();
        for (name,offset) in REGISTERS_8BIT {
            ans.push((name,self.header[offset] as u16));
        }
        for (name,offset) in REGISTERS_16BIT {
            ans.push((name,self.header[offset] as u16 + self.header[offset + 1] as u16 * 0x100));
        }
        ans
    }

    // -------------------
    // Interrupt functions
    // -------------------

    /// Enable maskable interrupts by setting bit 0 of both interrupt
    /// flip-flop bytes.
    pub fn enable_interrupts(&mut self) {
        self.header[IFF0] |= 0x01;
        self.header[IFF1] |= 0x01;
    }
    /// Disable maskable interrupts by clearing bit 0 of both interrupt
    /// flip-flop bytes.
    pub fn disable_interrupts(&mut self) {
        self.header[IFF0] &= 0xfe;
        self.header[IFF1] &= 0xfe;
    }
    pub fn interrupts_enabled(&self) -> bool {
        self.header[IFF0] & 0x01 != 0
    }

    // -------------
    // Ink functions
    // -------------

    /// Get the hardware colour (0-31) of an ink (0-15).
    pub fn get_ink(&self,ink: usize) -> Result<u8,Error> {
        verify_ink(ink)?;
        Ok(self.header[INKS + ink] & 0x1f)
    }
    /// Get the firmware colour of an ink (0-15).
    pub fn get_firmware_ink(&self,ink: usize) -> Result<u8,Error> {
        verify_ink(ink)?;
        Ok(FIRMWARE_INKS[(self.header[INKS + ink] & 0x1f) as usize])
    }
    /// Get the hardware colours of all 16 inks.
    pub fn get_inks(&self) -> Vec<u8> {
        (0..16).map(|ink| self.header[INKS + ink] & 0x1f).collect()
    }
    /// Get the firmware colours of all 16 inks.
    pub fn get_firmware_inks(&self) -> Vec<u8> {
        (0..16).map(|ink| FIRMWARE_INKS[(self.header[INKS + ink] & 0x1f) as usize]).collect()
    }
    /// Set the colour of an ink using hardware values, either 0-31 or the
    /// OUT instruction's 0x40-0x5F form.  Stored normalized to 0-31.
    pub fn set_ink(&mut self,ink: usize,colour: u8) -> Result<(),Error> {
        verify_ink(ink)?;
        verify_hardware_colour(colour)?;
        self.header[INKS + ink] = colour & 0x1f;
        Ok(())
    }
    /// Set the leading inks using hardware values, 1-16 entries.  The whole
    /// list is validated before any ink changes.
    pub fn set_inks(&mut self,colours: &[u8]) -> Result<(),Error> {
        if colours.len() < 1 || colours.len() > 16 {
            error!("ink list had {} items",colours.len());
            return Err(Error::ListSize { min: 1, max: 16 });
        }
        for colour in colours {
            verify_hardware_colour(*colour)?;
        }
        for (ink,colour) in colours.iter().enumerate() {
            self.header[INKS + ink] = colour & 0x1f;
        }
        Ok(())
    }
    /// Set the colour of an ink using firmware values (0-26).
    pub fn set_firmware_ink(&mut self,ink: usize,colour: u8) -> Result<(),Error> {
        verify_ink(ink)?;
        verify_firmware_colour(colour)?;
        self.header[INKS + ink] = hardware_from_firmware(colour)?;
        Ok(())
    }
    /// Set the leading inks using firmware values, 1-16 entries.  The whole
    /// list is validated before any ink changes.
    pub fn set_firmware_inks(&mut self,colours: &[u8]) -> Result<(),Error> {
        if colours.len() < 1 || colours.len() > 16 {
            error!("ink list had {} items",colours.len());
            return Err(Error::ListSize { min: 1, max: 16 });
        }
        for colour in colours {
            verify_firmware_colour(*colour)?;
        }
        for (ink,colour) in colours.iter().enumerate() {
            self.header[INKS + ink] = hardware_from_firmware(*colour)?;
        }
        Ok(())
    }
    /// Get the hardware colour of the border (0-31).
    pub fn get_border(&self) -> u8 {
        self.header[BORDER] & 0x1f
    }
    /// Get the firmware colour of the border.
    pub fn get_firmware_border(&self) -> u8 {
        FIRMWARE_INKS[self.get_border() as usize]
    }
    /// Set the border colour using hardware values, either 0-31 or the OUT
    /// instruction's 0x40-0x5F form.
    pub fn set_border(&mut self,colour: u8) -> Result<(),Error> {
        verify_hardware_colour(colour)?;
        self.header[BORDER] = colour & 0x1f;
        Ok(())
    }
    /// Set the border colour using firmware values (0-26).
    pub fn set_firmware_border(&mut self,colour: u8) -> Result<(),Error> {
        verify_firmware_colour(colour)?;
        self.header[BORDER] = hardware_from_firmware(colour)?;
        Ok(())
    }

    // ---------------------
    // Screen mode functions
    // ---------------------

    /// Get the screen mode (0-3) from the gate array configuration byte.
    pub fn get_screen_mode(&self) -> u8 {
        self.header[MODE_AND_ROM] & 0x03
    }
    /// Set the screen mode (0-3), leaving the ROM configuration bits alone.
    /// Mode 3 is accepted for completeness although no software uses it.
    pub fn set_screen_mode(&mut self,screen_mode: u8) -> Result<(),Error> {
        if screen_mode > 3 {
            error!("screen mode should be 0-3, got {}",screen_mode);
            return Err(Error::Range { item: "screen mode", value: screen_mode as usize, min: 0, max: 3 });
        }
        self.header[MODE_AND_ROM] = (self.header[MODE_AND_ROM] & 0xfc) | screen_mode;
        Ok(())
    }

    // -----------------------------------------
    // ROM configuration and selection functions
    // -----------------------------------------

    /// Status of (lower ROM, upper ROM); true means enabled.  The gate array
    /// stores these inverted: a set bit disables the ROM.
    pub fn rom_status(&self) -> (bool,bool) {
        (self.header[MODE_AND_ROM] & 0x04 == 0,self.header[MODE_AND_ROM] & 0x08 == 0)
    }
    /// Enable the lower ROM, mapped at 0x0000-0x3FFF when active.
    pub fn enable_lower_rom(&mut self) {
        self.header[MODE_AND_ROM] &= 0xfb;
    }
    pub fn disable_lower_rom(&mut self) {
        self.header[MODE_AND_ROM] |= 0x04;
    }
    /// Enable the upper ROM, mapped at 0xC000-0xFFFF when active.
    pub fn enable_upper_rom(&mut self) {
        self.header[MODE_AND_ROM] &= 0xf7;
    }
    pub fn disable_upper_rom(&mut self) {
        self.header[MODE_AND_ROM] |= 0x08;
    }
    /// Get the selected upper ROM number.  0 is Locomotive BASIC and 7 is
    /// AMSDOS on a standard machine.
    pub fn get_upper_rom_number(&self) -> u8 {
        self.header[UPPER_ROM]
    }
    /// Select an upper ROM.  Any byte is accepted; numbers other than the
    /// standard ones need matching emulator configuration.
    pub fn set_upper_rom_number(&mut self,upper_rom_number: u8) {
        self.header[UPPER_ROM] = upper_rom_number;
    }

    // ---------------------------------
    // Machine type and CRTC functions
    // ---------------------------------

    /// Get the machine type byte exactly as stored.  Real files carry 0-3;
    /// see `machine_type` for the decoded form.
    pub fn get_machine_type(&self) -> u8 {
        self.header[MACHINE_TYPE]
    }
    /// Decode the machine type byte, or None if it is out of range.
    pub fn machine_type(&self) -> Option<MachineType> {
        MachineType::from_u8(self.header[MACHINE_TYPE])
    }
    /// Set the machine type: 0 = CPC464, 1 = CPC664, 2 = CPC6128.  The
    /// "unknown" value 3 is readable but deliberately not settable.
    pub fn set_machine_type(&mut self,machine_type: u8) -> Result<(),Error> {
        if machine_type > 2 {
            error!("machine type should be 0-2, got {}",machine_type);
            return Err(Error::Range { item: "machine type", value: machine_type as usize, min: 0, max: 2 });
        }
        self.header[MACHINE_TYPE] = machine_type;
        Ok(())
    }
    /// Get the value of a CRTC register (0-17).
    pub fn get_crtc_register(&self,register: usize) -> Result<u8,Error> {
        if register > 17 {
            error!("CRTC register should be 0-17, got {}",register);
            return Err(Error::Range { item: "CRTC register", value: register, min: 0, max: 17 });
        }
        Ok(self.header[CRTC_REGISTERS + register])
    }
    /// Get all 18 CRTC registers.
    pub fn get_crtc_registers(&self) -> [u8;18] {
        let mut ans = [0;18];
        ans.copy_from_slice(&self.header[CRTC_REGISTERS..CRTC_REGISTERS + 18]);
        ans
    }
    /// Set the value of a CRTC register (0-17).
    pub fn set_crtc_register(&mut self,register: usize,value: u8) -> Result<(),Error> {
        if register > 17 {
            error!("CRTC register should be 0-17, got {}",register);
            return Err(Error::Range { item: "CRTC register", value: register, min: 0, max: 17 });
        }
        self.header[CRTC_REGISTERS + register] = value;
        Ok(())
    }
    /// Set the leading CRTC registers, 1-18 values starting at register 0.
    pub fn set_crtc_registers(&mut self,values: &[u8]) -> Result<(),Error> {
        if values.len() < 1 || values.len() > 18 {
            error!("CRTC register list had {} items",values.len());
            return Err(Error::ListSize { min: 1, max: 18 });
        }
        self.header[CRTC_REGISTERS..CRTC_REGISTERS + values.len()].copy_from_slice(values);
        Ok(())
    }

    // ----------------
    // Memory functions
    // ----------------

    /// Get the RAM size in KiB as declared in the header (64 or 128).
    pub fn get_ram_size(&self) -> usize {
        self.header[RAM_SIZE] as usize
    }
    /// Borrow the memory image.  Offsets at and above 0x10000 are banked RAM.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
    /// Overwrite memory starting at `start_offset`.  A write that begins in
    /// the main 64K must also end there; a write into banked RAM must fit in
    /// the remaining memory.  Nothing is written unless the whole range fits.
    pub fn insert_bytes(&mut self,dat: &[u8],start_offset: usize) -> Result<(),Error> {
        if dat.len() == 0 {
            return Ok(());
        }
        let end_offset = start_offset + dat.len();
        if start_offset < MAIN_RAM && end_offset > MAIN_RAM {
            error!("bytes to insert at 0x{:X} cross the main RAM boundary",start_offset);
            return Err(Error::MainRamOverflow);
        }
        if end_offset > self.memory.len() {
            error!("bytes to insert at 0x{:X} exceed {} bytes of RAM",start_offset,self.memory.len());
            return Err(Error::RamOverflow);
        }
        self.memory[start_offset..end_offset].copy_from_slice(dat);
        Ok(())
    }
    /// Read a file and insert it into memory at `start_offset`, with the
    /// same boundary checks as `insert_bytes`.  To load into the additional
    /// RAM of a 128K snapshot use offsets 0x10000-0x1FFFF.
    pub fn insert_file(&mut self,path: &str,start_offset: usize) -> STDRESULT {
        let buf = std::fs::read(path)?;
        self.insert_bytes(&buf,start_offset)?;
        Ok(())
    }

    /// Write the machine state into a JSON string: registers, interrupt
    /// state, inks in both encodings, screen mode, ROM configuration, CRTC
    /// registers, machine type, and RAM size.
    pub fn export_state(&self,indent: Option<u16>) -> Result<String,DYNERR> {
        let mut root = json::JsonValue::new_object();
        root["z80"] = json::JsonValue::new_object();
        for (name,value) in self.get_registers() {
            root["z80"][name] = value.into();
        }
        root["interrupts_enabled"] = self.interrupts_enabled().into();
        root["inks"] = json::JsonValue::new_array();
        root["firmware_inks"] = json::JsonValue::new_array();
        for ink in 0..16 {
            root["inks"].push(self.get_ink(ink)?)?;
            root["firmware_inks"].push(self.get_firmware_ink(ink)?)?;
        }
        root["border"] = self.get_border().into();
        root["screen_mode"] = self.get_screen_mode().into();
        let (lower,upper) = self.rom_status();
        root["rom"] = json::JsonValue::new_object();
        root["rom"]["lower_enabled"] = lower.into();
        root["rom"]["upper_enabled"] = upper.into();
        root["rom"]["upper_number"] = self.get_upper_rom_number().into();
        root["crtc"] = json::JsonValue::new_array();
        for value in self.get_crtc_registers() {
            root["crtc"].push(value)?;
        }
        root["machine"] = match self.machine_type() {
            Some(machine) => machine.to_string().into(),
            None => json::JsonValue::Null
        };
        root["ram_size"] = self.get_ram_size().into();
        if let Some(spaces) = indent {
            Ok(json::stringify_pretty(root,spaces))
        } else {
            Ok(json::stringify(root))
        }
    }
}
