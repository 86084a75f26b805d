//! # Disk Image Module
//!
//! Disk images are represented by objects owning their backing byte buffers.
//! At present the only supported container is the extended CPC disk image
//! (see `edsk`), which stores per-track sector descriptors and variable-size
//! sector payloads.
//!
//! ## Addressing
//!
//! Sectors are addressed by `(track, sector id)`.  The sector id is the `R`
//! byte recorded in the sector's address field, *not* its position on the
//! track; interleaved formats record ids out of order and lookups walk the
//! descriptor list to find a match.
//!
//! ## Lazy validation
//!
//! Only the container signature is checked at construction.  Malformed
//! per-track data surfaces when that track is accessed, so an image with a
//! corrupt track can still be used as long as the bad track is never read.

pub mod edsk;

/// Enumerates disk image errors.  The `Display` trait will print an
/// equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("not an extended CPC disk image")]
    FileFormat,
    #[error("track {track} does not exist on this disk image")]
    InvalidTrack { track: usize },
    #[error("track {track} has no data")]
    TrackData { track: usize },
    #[error("information block for track {track} is truncated")]
    TruncatedTrack { track: usize },
    #[error("sector 0x{sector:02X} not found in track {track}")]
    SectorNotFound { track: usize, sector: u8 },
    #[error("unable to write track {track} sector 0x{sector:02X}: data is {actual} bytes, sector is {expected} bytes")]
    SectorWriteSize { track: usize, sector: u8, expected: usize, actual: usize }
}
