//! # `cpckit` main library
//!
//! This library manipulates byte containers used by Amstrad CPC emulators and
//! preservation tools.  It works at the level of tracks, sectors, and snapshot
//! header fields; interpreting what the bytes *mean* (file systems, program
//! code, screen layouts) is left to the caller.
//!
//! ## Architecture
//!
//! There are three independent components:
//! * `img` handles extended CPC disk images: per-track sector enumeration and
//!   in-place sector reads and writes, addressed by `(track, sector id)`
//! * `snap` handles version 2 CPC snapshots: typed accessors for Z80
//!   registers, inks, screen mode, ROM configuration, CRTC registers, and a
//!   flat 64K or 128K memory image
//! * `video` packs and unpacks hardware pixel bytes for screen Modes 0 and 1,
//!   and converts between RGB palettes and firmware ink colours
//!
//! The components share no state.  A typical caller reads sectors from an
//! `img::edsk::Edsk`, assembles them into a byte buffer, and inserts that
//! buffer into a `snap::Snapshot`'s memory at a computed offset.  Pixel data
//! goes through `video` in either direction as raw ink-index arrays.
//!
//! Containers are constructed from complete byte streams and serialized back
//! with `to_bytes`.  Construction validates the signature (and version where
//! applicable) eagerly; per-track structure is only validated when a track is
//! actually accessed, which mirrors how real containers tolerate corrupt
//! tracks that are simply never read.

pub mod img;
pub mod snap;
pub mod video;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;
