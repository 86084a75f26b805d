//! ## Support for extended CPC disk images
//!
//! The extended format stores a 256 byte disk information block followed by
//! one track information block per formatted track.  Each track information
//! block carries its own sub-header, a list of 8 byte sector descriptors, and
//! the sector payloads laid out contiguously in descriptor order.  Unlike the
//! older fixed-layout format, sector payloads can vary in size, so the only
//! way to find a sector's data is to walk the descriptors accumulating their
//! declared lengths.
//!
//! The format is specified at
//! <https://www.cpcwiki.eu/index.php/Format:DSK_disk_image_file_format>

use log::{trace,info,error};
use crate::img;
use crate::{STDRESULT,DYNERR};

/// 23 byte signature identifying the extended container
pub const SIGNATURE: &[u8;23] = b"EXTENDED CPC DSK File\r\n";

const HEADER_SIZE: usize = 0x100;
const TRACK_COUNT: usize = 0x30;
const TRACK_SIZE_TABLE: usize = 0x34;
// offsets within a track information block
const SECTOR_COUNT: usize = 0x15;
const SECTOR_INFO_LIST: usize = 0x18;
const SECTOR_INFO_SIZE: usize = 8;
const SECTOR_DATA: usize = 0x100;

pub fn file_extensions() -> Vec<String> {
    vec!["dsk".to_string()]
}

/// One sector descriptor as recorded in a track information block.
/// `C,H,R,N` are the address field bytes (cylinder, head, id, size code),
/// `status_1` and `status_2` are the FDC status registers captured when the
/// sector was imaged, and `data_size` is the actual byte count of the payload
/// stored in the image.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct SectorInfo {
    pub cylinder: u8,
    pub head: u8,
    pub sector_id: u8,
    pub size_code: u8,
    pub status_1: u8,
    pub status_2: u8,
    pub data_size: usize
}

impl SectorInfo {
    /// Byte count implied by the size code in the address field.
    /// This can differ from `data_size` for oversized sectors.
    /// Only the low 3 bits of the size code are meaningful to the FDC.
    pub fn coded_size(&self) -> usize {
        128 << (self.size_code & 0x07) as usize
    }
}

/// Wrapper for extended CPC disk image data.  The disk information block and
/// the concatenated track information blocks are kept exactly as loaded;
/// sector writes patch the track information block in place.
#[derive(Clone)]
pub struct Edsk {
    header: Vec<u8>,
    track_info_block: Vec<u8>
}

impl Edsk {
    pub fn from_bytes(buf: &[u8]) -> Result<Self,img::Error> {
        if buf.len() < HEADER_SIZE || &buf[0..SIGNATURE.len()] != SIGNATURE {
            error!("extended disk image signature not found");
            return Err(img::Error::FileFormat);
        }
        let ans = Self {
            header: buf[0..HEADER_SIZE].to_vec(),
            track_info_block: buf[HEADER_SIZE..].to_vec()
        };
        info!("identified extended disk image with {} tracks",ans.track_count());
        Ok(ans)
    }
    pub fn from_file(path: &str) -> Result<Self,DYNERR> {
        let buf = std::fs::read(path)?;
        Ok(Self::from_bytes(&buf)?)
    }
    /// Save the image file (make changes permanent)
    pub fn save(&self,path: &str) -> STDRESULT {
        std::fs::write(path,self.to_bytes())?;
        Ok(())
    }
    /// Get the count of formatted tracks from the disk information block.
    /// Tracks may still have no recorded data, see `track_info_size`.
    pub fn track_count(&self) -> usize {
        self.header[TRACK_COUNT] as usize
    }
    fn verify_track(&self,track: usize) -> Result<(),img::Error> {
        if track >= self.track_count() {
            error!("track range should be 0-{}",self.track_count() as isize - 1);
            return Err(img::Error::InvalidTrack { track });
        }
        Ok(())
    }
    /// Size in bytes of the track information block for `track`, including
    /// its 0x100 byte sub-header.  A size of 0 means no data was recorded
    /// for this track.
    pub fn track_info_size(&self,track: usize) -> Result<usize,img::Error> {
        self.verify_track(track)?;
        Ok(self.header[TRACK_SIZE_TABLE + track] as usize * 0x100)
    }
    /// Offset of the track information block for `track`, found by summing
    /// the declared sizes of all prior tracks.  There is no cached offset
    /// table; every lookup is O(track).
    fn track_info_offset(&self,track: usize) -> Result<usize,img::Error> {
        if self.track_info_size(track)? == 0 {
            error!("track {} has no data",track);
            return Err(img::Error::TrackData { track });
        }
        let mut offset = 0;
        for i in 0..track {
            offset += self.track_info_size(i)?;
        }
        Ok(offset)
    }
    /// Get the sector descriptors for `track` in the order they were imaged.
    /// A track with no recorded data yields an empty list, which is distinct
    /// from the track not existing at all.
    pub fn sector_list(&self,track: usize) -> Result<Vec<SectorInfo>,img::Error> {
        if self.track_info_size(track)? == 0 {
            return Ok(Vec::new());
        }
        let offset = self.track_info_offset(track)?;
        if offset + SECTOR_INFO_LIST > self.track_info_block.len() {
            error!("track {} sub-header runs off the end of the image",track);
            return Err(img::Error::TruncatedTrack { track });
        }
        let count = self.track_info_block[offset + SECTOR_COUNT] as usize;
        if offset + SECTOR_INFO_LIST + count*SECTOR_INFO_SIZE > self.track_info_block.len() {
            error!("track {} declares {} sectors but the descriptor list is cut short",track,count);
            return Err(img::Error::TruncatedTrack { track });
        }
        let mut ans = Vec::new();
        let mut ptr = offset + SECTOR_INFO_LIST;
        for _sector in 0..count {
            ans.push(SectorInfo {
                cylinder: self.track_info_block[ptr],
                head: self.track_info_block[ptr+1],
                sector_id: self.track_info_block[ptr+2],
                size_code: self.track_info_block[ptr+3],
                status_1: self.track_info_block[ptr+4],
                status_2: self.track_info_block[ptr+5],
                data_size: self.track_info_block[ptr+6] as usize + self.track_info_block[ptr+7] as usize * 0x100
            });
            ptr += SECTOR_INFO_SIZE;
        }
        Ok(ans)
    }
    /// Read a sector, addressed by the id byte in its address field.
    /// The returned slice is the size implied by the descriptor's size code.
    pub fn read_sector(&self,track: usize,sector: u8) -> Result<Vec<u8>,img::Error> {
        if self.track_info_size(track)? == 0 {
            error!("track {} has no data",track);
            return Err(img::Error::TrackData { track });
        }
        let sector_info = self.sector_list(track)?;
        let mut ptr = self.track_info_offset(track)? + SECTOR_DATA;
        for info in &sector_info {
            if info.sector_id == sector {
                trace!("reading track {} sector 0x{:02X} ({} bytes)",track,sector,info.coded_size());
                if ptr + info.coded_size() > self.track_info_block.len() {
                    error!("track {} sector 0x{:02X} data runs off the end of the image",track,sector);
                    return Err(img::Error::TruncatedTrack { track });
                }
                return Ok(self.track_info_block[ptr..ptr+info.coded_size()].to_vec());
            }
            // not this one, skip over its payload
            ptr += info.data_size;
        }
        error!("sector 0x{:02X} not found in track {}",sector,track);
        Err(img::Error::SectorNotFound { track, sector })
    }
    /// Write a sector, addressed by the id byte in its address field.
    /// This is strictly an in-place overwrite: the data must exactly match
    /// the byte count the descriptor declares for this sector.  The image is
    /// untouched unless the whole write can go through.
    pub fn write_sector(&mut self,track: usize,sector: u8,dat: &[u8]) -> Result<(),img::Error> {
        if self.track_info_size(track)? == 0 {
            error!("track {} has no data",track);
            return Err(img::Error::TrackData { track });
        }
        let sector_info = self.sector_list(track)?;
        let mut ptr = self.track_info_offset(track)? + SECTOR_DATA;
        for info in &sector_info {
            if info.sector_id == sector {
                if dat.len() != info.data_size {
                    error!("length of data to write ({}) does not match size of sector data in image ({})",dat.len(),info.data_size);
                    return Err(img::Error::SectorWriteSize { track, sector, expected: info.data_size, actual: dat.len() });
                }
                if ptr + info.data_size > self.track_info_block.len() {
                    error!("track {} sector 0x{:02X} data runs off the end of the image",track,sector);
                    return Err(img::Error::TruncatedTrack { track });
                }
                trace!("writing track {} sector 0x{:02X} ({} bytes)",track,sector,dat.len());
                self.track_info_block[ptr..ptr+dat.len()].copy_from_slice(dat);
                return Ok(());
            }
            ptr += info.data_size;
        }
        error!("sector 0x{:02X} not found in track {}",sector,track);
        Err(img::Error::SectorNotFound { track, sector })
    }
    /// Flatten the image: disk information block followed by the track
    /// information blocks, with any sector writes already applied.
    pub fn to_bytes(&self) -> Vec<u8> {
        [self.header.clone(),self.track_info_block.clone()].concat()
    }
    /// Write the disk geometry into a JSON string.  Each formatted track
    /// contributes its address map (hex encoded CHRN), status registers, and
    /// size map; tracks with no recorded data appear as null.
    pub fn export_geometry(&self,indent: Option<u16>) -> Result<String,DYNERR> {
        let mut root = json::JsonValue::new_object();
        root["tracks"] = json::JsonValue::new_array();
        for track in 0..self.track_count() {
            let sector_info = self.sector_list(track)?;
            if sector_info.len() == 0 {
                root["tracks"].push(json::JsonValue::Null)?;
                continue;
            }
            let mut trk_obj = json::JsonValue::new_object();
            trk_obj["addr_map"] = json::JsonValue::new_array();
            trk_obj["status_map"] = json::JsonValue::new_array();
            trk_obj["size_map"] = json::JsonValue::new_array();
            for info in &sector_info {
                trk_obj["addr_map"].push(hex::encode_upper([info.cylinder,info.head,info.sector_id,info.size_code]))?;
                trk_obj["status_map"].push(hex::encode_upper([info.status_1,info.status_2]))?;
                trk_obj["size_map"].push(info.data_size)?;
            }
            trk_obj["addr_type"] = json::JsonValue::String("CHRN".to_string());
            root["tracks"].push(trk_obj)?;
        }
        if let Some(spaces) = indent {
            Ok(json::stringify_pretty(root,spaces))
        } else {
            Ok(json::stringify(root))
        }
    }
}
