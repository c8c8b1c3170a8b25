use crate::mpe::MpeVoiceAllocator;
use log::info;

/// Byte-level access to non-volatile settings storage.
///
/// Deliberately minimal: single-byte reads and writes at an offset, with a
/// success flag instead of an error type. Wear leveling and transactional
/// behavior are out of scope; the flash driver behind this decides what a
/// failed write means.
pub trait ByteStorage {
    fn read(&self, address: u32) -> u8;
    fn write(&mut self, address: u32, value: u8) -> bool;

    fn write_all(&mut self, address: u32, data: &[u8]) -> bool {
        for (offset, &byte) in data.iter().enumerate() {
            if !self.write(address + offset as u32, byte) {
                return false;
            }
        }
        true
    }
}

// Record layout: marker byte, then the channel mask little-endian. The
// marker distinguishes a saved setup from erased flash (0xFF) or zeroes.
const SETUP_MARKER: u8 = 0xC5;
const SETUP_LEN: usize = 3;

/// Persists the allocator's member channel setup. Returns false when the
/// underlying storage rejects a write.
pub fn save_channel_setup<S: ByteStorage>(
    storage: &mut S,
    address: u32,
    allocator: &MpeVoiceAllocator,
) -> bool {
    let mask = allocator.channel_mask();
    let record: [u8; SETUP_LEN] = [SETUP_MARKER, mask as u8, (mask >> 8) as u8];
    storage.write_all(address, &record)
}

/// Restores a previously saved channel setup into the allocator. Returns
/// false, leaving the allocator untouched, when no valid record is stored.
pub fn load_channel_setup<S: ByteStorage>(
    storage: &S,
    address: u32,
    allocator: &mut MpeVoiceAllocator,
) -> bool {
    if storage.read(address) != SETUP_MARKER {
        return false;
    }
    let mask = storage.read(address + 1) as u16 | (storage.read(address + 2) as u16) << 8;
    allocator.apply_mask(mask);
    info!("restored channel setup, mask {:#06x}", mask);
    true
}
