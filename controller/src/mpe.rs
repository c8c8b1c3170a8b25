use gridstrument_core::channel_bucket::ChannelBucket;
use wmidi::Channel;

/// Assigns MPE member channels to notes.
///
/// Backed by a [`ChannelBucket`], so a freed channel is reused as late as
/// possible instead of the lowest free channel being grabbed first; that
/// keeps long release tails alive on synths that render them per channel.
/// Channel 1 stays reserved as the MPE master channel and is never handed
/// out for notes.
pub struct MpeVoiceAllocator {
    bucket: ChannelBucket,
}

impl MpeVoiceAllocator {
    pub const fn new() -> Self {
        Self {
            bucket: ChannelBucket::new(),
        }
    }

    /// An allocator configured for the default MPE lower zone: members
    /// Ch2..Ch16 under master Ch1.
    pub fn lower_zone() -> Self {
        let mut allocator = Self::new();
        allocator.configure(2, 15);
        allocator
    }

    /// Replaces the member channel range with `count` channels starting at
    /// `first` (1-based). Channel 1 and out-of-range numbers are skipped.
    pub fn configure(&mut self, first: u8, count: u8) {
        self.bucket.clear();
        for channel in first..first.saturating_add(count) {
            if channel > 1 {
                self.bucket.add(channel);
            }
        }
    }

    /// Allocates a member channel for a note. Returns `None` only when no
    /// channels are configured; once demand exceeds the member count,
    /// channels get shared between notes.
    pub fn alloc(&mut self) -> Option<Channel> {
        match self.bucket.take() {
            0 => None,
            number => Channel::from_index(number - 1).ok(),
        }
    }

    /// Gives a note's channel back to the allocator.
    pub fn free(&mut self, channel: Channel) {
        let number = channel.index() + 1;
        // don't touch Ch1 if we mistakenly got it
        if number > 1 {
            self.bucket.release(number);
        }
    }

    /// Drops all channels, for a channel-mode change. `configure` has to be
    /// called before notes can be allocated again.
    pub fn reset(&mut self) {
        self.bucket.clear();
    }

    /// Bitmask of the configured member channels, bit 0 = Ch1. This is the
    /// serialized form the settings storage persists.
    pub fn channel_mask(&self) -> u16 {
        let mut mask = 0u16;
        for channel in 1..=16u8 {
            if self.bucket.contains(channel) {
                mask |= 1 << (channel - 1);
            }
        }
        mask
    }

    /// Rebuilds the member channel set from a persisted bitmask.
    pub fn apply_mask(&mut self, mask: u16) {
        self.bucket.clear();
        for channel in 2..=16u8 {
            if mask & (1 << (channel - 1)) != 0 {
                self.bucket.add(channel);
            }
        }
    }
}

impl Default for MpeVoiceAllocator {
    fn default() -> Self {
        Self::new()
    }
}
