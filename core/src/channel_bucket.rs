//! Hands out MIDI channel numbers from a bucket of allowed channels.
//!
//! Channels are added to the bucket once, up front. When a note needs a
//! channel it just takes one; the channel sinks to the bottom of the bucket
//! and only comes around again after every other channel has been handed out
//! too. When polyphony exceeds the number of channels the same channel ends
//! up held by several notes at once, so the bucket counts how many holds are
//! outstanding on each channel.
//!
//! The bucket is split in two sections: the released channels on top, ordered
//! oldest release first, and the taken channels below. Releasing a channel
//! nobody else holds moves it to the bottom of the released section, which
//! postpones its reuse as long as possible. That delay is the whole point:
//! sounds with long release tails glitch when their channel is reassigned
//! under them.

/// Number of MIDI channels a bucket can hold.
pub const NUM_CHANNELS: usize = 16;

/// A bucket of MIDI channels with deferred reuse.
///
/// Channel numbers are 1-based (1..=16) at the API; internally the bucket is
/// a circular doubly-linked list over 0-based slots, stored as two fixed
/// link arrays so that every operation is O(1) and nothing ever allocates.
/// `None` links mark slots that were never added.
pub struct ChannelBucket {
    /// Next channel to hand out, `None` while the bucket is empty.
    top: Option<u8>,
    /// Bottom of the released section, `None` when every channel is taken.
    bottom_released: Option<u8>,
    previous: [Option<u8>; NUM_CHANNELS],
    next: [Option<u8>; NUM_CHANNELS],
    /// Outstanding holds per channel; zero means released.
    holds: [u8; NUM_CHANNELS],
}

impl ChannelBucket {
    pub const fn new() -> Self {
        Self {
            top: None,
            bottom_released: None,
            previous: [None; NUM_CHANNELS],
            next: [None; NUM_CHANNELS],
            holds: [0; NUM_CHANNELS],
        }
    }

    /// Adds a channel (1..=16) to the bucket.
    ///
    /// Out-of-range and already-present channels are ignored, so adding is
    /// idempotent. A new channel starts released, at the bottom of the
    /// released section.
    pub fn add(&mut self, channel: u8) {
        if channel < 1 || channel > NUM_CHANNELS as u8 {
            return;
        }
        let ch = (channel - 1) as usize;
        if self.next[ch].is_some() {
            return;
        }

        match (self.top, self.bottom_released) {
            // first channel in the bucket: a ring of one
            (None, _) => {
                self.previous[ch] = Some(ch as u8);
                self.next[ch] = Some(ch as u8);
                self.top = Some(ch as u8);
                self.bottom_released = Some(ch as u8);
            }
            // every existing channel is taken: the newcomer becomes the
            // released section all by itself, ahead of the taken channels
            (Some(top), None) => {
                let Some(bottom) = self.previous[top as usize] else {
                    return;
                };
                self.link(bottom as usize, ch);
                self.link(ch, top as usize);
                self.top = Some(ch as u8);
                self.bottom_released = Some(ch as u8);
            }
            // splice in right after the bottom-most released channel
            (Some(_), Some(bottom)) => {
                let Some(taken_edge) = self.next[bottom as usize] else {
                    return;
                };
                self.link(bottom as usize, ch);
                self.link(ch, taken_edge as usize);
                self.bottom_released = Some(ch as u8);
            }
        }
        self.holds[ch] = 0;
    }

    /// Takes the channel that has been idle the longest.
    ///
    /// Returns 0 when no channels were ever added; callers must treat 0 as
    /// "no channel available", never as a real channel number. Once the
    /// released section runs dry, already-taken channels are handed out
    /// again in the order they were taken.
    pub fn take(&mut self) -> u8 {
        let Some(top) = self.top else {
            return 0;
        };
        let ch = top as usize;

        // the top channel was already first in ring order, so sinking it to
        // the bottom of the taken section is just advancing the top marker
        self.top = self.next[ch];
        self.holds[ch] = self.holds[ch].saturating_add(1);

        // the last released channel just got taken
        if self.bottom_released == Some(top) {
            self.bottom_released = None;
        }

        top + 1
    }

    /// Releases one hold on a channel.
    ///
    /// Ignored when the channel is out of range, the bucket is empty, or the
    /// channel was never added. A channel still held by another note sinks
    /// to the bottom of the taken section; a channel with no holders left
    /// moves to the bottom of the released section. A release with no
    /// matching take leaves the hold count at zero rather than wrapping.
    pub fn release(&mut self, channel: u8) {
        if channel < 1 || channel > NUM_CHANNELS as u8 || self.top.is_none() {
            return;
        }
        let ch = (channel - 1) as usize;
        if self.next[ch].is_none() {
            return;
        }

        if self.holds[ch] > 1 {
            self.holds[ch] -= 1;
            // still in use by another note: keep it away from the top
            self.extremize(ch);
            self.top = self.next[ch];
            return;
        }
        self.holds[ch] = 0;

        match self.bottom_released {
            // no released section left: this channel becomes it
            None => {
                self.extremize(ch);
                self.top = Some(ch as u8);
            }
            Some(bottom) => {
                // already sitting at the marker or right below it, only the
                // marker needs to move; the marker case happens on a release
                // with no matching take
                if bottom as usize != ch && self.next[bottom as usize] != Some(ch as u8) {
                    let Some(taken_edge) = self.next[bottom as usize] else {
                        return;
                    };
                    self.extract(ch);
                    self.link(bottom as usize, ch);
                    self.link(ch, taken_edge as usize);
                }
            }
        }
        self.bottom_released = Some(ch as u8);
    }

    /// Removes all channels from the bucket.
    pub fn clear(&mut self) {
        self.top = None;
        self.bottom_released = None;
        self.previous = [None; NUM_CHANNELS];
        self.next = [None; NUM_CHANNELS];
        self.holds = [0; NUM_CHANNELS];
    }

    /// Whether a channel was added to the bucket.
    pub fn contains(&self, channel: u8) -> bool {
        channel >= 1
            && channel <= NUM_CHANNELS as u8
            && self.next[(channel - 1) as usize].is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    fn link(&mut self, a: usize, b: usize) {
        self.next[a] = Some(b as u8);
        self.previous[b] = Some(a as u8);
    }

    /// Splices a channel out of the ring, leaving its own links absent.
    fn extract(&mut self, ch: usize) {
        let (Some(prev), Some(next)) = (self.previous[ch], self.next[ch]) else {
            return;
        };
        self.link(prev as usize, next as usize);
        self.previous[ch] = None;
        self.next[ch] = None;
    }

    /// Moves a channel to the very bottom of the bucket, just before the
    /// top, handling the cases where the channel is itself the top or
    /// already the bottom.
    fn extremize(&mut self, ch: usize) {
        let Some(top) = self.top else {
            return;
        };
        let mut bottom = self.previous[top as usize];
        if bottom == Some(ch as u8) {
            bottom = self.previous[ch];
        }
        let mut new_top = Some(top);
        if top as usize == ch {
            new_top = self.next[ch];
        }
        let (Some(bottom), Some(new_top)) = (bottom, new_top) else {
            return;
        };

        self.extract(ch);
        self.link(bottom as usize, ch);
        self.link(ch, new_top as usize);
    }
}

impl Default for ChannelBucket {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_on_empty_bucket() {
        let mut bucket = ChannelBucket::new();
        assert_eq!(bucket.take(), 0);
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_out_of_range_add_is_ignored() {
        let mut bucket = ChannelBucket::new();
        bucket.add(0);
        bucket.add(17);
        assert_eq!(bucket.take(), 0);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut bucket = ChannelBucket::new();
        bucket.add(5);
        bucket.add(5);
        // a single ring member cycles back to itself on every take
        assert_eq!(bucket.take(), 5);
        assert_eq!(bucket.take(), 5);
        assert_eq!(bucket.take(), 5);
    }

    #[test]
    fn test_channels_handed_out_in_added_order() {
        let mut bucket = ChannelBucket::new();
        bucket.add(2);
        bucket.add(7);
        bucket.add(4);
        assert_eq!(bucket.take(), 2);
        assert_eq!(bucket.take(), 7);
        assert_eq!(bucket.take(), 4);
    }

    #[test]
    fn test_round_robin_once_all_taken() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        bucket.add(3);
        let order: [u8; 6] = core::array::from_fn(|_| bucket.take());
        assert_eq!(order, [1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_oldest_released_is_reused_first() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        bucket.add(3);
        bucket.take();
        bucket.take();
        bucket.take();
        bucket.release(2);
        bucket.release(1);
        // 2 was released before 1, so it comes back first regardless of
        // numeric order
        assert_eq!(bucket.take(), 2);
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_sole_released_channel_is_reissued_immediately() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        assert_eq!(bucket.take(), 1);
        assert_eq!(bucket.take(), 2);
        bucket.release(1);
        // 1 is the only released channel, so it beats the shared reuse of 2
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_released_shared_channel_sinks_below_other_taken() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        assert_eq!(bucket.take(), 1);
        assert_eq!(bucket.take(), 2);
        // channel 1 now shared by two notes
        assert_eq!(bucket.take(), 1);
        bucket.release(1);
        // 1 is still held once, so 2 must be handed out before 1 again
        assert_eq!(bucket.take(), 2);
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_hold_count_round_trip() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        for _ in 0..3 {
            assert_eq!(bucket.take(), 1);
        }
        bucket.release(1);
        bucket.release(1);
        bucket.release(1);
        // all holds matched; the channel is free again
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_release_without_take_clamps_at_zero() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        bucket.release(1);
        bucket.release(1);
        // the spurious releases must not leave 1 looking permanently taken
        assert_eq!(bucket.take(), 1);
        bucket.release(1);
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_spurious_release_of_bottom_released_channel() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        bucket.add(3);
        assert_eq!(bucket.take(), 1);
        // 3 is the bottom of the released section and was never taken
        bucket.release(3);
        let order: [u8; 6] = core::array::from_fn(|_| bucket.take());
        assert_eq!(order, [2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_release_of_unknown_channel_is_ignored() {
        let mut bucket = ChannelBucket::new();
        bucket.release(3);
        bucket.add(1);
        bucket.release(3);
        bucket.release(17);
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_take_release_never_change_membership() {
        let mut bucket = ChannelBucket::new();
        bucket.add(4);
        bucket.add(9);
        bucket.take();
        bucket.take();
        bucket.release(9);
        assert!(bucket.contains(4));
        assert!(bucket.contains(9));
        assert!(!bucket.contains(5));
        assert!(!bucket.contains(0));
        assert!(!bucket.contains(17));
    }

    #[test]
    fn test_clear_empties_the_bucket() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        bucket.take();
        bucket.clear();
        assert!(bucket.is_empty());
        assert!(!bucket.contains(1));
        assert_eq!(bucket.take(), 0);
        // usable again after a clear
        bucket.add(3);
        assert_eq!(bucket.take(), 3);
    }

    #[test]
    fn test_add_while_all_channels_taken() {
        let mut bucket = ChannelBucket::new();
        bucket.add(1);
        bucket.add(2);
        bucket.take();
        bucket.take();
        // the newcomer starts released, so it is handed out before any
        // taken channel gets shared
        bucket.add(3);
        assert_eq!(bucket.take(), 3);
        assert_eq!(bucket.take(), 1);
    }

    #[test]
    fn test_long_interleaving_keeps_ring_consistent() {
        let mut bucket = ChannelBucket::new();
        for ch in 1..=4 {
            bucket.add(ch);
        }
        let mut outstanding: [u8; 17] = [0; 17];
        // drive the bucket through a few hundred mixed operations and make
        // sure every take keeps yielding a valid member
        for step in 0..400usize {
            if step % 3 == 0 {
                let ch = ((step / 3) % 4 + 1) as u8;
                if outstanding[ch as usize] > 0 {
                    bucket.release(ch);
                    outstanding[ch as usize] -= 1;
                }
            } else {
                let ch = bucket.take();
                assert!((1..=4).contains(&ch));
                outstanding[ch as usize] += 1;
            }
        }
        for ch in 1..=4 {
            assert!(bucket.contains(ch));
        }
    }
}
