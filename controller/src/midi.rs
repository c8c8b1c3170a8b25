use gridstrument_core::byte_buffer::ByteBuffer;
use log::error;
use wmidi::{Channel, MidiMessage, Note, U14, U7};

/// MIDI status bytes. Channel voice statuses carry the channel number in
/// their low nibble; the values here are the bare high-nibble patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MidiStatus {
    // Channel Voice Messages
    NoteOff = 0x80,
    NoteOn = 0x90,
    PolyphonicPressure = 0xA0,
    ControlChange = 0xB0,
    ProgramChange = 0xC0,
    ChannelPressure = 0xD0,
    PitchBend = 0xE0,
    // System Common Messages
    SystemExclusive = 0xF0,
    TimeCodeQuarterFrame = 0xF1,
    SongPositionPointer = 0xF2,
    SongSelect = 0xF3,
    TuneRequest = 0xF6,
    EndOfExclusive = 0xF7,
    // System Real-Time Messages
    TimingClock = 0xF8,
    Start = 0xFA,
    Continue = 0xFB,
    Stop = 0xFC,
    ActiveSensing = 0xFE,
    Reset = 0xFF,
}

impl MidiStatus {
    /// The wire byte for this status on the given channel. System statuses
    /// ignore the channel.
    pub fn on_channel(self, channel: Channel) -> u8 {
        let status = self as u8;
        if status < MidiStatus::SystemExclusive as u8 {
            status | channel.index()
        } else {
            status
        }
    }
}

/// Pitch bend center, no bend applied.
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Outgoing MIDI events produced by the control layer.
#[derive(Debug, Clone, Copy)]
pub enum MidiEvent {
    NoteOn {
        channel: Channel,
        note: Note,
        velocity: U7,
    },
    NoteOff {
        channel: Channel,
        note: Note,
        velocity: U7,
    },
    PitchBendChange {
        channel: Channel,
        value: u16, // 14-bit value (0-16383, center 8192)
    },
    MpeNoteOn {
        channel: Channel,
        note: Note,
        velocity: U7,
        pitch_bend: u16,
    },
}

/// Serializes outgoing events into a fixed-size circular transport buffer.
///
/// The buffer overwrites silently when it overflows, so it has to be sized
/// for the burstiest message rate the caller can produce.
pub struct MidiOutQueue<const N: usize> {
    buffer: ByteBuffer<N>,
}

impl<const N: usize> MidiOutQueue<N> {
    pub const fn new() -> Self {
        Self {
            buffer: ByteBuffer::new(),
        }
    }

    pub fn send(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => {
                // reset pitch bend first so no lingering per-note bend
                // affects this note
                self.enqueue_pitch_bend(channel, PITCH_BEND_CENTER);
                self.enqueue(&MidiMessage::NoteOn(channel, note, velocity));
            }
            MidiEvent::NoteOff {
                channel,
                note,
                velocity,
            } => {
                self.enqueue(&MidiMessage::NoteOff(channel, note, velocity));
            }
            MidiEvent::PitchBendChange { channel, value } => {
                self.enqueue_pitch_bend(channel, value);
            }
            MidiEvent::MpeNoteOn {
                channel,
                note,
                velocity,
                pitch_bend,
            } => {
                // per-note pitch bend has to land before the note on
                self.enqueue_pitch_bend(channel, pitch_bend);
                self.enqueue(&MidiMessage::NoteOn(channel, note, velocity));
            }
        }
    }

    /// Next wire byte for the transport to pick up, if any.
    pub fn pop_byte(&mut self) -> Option<u8> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.pop())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn enqueue_pitch_bend(&mut self, channel: Channel, value: u16) {
        let Ok(bend) = U14::try_from(value.clamp(0, 16383)) else {
            return;
        };
        self.enqueue(&MidiMessage::PitchBendChange(channel, bend));
    }

    fn enqueue(&mut self, message: &MidiMessage<'_>) {
        let mut buf = [0u8; 3];
        match message.copy_to_slice(&mut buf) {
            Ok(len) => {
                for &byte in &buf[..len] {
                    self.buffer.push(byte);
                }
            }
            Err(_) => {
                error!("Buffer copy error while sending {:?}", message);
            }
        }
    }
}

impl<const N: usize> Default for MidiOutQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
