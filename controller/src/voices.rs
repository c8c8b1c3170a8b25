use crate::midi::{MidiEvent, MidiOutQueue};
use crate::mpe::MpeVoiceAllocator;
use heapless::Vec;
use log::info;
use wmidi::{Channel, Note, U7};

/// Most simultaneous sounding notes the router tracks.
pub const MAX_VOICES: usize = 16;

/// Pairs sounding notes with the channels the allocator assigned them, and
/// emits the matching note on/off messages.
///
/// Which notes are *eligible* to sound (polyphony policy, note stealing) is
/// decided upstream; this only keeps the note -> channel bookkeeping so a
/// note off releases the same channel its note on took.
pub struct VoiceRouter {
    allocator: MpeVoiceAllocator,
    active: Vec<(Note, Channel), MAX_VOICES>,
}

impl VoiceRouter {
    pub fn new(allocator: MpeVoiceAllocator) -> Self {
        Self {
            allocator,
            active: Vec::new(),
        }
    }

    /// Starts a note: assigns a channel and queues the note on, preceded by
    /// its per-note pitch bend. Dropped when no channels are configured or
    /// the voice table is full.
    pub fn note_on<const N: usize>(
        &mut self,
        out: &mut MidiOutQueue<N>,
        note: Note,
        velocity: U7,
        pitch_bend: u16,
    ) {
        let Some(channel) = self.allocator.alloc() else {
            info!("no channel available, dropping {:?}", note);
            return;
        };
        if self.active.push((note, channel)).is_err() {
            info!("voice table full, dropping {:?}", note);
            self.allocator.free(channel);
            return;
        }
        out.send(MidiEvent::MpeNoteOn {
            channel,
            note,
            velocity,
            pitch_bend,
        });
    }

    /// Ends a note: queues the note off and gives its channel back. Unknown
    /// notes are ignored.
    pub fn note_off<const N: usize>(&mut self, out: &mut MidiOutQueue<N>, note: Note, velocity: U7) {
        let Some(position) = self.active.iter().position(|&(n, _)| n == note) else {
            return;
        };
        let (_, channel) = self.active.swap_remove(position);
        out.send(MidiEvent::NoteOff {
            channel,
            note,
            velocity,
        });
        self.allocator.free(channel);
    }

    /// Ends every sounding note, e.g. on a mode change or panic.
    pub fn all_notes_off<const N: usize>(&mut self, out: &mut MidiOutQueue<N>) {
        while let Some((note, channel)) = self.active.pop() {
            out.send(MidiEvent::NoteOff {
                channel,
                note,
                velocity: U7::MIN,
            });
            self.allocator.free(channel);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.active.len()
    }
}
