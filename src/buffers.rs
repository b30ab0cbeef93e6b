//! Role-tagged double buffering.
//!
//! The GPU update pass writes particle state while the render pass reads the
//! previous frame's state, so the two must never share a storage. Instead of
//! ping-ponging raw indices, the buffer pair is modeled as two fixed slots
//! with a role bit: one slot is "read", the other is "write", and `rotate()`
//! swaps the labels. Data never moves. The actual `wgpu::Buffer` objects
//! live in the GPU layer, keyed by [`Slot`], which keeps this protocol
//! testable without a device.

/// Identifier for one of the two particle storages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// The other slot.
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Index into per-slot GPU resource arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// A pair of equally sized particle storages with read/write roles.
///
/// Invariant: the read slot and the write slot are always distinct; the type
/// stores only which slot is currently "read", so aliasing is
/// unrepresentable.
#[derive(Debug)]
pub struct ParticleBufferSet {
    read: Slot,
}

impl ParticleBufferSet {
    /// Create a buffer set with slot A in the read role.
    pub fn new() -> Self {
        Self { read: Slot::A }
    }

    /// The slot holding last frame's particle state.
    pub fn read(&self) -> Slot {
        self.read
    }

    /// The slot the update pass writes into this frame.
    pub fn write(&self) -> Slot {
        self.read.other()
    }

    /// Swap the role labels and return the new `(read, write)` assignment.
    ///
    /// The buffer just written becomes next frame's read source. No data is
    /// copied.
    pub fn rotate(&mut self) -> (Slot, Slot) {
        self.read = self.read.other();
        (self.read(), self.write())
    }
}

impl Default for ParticleBufferSet {
    fn default() -> Self {
        Self::new()
    }
}
