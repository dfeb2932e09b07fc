use driftsim_core::Particle;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use thiserror::Error;

// --- Error Type ---
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("binary encoding failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("send failed: {0}")]
    Io(#[from] io::Error),
}

// --- Frame Model ---

/// One particle as exposed to a drawing surface: simulation fields plus the
/// position already translated into canvas coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FrameParticle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub age: u64,
}

/// A rendered snapshot of the particle collection after one tick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub tick: u64,
    pub particles: Vec<FrameParticle>,
}

// --- Traits ---

/// Serializes a frame into a byte representation.
pub trait Serializer: Send + Sync {
    fn serialize(&self, frame: &Frame) -> Result<Vec<u8>, TransportError>;
}

/// Sends serialized frame data to a destination.
pub trait Sender {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;
}

/// Consumes a read-only particle snapshot after each tick and presents it.
/// Implementations must not mutate the snapshot.
pub trait Renderer {
    fn render(&mut self, snapshot: &[Particle]) -> Result<(), TransportError>;
}

// --- Implementations ---

/// Serializes frames to JSON.
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, frame: &Frame) -> Result<Vec<u8>, TransportError> {
        Ok(serde_json::to_vec(frame)?)
    }
}

/// Serializes frames with bincode, base64-framed so the output stays safe
/// for line-oriented transports.
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn serialize(&self, frame: &Frame) -> Result<Vec<u8>, TransportError> {
        let raw = bincode::serialize(frame)?;
        Ok(base64::encode(&raw).into_bytes())
    }
}

/// Sends each frame as one line on standard output.
pub struct StdioSender {
    stdout: io::Stdout,
}

impl StdioSender {
    pub fn new() -> Self {
        StdioSender {
            stdout: io::stdout(),
        }
    }
}

impl Sender for StdioSender {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stdout.write_all(data)?;
        self.stdout.write_all(b"\n")?;
        self.stdout.flush()?; // Ensure it's written immediately
        Ok(())
    }
}

impl Default for StdioSender {
    fn default() -> Self {
        Self::new()
    }
}

/// The default renderer: builds a frame from the snapshot, translating
/// positions to a canvas whose origin sits at its center, then serializes
/// and sends it.
pub struct SnapshotRenderer {
    serializer: Box<dyn Serializer>,
    sender: Box<dyn Sender>,
    offset_x: f64,
    offset_y: f64,
    tick: u64,
}

impl SnapshotRenderer {
    pub fn new(
        serializer: Box<dyn Serializer>,
        sender: Box<dyn Sender>,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Self {
        SnapshotRenderer {
            serializer,
            sender,
            offset_x: canvas_width / 2.0,
            offset_y: canvas_height / 2.0,
            tick: 0,
        }
    }

    fn build_frame(&self, snapshot: &[Particle]) -> Frame {
        let particles = snapshot
            .iter()
            .map(|p| FrameParticle {
                id: p.id,
                x: p.x + self.offset_x,
                y: p.y + self.offset_y,
                vx: p.vx,
                vy: p.vy,
                age: p.age,
            })
            .collect();
        Frame {
            tick: self.tick,
            particles,
        }
    }
}

impl Renderer for SnapshotRenderer {
    fn render(&mut self, snapshot: &[Particle]) -> Result<(), TransportError> {
        self.tick += 1;
        let frame = self.build_frame(snapshot);
        let data = self.serializer.serialize(&frame)?;
        self.sender.send(&data)
    }
}
