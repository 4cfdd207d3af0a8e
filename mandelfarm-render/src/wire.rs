//! Fixed-width binary encoding for tasks and their outcomes.
//!
//! This is the contract between the dispatcher and a worker that may live in
//! another process.  Every message starts with a four-byte header:
//!
//! ```text
//! b'M' b'F'  version: u8  kind: u8
//! ```
//!
//! followed by a body made only of little-endian `u8`/`u32`/`f64` fields and
//! length-prefixed UTF-8 strings:
//!
//! ```text
//! request  = first_row:u32 width:u32 height:u32 min_x:f64 min_y:f64 scale:f64
//! task     = index:u32 id:str request
//! outcome  = index:u32 task_id:str status:u8 (rows | message:str)
//! rows     = count:u32 { y:u32 len:u32 pixel:u32* }*
//! str      = len:u32 utf8-bytes
//! ```

use thiserror::Error;

use mandelfarm_core::{CoreError, PlaneOrigin, ViewState};

use crate::request::{RenderRequest, Row, Task, TaskOutcome};

/// Current version of the encoding.  Decoders reject anything else.
pub const WIRE_VERSION: u8 = 1;

const MAGIC: [u8; 2] = *b"MF";

const KIND_TASK: u8 = 1;
const KIND_OUTCOME: u8 = 2;

const STATUS_OK: u8 = 0;
const STATUS_FAILED: u8 = 1;

/// Errors from decoding a wire message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("message truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("bad magic bytes {0:02x?}")]
    BadMagic([u8; 2]),

    #[error("unsupported wire version {found} (expected {})", WIRE_VERSION)]
    UnsupportedVersion { found: u8 },

    #[error("unexpected message kind {found} (expected {expected})")]
    UnexpectedKind { found: u8, expected: u8 },

    #[error("unknown task status {0}")]
    UnknownStatus(u8),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid view state: {0}")]
    InvalidView(#[from] CoreError),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Encode a task for shipment to a worker.
pub fn encode_task(task: &Task) -> Vec<u8> {
    let mut w = Writer::new(KIND_TASK);
    w.u32(task.index as u32);
    w.str(&task.id);
    w.request(&task.request);
    w.finish()
}

pub fn decode_task(bytes: &[u8]) -> Result<Task, WireError> {
    let mut r = Reader::new(bytes, KIND_TASK)?;
    let index = r.u32()? as usize;
    let id = r.str()?;
    let request = r.request()?;
    r.finish()?;
    Ok(Task { id, index, request })
}

/// Encode a worker's report for one task.
pub fn encode_outcome(outcome: &TaskOutcome) -> Vec<u8> {
    let mut w = Writer::new(KIND_OUTCOME);
    w.u32(outcome.index as u32);
    w.str(&outcome.task_id);
    match &outcome.result {
        Ok(rows) => {
            w.u8(STATUS_OK);
            w.u32(rows.len() as u32);
            for row in rows {
                w.row(row);
            }
        }
        Err(message) => {
            w.u8(STATUS_FAILED);
            w.str(message);
        }
    }
    w.finish()
}

pub fn decode_outcome(bytes: &[u8]) -> Result<TaskOutcome, WireError> {
    let mut r = Reader::new(bytes, KIND_OUTCOME)?;
    let index = r.u32()? as usize;
    let task_id = r.str()?;
    let result = match r.u8()? {
        STATUS_OK => {
            let count = r.u32()? as usize;
            let mut rows = Vec::with_capacity(count.min(r.remaining()));
            for _ in 0..count {
                rows.push(r.row()?);
            }
            Ok(rows)
        }
        STATUS_FAILED => Err(r.str()?),
        other => return Err(WireError::UnknownStatus(other)),
    };
    r.finish()?;
    Ok(TaskOutcome {
        task_id,
        index,
        result,
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new(kind: u8) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&MAGIC);
        buf.push(WIRE_VERSION);
        buf.push(kind);
        Self { buf }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn request(&mut self, request: &RenderRequest) {
        let origin = request.view.origin();
        self.u32(request.first_row);
        self.u32(request.width);
        self.u32(request.height);
        self.f64(origin.min_x);
        self.f64(origin.min_y);
        self.f64(request.view.scale());
    }

    fn row(&mut self, row: &Row) {
        self.u32(row.y);
        self.u32(row.pixels.len() as u32);
        self.buf.reserve(row.pixels.len() * 4);
        for &pixel in &row.pixels {
            self.u32(pixel);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Check the header and position the reader at the body.
    fn new(buf: &'a [u8], expected_kind: u8) -> Result<Self, WireError> {
        let mut r = Self { buf, pos: 0 };
        let magic = r.take(2)?;
        if magic != MAGIC {
            return Err(WireError::BadMagic([magic[0], magic[1]]));
        }
        let version = r.u8()?;
        if version != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion { found: version });
        }
        let kind = r.u8()?;
        if kind != expected_kind {
            return Err(WireError::UnexpectedKind {
                found: kind,
                expected: expected_kind,
            });
        }
        Ok(r)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        self.array().map(u32::from_le_bytes)
    }

    fn f64(&mut self) -> Result<f64, WireError> {
        self.array().map(f64::from_le_bytes)
    }

    fn str(&mut self) -> Result<String, WireError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }

    fn request(&mut self) -> Result<RenderRequest, WireError> {
        let first_row = self.u32()?;
        let width = self.u32()?;
        let height = self.u32()?;
        let origin = PlaneOrigin::new(self.f64()?, self.f64()?);
        let view = ViewState::new(origin, self.f64()?)?;
        Ok(RenderRequest {
            first_row,
            width,
            height,
            view,
        })
    }

    fn row(&mut self) -> Result<Row, WireError> {
        let y = self.u32()?;
        let len = self.u32()? as usize;
        let bytes = self.take(len.saturating_mul(4))?;
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Row::new(y, pixels))
    }

    fn finish(self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WireError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: "job-3-4-7-task-2".into(),
            index: 2,
            request: RenderRequest {
                first_row: 40,
                width: 320,
                height: 20,
                view: ViewState::new(PlaneOrigin::new(-0.743_643_887, 0.131_825_904), 1e-9)
                    .unwrap(),
            },
        }
    }

    #[test]
    fn task_layout_is_fixed_width() {
        let t = task();
        let bytes = encode_task(&t);
        // header + index + (len + id) + 3×u32 + 3×f64
        assert_eq!(bytes.len(), 4 + 4 + 4 + t.id.len() + 12 + 24);
        assert_eq!(&bytes[..4], &[b'M', b'F', WIRE_VERSION, KIND_TASK]);
        assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
    }

    #[test]
    fn task_preserves_coordinates_bit_for_bit() {
        let t = task();
        let decoded = decode_task(&encode_task(&t)).unwrap();
        assert_eq!(decoded, t);
        assert_eq!(
            decoded.request.view.origin().min_x.to_bits(),
            t.request.view.origin().min_x.to_bits()
        );
    }

    #[test]
    fn outcome_with_rows() {
        let outcome = TaskOutcome {
            task_id: "job-0-0-3-task-1".into(),
            index: 1,
            result: Ok(vec![
                Row::new(5, vec![0xFF00_0000, 0xFFFF_FF00]),
                Row::new(6, vec![0xFF12_3456, 0xFF65_4321]),
            ]),
        };
        assert_eq!(decode_outcome(&encode_outcome(&outcome)).unwrap(), outcome);
    }

    #[test]
    fn outcome_with_failure() {
        let outcome = TaskOutcome {
            task_id: "job-0-0-3-task-3".into(),
            index: 3,
            result: Err("node crashed".into()),
        };
        assert_eq!(decode_outcome(&encode_outcome(&outcome)).unwrap(), outcome);
    }

    #[test]
    fn rejects_other_versions() {
        let mut bytes = encode_task(&task());
        bytes[2] = WIRE_VERSION + 1;
        assert_eq!(
            decode_task(&bytes),
            Err(WireError::UnsupportedVersion {
                found: WIRE_VERSION + 1
            })
        );
    }

    #[test]
    fn rejects_wrong_kind_and_magic() {
        let bytes = encode_task(&task());
        assert!(matches!(
            decode_outcome(&bytes),
            Err(WireError::UnexpectedKind { found: KIND_TASK, .. })
        ));
        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(matches!(decode_task(&bad), Err(WireError::BadMagic(_))));
    }

    #[test]
    fn rejects_truncated_and_trailing_bytes() {
        let bytes = encode_task(&task());
        assert!(matches!(
            decode_task(&bytes[..bytes.len() - 3]),
            Err(WireError::Truncated { needed: 3, .. })
        ));
        let mut long = bytes.clone();
        long.push(0);
        assert_eq!(decode_task(&long), Err(WireError::TrailingBytes(1)));
    }

    #[test]
    fn rejects_invalid_scale() {
        let mut bytes = encode_task(&task());
        let n = bytes.len();
        bytes[n - 8..].copy_from_slice(&(-1.0f64).to_le_bytes());
        assert!(matches!(decode_task(&bytes), Err(WireError::InvalidView(_))));
    }
}
