use crate::error::RenderError;
use crate::request::Row;

/// A complete image: exactly one row per `y` in `[0, height)`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub rows: Vec<Row>,
}

impl RenderedImage {
    pub fn row(&self, y: u32) -> Option<&Row> {
        self.rows.get(y as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.row(y)?.pixels.get(x as usize).copied()
    }

    /// FNV-1a hash over every pixel, row by row.  Identical images hash
    /// identically, which makes renders easy to compare in logs.
    pub fn checksum(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        self.rows
            .iter()
            .flat_map(|row| row.pixels.iter())
            .flat_map(|p| p.to_le_bytes())
            .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
    }
}

/// Collects rows from every job of one render.
///
/// Rows may arrive in any order; each is placed at its own `y`.  Nothing is
/// handed out until every row is present, so a render that fails part-way
/// never exposes a partial image.
#[derive(Debug)]
pub struct Aggregator {
    width: u32,
    slots: Vec<Option<Vec<u32>>>,
    received: usize,
}

impl Aggregator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            slots: vec![None; height as usize],
            received: 0,
        }
    }

    /// Number of distinct rows received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Place one row.
    pub fn accept(&mut self, row: Row) -> crate::Result<()> {
        let height = self.slots.len();
        if row.pixels.len() != self.width as usize {
            return Err(RenderError::Aggregation {
                reason: format!(
                    "row {} has {} pixels, expected {}",
                    row.y,
                    row.pixels.len(),
                    self.width
                ),
            });
        }
        let slot = self
            .slots
            .get_mut(row.y as usize)
            .ok_or_else(|| RenderError::Aggregation {
                reason: format!("row {} is outside an image of height {height}", row.y),
            })?;
        if slot.is_some() {
            return Err(RenderError::Aggregation {
                reason: format!("row {} delivered twice", row.y),
            });
        }
        *slot = Some(row.pixels);
        self.received += 1;
        Ok(())
    }

    /// Hand out the finished image, or fail if any row is still missing.
    pub fn finish(self) -> crate::Result<RenderedImage> {
        let height = self.slots.len() as u32;
        if self.received != self.slots.len() {
            let first_missing = self.slots.iter().position(Option::is_none).unwrap_or(0);
            return Err(RenderError::Aggregation {
                reason: format!(
                    "{} of {height} rows missing (first missing row {first_missing})",
                    self.slots.len() - self.received
                ),
            });
        }
        let rows = self
            .slots
            .into_iter()
            .enumerate()
            .filter_map(|(y, pixels)| pixels.map(|p| Row::new(y as u32, p)))
            .collect();
        Ok(RenderedImage {
            width: self.width,
            height,
            rows,
        })
    }
}
