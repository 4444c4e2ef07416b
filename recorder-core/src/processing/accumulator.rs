use crate::models::error::RecorderError;
use crate::processing::codec;

/// Append-only list of captured chunks for one channel.
#[derive(Debug, Default, Clone)]
pub struct ChannelBuffer {
    chunks: Vec<Vec<f32>>,
    len: usize,
}

impl ChannelBuffer {
    pub fn push(&mut self, chunk: Vec<f32>) {
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    /// Cumulative sample count across all chunks.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunks(&self) -> &[Vec<f32>] {
        &self.chunks
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }
}

/// Growing per-channel sample store.
///
/// Chunks are kept as delivered and only merged when a snapshot is taken,
/// so ingest costs O(channels) no matter how long the recording runs.
/// Owned by exactly one thread; not meant to be shared behind a lock.
#[derive(Debug)]
pub struct Accumulator {
    channels: Vec<ChannelBuffer>,
    length: usize,
}

impl Accumulator {
    pub fn new(num_channels: usize) -> Self {
        Self {
            channels: vec![ChannelBuffer::default(); num_channels],
            length: 0,
        }
    }

    /// Append one chunk to each channel.
    ///
    /// The cumulative length advances by channel 0's chunk length; callers
    /// deliver equal-length chunks per period. A wrong chunk count is
    /// rejected before anything is appended.
    pub fn ingest(&mut self, chunks: Vec<Vec<f32>>) -> Result<(), RecorderError> {
        if chunks.len() != self.channels.len() {
            return Err(RecorderError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: chunks.len(),
            });
        }

        let advance = chunks.first().map(Vec::len).unwrap_or(0);
        for (channel, chunk) in self.channels.iter_mut().zip(chunks) {
            channel.push(chunk);
        }
        self.length += advance;
        Ok(())
    }

    /// Merge every channel into one contiguous buffer. Does not consume
    /// or alter the accumulated chunks.
    pub fn snapshot(&self) -> Result<Vec<Vec<f32>>, RecorderError> {
        self.channels
            .iter()
            .map(|channel| codec::merge_buffers(channel.chunks(), self.length))
            .collect()
    }

    /// Snapshot followed by interleaving.
    pub fn interleaved(&self) -> Result<Vec<f32>, RecorderError> {
        let buffers = self.snapshot()?;
        codec::interleave(&buffers)
    }

    /// Drop everything buffered so far. Ingest may continue right away.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
        self.length = 0;
    }

    /// Samples per channel accumulated so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of ingests since creation or the last reset.
    pub fn chunk_count(&self) -> usize {
        self.channels.first().map(|c| c.chunks().len()).unwrap_or(0)
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelBuffer> {
        self.channels.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_and_snapshot() {
        let mut acc = Accumulator::new(2);
        acc.ingest(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        acc.ingest(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();

        assert_eq!(acc.len(), 4);
        assert_eq!(acc.chunk_count(), 2);
        let snapshot = acc.snapshot().unwrap();
        assert_eq!(snapshot, vec![vec![1.0, 2.0, 5.0, 6.0], vec![3.0, 4.0, 7.0, 8.0]]);
    }

    #[test]
    fn length_is_ingests_times_buffer_len() {
        let buffer_len = 256;
        let mut acc = Accumulator::new(2);
        for n in 0..10 {
            let chunk = vec![n as f32; buffer_len];
            acc.ingest(vec![chunk.clone(), chunk]).unwrap();
        }

        assert_eq!(acc.len(), 10 * buffer_len);
        for index in 0..2 {
            assert_eq!(acc.channel(index).unwrap().len(), 10 * buffer_len);
        }
        for buffer in acc.snapshot().unwrap() {
            assert_eq!(buffer.len(), 10 * buffer_len);
        }
    }

    #[test]
    fn snapshot_does_not_consume() {
        let mut acc = Accumulator::new(1);
        acc.ingest(vec![vec![0.5; 4]]).unwrap();

        let first = acc.snapshot().unwrap();
        let second = acc.snapshot().unwrap();
        assert_eq!(first, second);

        acc.ingest(vec![vec![0.25; 4]]).unwrap();
        assert_eq!(acc.snapshot().unwrap()[0].len(), 8);
    }

    #[test]
    fn reset_clears_every_channel() {
        let mut acc = Accumulator::new(2);
        acc.ingest(vec![vec![1.0; 8], vec![2.0; 8]]).unwrap();
        acc.reset();

        assert!(acc.is_empty());
        assert_eq!(acc.chunk_count(), 0);
        let snapshot = acc.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(Vec::is_empty));

        acc.ingest(vec![vec![3.0; 2], vec![4.0; 2]]).unwrap();
        assert_eq!(acc.snapshot().unwrap(), vec![vec![3.0, 3.0], vec![4.0, 4.0]]);
    }

    #[test]
    fn wrong_chunk_count_appends_nothing() {
        let mut acc = Accumulator::new(2);
        let err = acc.ingest(vec![vec![1.0; 4]]).unwrap_err();
        assert_eq!(err, RecorderError::ChannelCountMismatch { expected: 2, actual: 1 });
        assert!(acc.is_empty());
        assert!(acc.channel(0).unwrap().is_empty());
    }

    #[test]
    fn unequal_chunks_surface_on_snapshot() {
        let mut acc = Accumulator::new(2);
        acc.ingest(vec![vec![1.0; 4], vec![1.0; 3]]).unwrap();

        let err = acc.snapshot().unwrap_err();
        assert_eq!(err, RecorderError::LengthMismatch { expected: 4, actual: 3 });
    }

    #[test]
    fn interleaved_stereo() {
        let mut acc = Accumulator::new(2);
        acc.ingest(vec![vec![1.0, 2.0], vec![-1.0, -2.0]]).unwrap();
        assert_eq!(acc.interleaved().unwrap(), vec![1.0, -1.0, 2.0, -2.0]);
    }
}
