use std::mem;

use bytemuck::{Pod, Zeroable};

use crate::sampler::Sample;

/// GPU layout of one streamed point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 2],
    /// Position of the preceding sample; equals `position` when trails are off.
    pub previous: [f32; 2],
    pub color: [f32; 4],
    pub id: u32,
}

impl PointVertex {
    pub const STRIDE: usize = mem::size_of::<PointVertex>();
}

/// Fixed-capacity vertex arena repacked in place every frame.
#[derive(Debug, Clone)]
pub struct VertexStreamBuffer {
    vertices: Vec<PointVertex>,
    trails: bool,
}

impl VertexStreamBuffer {
    pub fn new(capacity: usize, trails: bool) -> Self {
        Self {
            vertices: vec![PointVertex::default(); capacity],
            trails,
        }
    }

    pub fn capacity(&self) -> usize {
        self.vertices.len()
    }

    pub fn trails(&self) -> bool {
        self.trails
    }

    /// Rewrites every vertex from `samples`.
    ///
    /// # Panics
    ///
    /// Panics when `samples.len()` differs from the arena capacity.
    pub fn repack(&mut self, samples: &[Sample]) {
        assert_eq!(
            samples.len(),
            self.vertices.len(),
            "sample count must match the vertex arena capacity"
        );

        for (index, sample) in samples.iter().enumerate() {
            let vertex = &mut self.vertices[index];
            vertex.position = sample.position;
            vertex.color = sample.color;
            vertex.id = sample.id;
            if !self.trails {
                vertex.previous = sample.position;
            }
        }

        if self.trails {
            if let Some(first) = samples.first() {
                self.vertices[0].previous = first.position;
            }
            for (vertex, sample) in self.vertices.iter_mut().skip(1).zip(samples) {
                vertex.previous = sample.position;
            }
        }
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                position: [i as f32, -(i as f32)],
                color: [1.0, 0.0, 0.0, 1.0],
                id: i as u32,
            })
            .collect()
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(PointVertex::STRIDE, 36);
    }

    #[test]
    fn trails_chain_each_vertex_to_its_predecessor() {
        let mut buffer = VertexStreamBuffer::new(4, true);
        buffer.repack(&samples(4));
        let vertices = buffer.vertices();
        assert_eq!(vertices[0].previous, vertices[0].position);
        for i in 1..4 {
            assert_eq!(vertices[i].previous, vertices[i - 1].position);
            assert_eq!(vertices[i].id, i as u32);
        }
    }

    #[test]
    fn without_trails_previous_mirrors_position() {
        let mut buffer = VertexStreamBuffer::new(3, false);
        buffer.repack(&samples(3));
        assert!(buffer.vertices().iter().all(|v| v.previous == v.position));
    }

    #[test]
    fn repack_overwrites_stale_frames() {
        let mut buffer = VertexStreamBuffer::new(3, true);
        buffer.repack(&samples(3));
        let shifted: Vec<Sample> = samples(3)
            .into_iter()
            .map(|mut s| {
                s.position[0] += 10.0;
                s
            })
            .collect();
        buffer.repack(&shifted);
        assert_eq!(buffer.vertices()[2].previous, [11.0, -1.0]);
        assert_eq!(buffer.as_bytes().len(), 3 * PointVertex::STRIDE);
    }

    #[test]
    #[should_panic(expected = "vertex arena capacity")]
    fn rejects_mismatched_sample_count() {
        let mut buffer = VertexStreamBuffer::new(4, false);
        buffer.repack(&samples(3));
    }
}
