//! Conversion between genomes and weight matrices.
//!
//! Layer `i` is a `(shape[i], shape[i + 1])` matrix stored row-major in the
//! genome, and layers follow each other in forward order. [`decode`] is the
//! exact inverse of [`encode`]; a genome of the wrong length is rejected
//! instead of being truncated or padded.

use ndarray::Array2;
use rand::Rng;

use crate::{ShapeMismatchError, genome::Genome, layer_shape::LayerShape};

/// Weight matrix of one dense layer, `(inputs, outputs)`.
pub type WeightLayer = Array2<f32>;

/// Glorot-uniform weight layers for `shape`.
///
/// Each layer's weights are drawn from `[-limit, limit]` with
/// `limit = sqrt(6 / (fan_in + fan_out))`, the usual initialisation for
/// dense tanh layers.
pub fn random_layers<R>(shape: &LayerShape, rng: &mut R) -> Vec<WeightLayer>
where
    R: Rng + ?Sized,
{
    shape
        .layer_dims()
        .map(|(fan_in, fan_out)| {
            #[expect(clippy::cast_precision_loss)]
            let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
            Array2::from_shape_fn((fan_in, fan_out), |_| rng.random_range(-limit..=limit))
        })
        .collect()
}

/// Flattens weight layers into a genome.
#[must_use]
pub fn encode(layers: &[WeightLayer]) -> Genome {
    let len = layers.iter().map(|layer| layer.len()).sum();
    let mut weights = Vec::with_capacity(len);
    for layer in layers {
        // `iter` walks in logical row-major order whatever the memory layout.
        weights.extend(layer.iter().copied());
    }
    Genome::from_vec(weights)
}

/// Splits a genome into weight layers for `shape`.
pub fn decode(genome: &Genome, shape: &LayerShape) -> Result<Vec<WeightLayer>, ShapeMismatchError> {
    let mismatch = ShapeMismatchError {
        expected: shape.genome_len(),
        actual: genome.len(),
    };
    if genome.len() != shape.genome_len() {
        return Err(mismatch);
    }

    let mut rest = genome.as_slice();
    shape
        .layer_dims()
        .map(|(rows, cols)| {
            let (head, tail) = rest.split_at(rows * cols);
            rest = tail;
            Array2::from_shape_vec((rows, cols), head.to_vec()).map_err(|_| mismatch)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_roundtrip_for_various_shapes() {
        let mut rng = Pcg32::seed_from_u64(3);
        for sizes in [vec![2, 2], vec![6, 2], vec![2, 5, 2], vec![6, 8, 4, 2], vec![1, 1]] {
            let shape = LayerShape::new(sizes).unwrap();
            let layers = random_layers(&shape, &mut rng);
            let genome = encode(&layers);
            assert_eq!(genome.len(), shape.genome_len());
            assert_eq!(decode(&genome, &shape).unwrap(), layers);
        }
    }

    #[test]
    fn test_random_layers_have_layer_dims() {
        let shape = LayerShape::new(vec![6, 4, 2]).unwrap();
        let layers = random_layers(&shape, &mut Pcg32::seed_from_u64(5));
        let dims = layers.iter().map(|layer| layer.dim()).collect::<Vec<_>>();
        assert_eq!(dims, [(6, 4), (4, 2)]);
    }

    #[test]
    fn test_decode_is_row_major_in_forward_order() {
        let shape = LayerShape::new(vec![2, 3, 1]).unwrap();
        let genome = Genome::from_vec((0..9u8).map(f32::from).collect());
        let layers = decode(&genome, &shape).unwrap();
        assert_eq!(layers[0], array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        assert_eq!(layers[1], array![[6.0], [7.0], [8.0]]);
    }

    #[test]
    fn test_encode_ignores_memory_layout() {
        let transposed = array![[0.0, 2.0], [1.0, 3.0]].reversed_axes();
        let genome = encode(&[transposed]);
        assert_eq!(genome.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_wrong_length_is_shape_mismatch() {
        let shape = LayerShape::new(vec![2, 3, 2]).unwrap();
        for len in [0, 11, 13, 24] {
            let genome = Genome::from_vec(vec![0.0; len]);
            assert_eq!(
                decode(&genome, &shape),
                Err(ShapeMismatchError {
                    expected: 12,
                    actual: len
                })
            );
        }
    }
}
