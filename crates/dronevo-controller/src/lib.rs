//! Neural controllers encoded as flat genomes.
//!
//! This crate owns everything between a genome and a control command:
//!
//! 1. **Layer shape** ([`layer_shape`]) - Input width and the output width of
//!    every dense layer, which fixes the genome length.
//! 2. **Genome** ([`genome`]) - Flat, immutable weight vector plus random
//!    initialisation.
//! 3. **Codec** ([`codec`]) - Lossless mapping between a genome and its stack
//!    of weight matrices.
//! 4. **Controllers** ([`neural`], [`manual`]) - Implementations of
//!    [`dronevo_engine::Controller`].
//!
//! # Architecture
//!
//! ```text
//! Genome ──decode──► weight layers ──► NeuralController ──act──► ControlInput
//!    ▲                    │
//!    └──────encode────────┘
//! ```
//!
//! # Bias-free Layers
//!
//! Layers carry weights only. The genome length for shape `[n0, n1, ..., nk]`
//! is `Σ n_i * n_{i+1}`, and every element of the genome is a weight.
//!
//! # Example
//!
//! ```
//! use dronevo_controller::{
//!     codec, genome::Genome, layer_shape::LayerShape,
//!     neural::{NeuralController, ThresholdPolicy},
//! };
//! use dronevo_engine::Controller as _;
//!
//! let shape = LayerShape::new(vec![2, 3, 2]).unwrap();
//! let genome = Genome::from_vec(vec![0.1; shape.genome_len()]);
//! let layers = codec::decode(&genome, &shape).unwrap();
//! assert_eq!(codec::encode(&layers), genome);
//!
//! let controller = NeuralController::from_genome(&genome, &shape, ThresholdPolicy::SIGN).unwrap();
//! let _command = controller.act(&[10.0, -5.0]);
//! ```

pub mod codec;
pub mod genome;
pub mod layer_shape;
pub mod manual;
pub mod neural;

/// A genome's length does not match the weight count of the layer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("genome has {actual} weights but the layer shape needs {expected}")]
pub struct ShapeMismatchError {
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum LayerShapeError {
    #[display("layer shape needs at least an input and an output width, got {len} entries")]
    TooFewLayers { len: usize },
    #[display("layer width at index {index} is zero")]
    ZeroWidth { index: usize },
}
