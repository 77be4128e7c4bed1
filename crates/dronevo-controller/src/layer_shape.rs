use serde::{Deserialize, Serialize};

use crate::LayerShapeError;

/// Widths of a dense, bias-free network: `[input, hidden..., output]`.
///
/// Always has at least two entries and no zero widths. Serialized as a plain
/// JSON array.
///
/// # Example
///
/// ```
/// use dronevo_controller::layer_shape::LayerShape;
///
/// let shape = LayerShape::new(vec![6, 4, 2]).unwrap();
/// assert_eq!(shape.genome_len(), 6 * 4 + 4 * 2);
/// assert_eq!(shape.layer_dims().collect::<Vec<_>>(), [(6, 4), (4, 2)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct LayerShape(pub(crate) Vec<usize>);

impl LayerShape {
    pub fn new(sizes: Vec<usize>) -> Result<Self, LayerShapeError> {
        if sizes.len() < 2 {
            return Err(LayerShapeError::TooFewLayers { len: sizes.len() });
        }
        if let Some(index) = sizes.iter().position(|&n| n == 0) {
            return Err(LayerShapeError::ZeroWidth { index });
        }
        Ok(Self(sizes))
    }

    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn input_width(&self) -> usize {
        self.0[0]
    }

    #[must_use]
    pub fn output_width(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    /// `(rows, cols)` of every weight matrix, in forward order.
    pub fn layer_dims(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    /// Number of weights a genome for this shape must contain.
    #[must_use]
    pub fn genome_len(&self) -> usize {
        self.layer_dims().map(|(rows, cols)| rows * cols).sum()
    }
}

impl TryFrom<Vec<usize>> for LayerShape {
    type Error = LayerShapeError;

    fn try_from(sizes: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(sizes)
    }
}

impl From<LayerShape> for Vec<usize> {
    fn from(shape: LayerShape) -> Self {
        shape.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_single_entry() {
        assert_eq!(
            LayerShape::new(vec![4]),
            Err(LayerShapeError::TooFewLayers { len: 1 })
        );
    }

    #[test]
    fn test_rejects_zero_width() {
        assert_eq!(
            LayerShape::new(vec![2, 0, 2]),
            Err(LayerShapeError::ZeroWidth { index: 1 })
        );
    }

    #[test]
    fn test_serializes_as_array() {
        let shape = LayerShape::new(vec![6, 2]).unwrap();
        assert_eq!(serde_json::to_string(&shape).unwrap(), "[6,2]");
        let parsed: LayerShape = serde_json::from_str("[2,5,2]").unwrap();
        assert_eq!(parsed.genome_len(), 20);
        assert!(serde_json::from_str::<LayerShape>("[3]").is_err());
    }
}
