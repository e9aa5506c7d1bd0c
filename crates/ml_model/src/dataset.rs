//! Dataset and batching for Burn training.

use burn::prelude::*;

use crate::{FeatureEncoder, TrainingData};

/// A single encoded listing.
#[derive(Debug, Clone)]
pub struct PriceDatasetItem {
    /// Encoded feature vector.
    pub features: Vec<f32>,
    /// Standardised target value.
    pub target: f32,
}

/// Dataset for price training.
#[derive(Debug, Clone)]
pub struct PriceDataset {
    items: Vec<PriceDatasetItem>,
}

impl PriceDataset {
    /// Encodes labelled rows with a fitted encoder.
    #[must_use]
    pub fn encode(data: &TrainingData, encoder: &FeatureEncoder) -> Self {
        let items = data
            .features
            .rows()
            .iter()
            .zip(&data.target)
            .map(|(row, &y)| PriceDatasetItem {
                features: encoder.encode_row(row).into_iter().map(|v| v as f32).collect(),
                target: encoder.scale_target(y) as f32,
            })
            .collect();
        Self { items }
    }
}

impl burn::data::dataset::Dataset<PriceDatasetItem> for PriceDataset {
    fn get(&self, index: usize) -> Option<PriceDatasetItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A batch of training data.
#[derive(Debug, Clone)]
pub struct PriceBatch<B: Backend> {
    /// Input features tensor of shape `[batch_size, n_features]`.
    pub inputs: Tensor<B, 2>,
    /// Target values tensor of shape `[batch_size, 1]`.
    pub targets: Tensor<B, 2>,
}

/// Batcher for creating training batches.
#[derive(Debug, Clone)]
pub struct PriceBatcher<B: Backend> {
    device: B::Device,
    n_features: usize,
}

impl<B: Backend> PriceBatcher<B> {
    /// Creates a new batcher for the given device.
    #[must_use]
    pub const fn new(device: B::Device, n_features: usize) -> Self {
        Self { device, n_features }
    }

    /// Creates a batch from a vector of items.
    pub fn batch(&self, items: Vec<PriceDatasetItem>) -> PriceBatch<B> {
        let batch_size = items.len();

        let mut features_data = Vec::with_capacity(batch_size * self.n_features);
        let mut targets_data = Vec::with_capacity(batch_size);

        for item in items {
            debug_assert_eq!(item.features.len(), self.n_features);
            features_data.extend_from_slice(&item.features);
            targets_data.push(item.target);
        }

        let inputs = Tensor::<B, 1>::from_floats(features_data.as_slice(), &self.device)
            .reshape([batch_size, self.n_features]);
        let targets = Tensor::<B, 1>::from_floats(targets_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        PriceBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::data::dataset::Dataset;
    use listing_structs::{FeatureFrame, FeatureValue};

    use super::*;

    type TestBackend = NdArray;

    fn data() -> TrainingData {
        let mut frame = FeatureFrame::new(vec!["Brand".into(), "Power_HP".into()]);
        for (brand, hp) in [("Audi", 150.0), ("Fiat", 70.0), ("Audi", 190.0)] {
            frame.push(vec![
                FeatureValue::Category(brand.into()),
                FeatureValue::Number(hp),
            ]);
        }
        TrainingData::new(frame, vec![90_000.0, 20_000.0, 120_000.0])
    }

    #[test]
    fn test_dataset_encodes_every_row() {
        let data = data();
        let encoder = FeatureEncoder::fit(&data.features, &data.target, &[0]).unwrap();
        let dataset = PriceDataset::encode(&data, &encoder);

        assert_eq!(dataset.len(), 3);
        let item = dataset.get(1).unwrap();
        assert_eq!(item.features.len(), 2);
        assert!(item.target < 0.0);
        assert!(dataset.get(3).is_none());
    }

    #[test]
    fn test_batch_shapes() {
        let data = data();
        let encoder = FeatureEncoder::fit(&data.features, &data.target, &[0]).unwrap();
        let dataset = PriceDataset::encode(&data, &encoder);
        let batcher = PriceBatcher::<TestBackend>::new(Default::default(), 2);

        let items: Vec<_> = (0..dataset.len()).filter_map(|i| dataset.get(i)).collect();
        let batch = batcher.batch(items);

        assert_eq!(batch.inputs.dims(), [3, 2]);
        assert_eq!(batch.targets.dims(), [3, 1]);
    }
}
