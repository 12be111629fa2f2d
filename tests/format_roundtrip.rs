//! Property tests for the container writer/reader pair.
//!
//! The reader is the writer's only independent check, so these properties
//! pin their agreement down:
//! - Every written container parses back with identical sections
//! - Writing is deterministic byte for byte
//! - No truncation of a valid container goes unnoticed

use hf2flm::flm::{Dtype, FlmSummary, FlmWriter, FLM_VERSION};
use hf2flm::vocab::VocabEntry;

use proptest::collection::vec;
use proptest::prelude::*;

// ============================================================================
// Strategy helpers
// ============================================================================

fn dtype_strategy() -> impl Strategy<Value = Dtype> {
    prop_oneof![
        Just(Dtype::F32),
        Just(Dtype::F16),
        Just(Dtype::Q8),
        Just(Dtype::Q4),
    ]
}

/// Tensor with values sized to its shape; zero dims are allowed
fn tensor_strategy() -> impl Strategy<Value = (String, Vec<usize>, Vec<f32>, Dtype)> {
    ("[a-z][a-z0-9_.]{0,24}", vec(0usize..=6, 1..=3), dtype_strategy()).prop_flat_map(
        |(name, shape, dtype)| {
            let numel: usize = shape.iter().product();
            (
                Just(name),
                Just(shape),
                vec(-100.0f32..100.0, numel..=numel),
                Just(dtype),
            )
        },
    )
}

fn vocab_strategy() -> impl Strategy<Value = Vec<VocabEntry>> {
    vec(
        (vec(any::<u8>(), 0..12), any::<u32>(), -100.0f32..100.0),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(token, id, score)| VocabEntry { token, id, score })
            .collect()
    })
}

fn metadata_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    vec((".{0,16}", ".{0,24}"), 0..5)
}

fn write_container(
    metadata: &[(String, String)],
    vocab: &[VocabEntry],
    tensors: &[(String, Vec<usize>, Vec<f32>, Dtype)],
) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut writer = FlmWriter::new(&mut buf);
    writer
        .write_header(
            metadata.len() as u32,
            vocab.len() as u32,
            tensors.len() as u32,
        )
        .unwrap();
    writer.write_metadata(metadata).unwrap();
    writer.write_vocab(vocab).unwrap();
    for (name, shape, values, dtype) in tensors {
        writer.write_tensor(name, shape, values, *dtype).unwrap();
    }
    writer.finish().unwrap();
    buf
}

// ============================================================================
// Writer/reader agreement
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_written_container_parses_back(
        metadata in metadata_strategy(),
        vocab in vocab_strategy(),
        tensors in vec(tensor_strategy(), 0..5),
    ) {
        let buf = write_container(&metadata, &vocab, &tensors);
        let summary = FlmSummary::parse(&buf).unwrap();

        prop_assert_eq!(summary.version, FLM_VERSION);
        prop_assert_eq!(summary.file_size, buf.len());
        prop_assert_eq!(&summary.metadata, &metadata);
        prop_assert_eq!(&summary.vocab, &vocab);

        prop_assert_eq!(summary.tensors.len(), tensors.len());
        for (record, (name, shape, _, dtype)) in summary.tensors.iter().zip(&tensors) {
            prop_assert_eq!(&record.name, name);
            prop_assert_eq!(&record.shape, shape);
            prop_assert_eq!(record.dtype, *dtype);
        }
    }

    #[test]
    fn prop_container_bytes_are_deterministic(
        metadata in metadata_strategy(),
        vocab in vocab_strategy(),
        tensors in vec(tensor_strategy(), 0..5),
    ) {
        let first = write_container(&metadata, &vocab, &tensors);
        let second = write_container(&metadata, &vocab, &tensors);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_falsify_truncated_container_is_rejected(
        metadata in metadata_strategy(),
        vocab in vocab_strategy(),
        tensors in vec(tensor_strategy(), 1..4),
        cut in 1usize..32,
    ) {
        let buf = write_container(&metadata, &vocab, &tensors);
        // Keep at least one byte missing but never cut into nothing
        let cut = cut.min(buf.len() - 1);
        let truncated = &buf[..buf.len() - cut];
        prop_assert!(FlmSummary::parse(truncated).is_err());
    }
}
