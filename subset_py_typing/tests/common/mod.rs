//! Shared helpers for integration tests
// This helper module is consumed selectively by several integration test
// files. Keep the fixtures available without forcing every helper to be
// referenced in each individual test target.
#![allow(dead_code)]

use subset_py_typing::ast::NodeId;
use subset_py_typing::{Dtype, Inference, ModelInfo, TensorKind, Type};

/// Rendered type of one node, panicking with the id when it was never
/// inferred. Assertion tables lean on this for readable failures.
pub fn ty(inference: &Inference, id: NodeId) -> String {
    inference
        .table
        .rendered(id)
        .unwrap_or_else(|| panic!("node {id} has no inferred type"))
}

/// A bare ndarray with no dtype or shape refinement, the usual parameter
/// type of a chainer-style link.
pub fn any_ndarray() -> Type {
    Type::tensor(TensorKind::Ndarray, None, None)
}

/// A bare torch tensor with no dtype or shape refinement.
pub fn any_torch_tensor() -> Type {
    Type::tensor(TensorKind::Torch, None, None)
}

/// A three-layer perceptron in the chainer style: `l1` and `l2` map any
/// ndarray to a `(1, 1000)` hidden activation, `l3` maps to the ten-class
/// output.
pub fn mlp_model() -> ModelInfo {
    let hidden = Type::ndarray_shaped(Dtype::Float32, vec![1, 1000]);
    let out = Type::ndarray_shaped(Dtype::Float32, vec![1, 10]);
    ModelInfo::new("MLP")
        .with_attr("l1", Type::arrow(vec![any_ndarray()], hidden.clone()))
        .with_attr("l2", Type::arrow(vec![any_ndarray()], hidden))
        .with_attr("l3", Type::arrow(vec![any_ndarray()], out))
}

/// A flattened MNIST batch of one, the input `mlp_model` expects.
pub fn mlp_input() -> Type {
    Type::ndarray_shaped(Dtype::Float32, vec![1, 784])
}

/// An AlexNet-style torch module: `features` produces the final
/// convolutional map, `avgpool` keeps it at `(1, 256, 6, 6)`, and
/// `classifier` consumes the flattened `(1, 9216)` activation.
pub fn alexnet_model() -> ModelInfo {
    let conv_map = Type::torch_tensor(Dtype::Float32, vec![1, 256, 6, 6]);
    let logits = Type::torch_tensor(Dtype::Float32, vec![1, 1000]);
    ModelInfo::new("AlexNet")
        .with_attr("features", Type::arrow(vec![any_torch_tensor()], conv_map.clone()))
        .with_attr("avgpool", Type::arrow(vec![any_torch_tensor()], conv_map))
        .with_attr("classifier", Type::arrow(vec![any_torch_tensor()], logits))
}

/// A single imagenet-sized image batch, the input `alexnet_model` expects.
pub fn alexnet_input() -> Type {
    Type::torch_tensor(Dtype::Float32, vec![1, 3, 224, 224])
}

/// The diagnostic messages of a run, for assertions that do not care about
/// severity or line.
pub fn diagnostic_messages(inference: &Inference) -> Vec<String> {
    inference
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect()
}
