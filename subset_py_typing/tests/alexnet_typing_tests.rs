//! Integration tests: a torch-style AlexNet forward pass, tracking the
//! activation shape from the convolutional map through `torch.flatten` to
//! the classifier logits: `(1, 256, 6, 6)` to `(1, 9216)` to `(1, 1000)`.

mod common;
use common::*;

use subset_py_typing::testtools::infer_types;
use subset_py_typing::{Dtype, Type};

// ==================== The forward pass ====================

#[test]
fn test_alexnet_forward_pass_types_every_node() {
    let src = r#"
        def forward(self, x):
            h = self.features(x)
            h = self.avgpool(h)
            h = torch.flatten(h, start_dim=1)
            h = self.classifier(h)
            return h
    "#;
    let model = alexnet_model();
    let (_module, inf) = infer_types(src, &[alexnet_input()], Some(&model)).unwrap();

    assert_eq!(
        inf.return_type,
        Type::torch_tensor(Dtype::Float32, vec![1, 1000])
    );

    assert_eq!(
        ty(&inf, 1),
        "class AlexNet -> torch.Tensor(float32, (1, 3, 224, 224)) -> torch.Tensor(float32, (1, 1000))"
    ); // line 1
    assert_eq!(ty(&inf, 4), "NoneType"); // line 2
    assert_eq!(ty(&inf, 5), "torch.Tensor(float32, (1, 256, 6, 6))"); // line 2
    assert_eq!(ty(&inf, 6), "torch.Tensor(float32, (1, 256, 6, 6))"); // line 2
    assert_eq!(
        ty(&inf, 7),
        "torch.Tensor -> torch.Tensor(float32, (1, 256, 6, 6))"
    ); // line 2
    assert_eq!(ty(&inf, 8), "class AlexNet"); // line 2
    assert_eq!(ty(&inf, 9), "torch.Tensor(float32, (1, 3, 224, 224))"); // line 2
    assert_eq!(ty(&inf, 10), "NoneType"); // line 3
    assert_eq!(ty(&inf, 11), "torch.Tensor(float32, (1, 256, 6, 6))"); // line 3
    assert_eq!(ty(&inf, 12), "torch.Tensor(float32, (1, 256, 6, 6))"); // line 3
    assert_eq!(
        ty(&inf, 13),
        "torch.Tensor -> torch.Tensor(float32, (1, 256, 6, 6))"
    ); // line 3
    assert_eq!(ty(&inf, 14), "class AlexNet"); // line 3
    assert_eq!(ty(&inf, 15), "torch.Tensor(float32, (1, 256, 6, 6))"); // line 3
    assert_eq!(ty(&inf, 16), "NoneType"); // line 4
    assert_eq!(ty(&inf, 17), "torch.Tensor(float32, (1, 9216))"); // line 4
    assert_eq!(ty(&inf, 18), "torch.Tensor(float32, (1, 9216))"); // line 4
    assert_eq!(
        ty(&inf, 19),
        "torch.Tensor(float32, (1, 256, 6, 6)) -> torch.Tensor(float32, (1, 9216))"
    ); // line 4
    assert_eq!(ty(&inf, 20), "Any"); // line 4
    assert_eq!(ty(&inf, 21), "torch.Tensor(float32, (1, 256, 6, 6))"); // line 4
    assert_eq!(ty(&inf, 22), "int"); // the start_dim keyword value, line 4
    assert_eq!(ty(&inf, 23), "NoneType"); // line 5
    assert_eq!(ty(&inf, 24), "torch.Tensor(float32, (1, 1000))"); // line 5
    assert_eq!(ty(&inf, 25), "torch.Tensor(float32, (1, 1000))"); // line 5
    assert_eq!(
        ty(&inf, 26),
        "torch.Tensor -> torch.Tensor(float32, (1, 1000))"
    ); // line 5
    assert_eq!(ty(&inf, 27), "class AlexNet"); // line 5
    assert_eq!(ty(&inf, 28), "torch.Tensor(float32, (1, 9216))"); // line 5
    assert_eq!(ty(&inf, 29), "torch.Tensor(float32, (1, 1000))"); // line 6
    assert_eq!(ty(&inf, 30), "torch.Tensor(float32, (1, 1000))"); // line 6

    assert_eq!(inf.nodes.missing(&inf.table), Vec::<usize>::new());
    assert!(inf.diagnostics.is_empty());
}

// ==================== Flatten variants ====================

#[test]
fn test_flatten_without_start_dim_collapses_everything() {
    let src = r#"
        def forward(self, x):
            h = self.avgpool(self.features(x))
            return torch.flatten(h)
    "#;
    let model = alexnet_model();
    let (_module, inf) = infer_types(src, &[alexnet_input()], Some(&model)).unwrap();
    assert_eq!(
        inf.return_type,
        Type::torch_tensor(Dtype::Float32, vec![9216])
    );
}

#[test]
fn test_flatten_with_unknown_start_dim_drops_the_shape() {
    let src = r#"
        def forward(self, x, k):
            h = self.features(x)
            return torch.flatten(h, k)
    "#;
    let model = alexnet_model();
    let (_module, inf) =
        infer_types(src, &[alexnet_input(), Type::int()], Some(&model)).unwrap();
    assert_eq!(
        inf.return_type,
        Type::tensor(subset_py_typing::TensorKind::Torch, Some(Dtype::Float32), None)
    );
}

// ==================== Activations and dropout ====================

#[test]
fn test_tanh_and_dropout_keep_the_activation_type() {
    let src = r#"
        def forward(self, x):
            h = self.features(x)
            h = torch.tanh(h)
            h = F.dropout(h)
            return h
    "#;
    let model = alexnet_model();
    let (_module, inf) = infer_types(src, &[alexnet_input()], Some(&model)).unwrap();
    assert_eq!(
        inf.return_type,
        Type::torch_tensor(Dtype::Float32, vec![1, 256, 6, 6])
    );
}

// ==================== Call validation ====================

#[test]
fn test_model_arrows_reject_keyword_arguments() {
    let src = r#"
        def forward(self, x):
            h = self.features(x)
            return self.classifier(h, dim=1)
    "#;
    let model = alexnet_model();
    let err = infer_types(src, &[alexnet_input()], Some(&model)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "line 3: self.classifier() got an unexpected keyword argument 'dim'"
    );
}

#[test]
fn test_model_arrows_reject_a_tensor_of_the_wrong_family() {
    let src = r#"
        def forward(self, x):
            return self.features(x)
    "#;
    let model = alexnet_model();
    let ndarray_input = Type::ndarray_shaped(Dtype::Float32, vec![1, 3, 224, 224]);
    let err = infer_types(src, &[ndarray_input], Some(&model)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "line 2: self.features() argument 1 expects torch.Tensor, \
         got ndarray(float32, (1, 3, 224, 224))"
    );
}

#[test]
fn test_model_arrows_check_arity() {
    let src = r#"
        def forward(self, x):
            return self.classifier(x, x)
    "#;
    let model = alexnet_model();
    let err = infer_types(src, &[alexnet_input()], Some(&model)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "line 2: self.classifier() takes 1 arguments but 2 were given"
    );
}
