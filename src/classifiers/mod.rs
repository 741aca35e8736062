//! Reference classifier collaborators: three structurally different
//! learners (distance-based, tree-based, linear) with deterministic
//! tie-breaks. Hosts may inject their own implementations instead.

pub mod knn;
pub mod logistic;
pub mod tree;

pub use knn::KNearest;
pub use logistic::Logistic;
pub use tree::Cart;
