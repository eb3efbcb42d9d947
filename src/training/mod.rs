//! Model training module
//!
//! Regression estimators implemented on `ndarray`:
//! - Decision tree (CART, squared-error splits)
//! - Random forest (bootstrapped trees built in parallel)
//! - Linear regression (normal equations, Cholesky)
//!
//! plus the seeded holdout split, regression metrics and the [`Trainer`]
//! that fits every configured candidate and keeps the best by R².

mod config;
mod engine;
mod metrics;
mod split;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;

pub use config::{ModelType, ModelVariant, TrainingConfig};
pub use engine::{CandidateReport, Estimator, Trainer};
pub use metrics::RegressionMetrics;
pub use split::{train_test_split, TrainTestSplit};
pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LinearRegression;
pub use random_forest::RandomForest;
