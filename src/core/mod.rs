pub mod assembler;
pub mod classifier;
pub mod deriver;
pub mod engine;
pub mod validator;

pub use crate::domain::model::{ChartData, ChartKind, ChartOption, ChartRequest, EncodedImage};
pub use crate::domain::ports::{ImageStore, Rasterizer};
pub use crate::utils::error::Result;
