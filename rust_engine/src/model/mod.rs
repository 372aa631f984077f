//! 网格顶点源：OBJ 网格、顶点权重和蒙皮目标位置

mod loader;
mod runtime;
mod weights;

pub use loader::{load_obj, parse_obj, ObjMesh};
pub use runtime::VertexSource;
pub use weights::{load_weights, parse_weights, WeightFile};

use crate::{EngineError, Result};

/// 顶点骨骼影响列表
///
/// 骨骼索引和权重一一对应，长度可以包含零权重的填充项。
/// 权重不做归一化。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexInfluence {
    bones: Vec<usize>,
    weights: Vec<f32>,
}

impl VertexInfluence {
    /// 创建影响列表，`vertex` 只用于错误信息
    pub fn new(vertex: usize, bones: Vec<usize>, weights: Vec<f32>) -> Result<Self> {
        if bones.len() != weights.len() {
            return Err(EngineError::InfluenceMismatch {
                vertex,
                influences: bones.len(),
                weights: weights.len(),
            });
        }
        Ok(Self { bones, weights })
    }

    pub fn bones(&self) -> &[usize] {
        &self.bones
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// 遍历 (骨骼索引, 权重)
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.bones.iter().copied().zip(self.weights.iter().copied())
    }
}
