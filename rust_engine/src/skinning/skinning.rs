//! 线性混合蒙皮

use glam::Vec3;
use rayon::prelude::*;

use crate::model::VertexInfluence;
use crate::skeleton::BoneTransformTable;
use crate::{EngineError, Result};
use super::{SkinningInput, SkinningOutput};

/// 蒙皮上下文
#[derive(Clone, Copy, Debug)]
pub struct SkinningContext<'a> {
    pub bones: &'a BoneTransformTable,
    /// 网格重定位偏移，输出位置的 Y 减去此值
    pub offset: f32,
}

impl<'a> SkinningContext<'a> {
    pub fn new(bones: &'a BoneTransformTable, offset: f32) -> Self {
        Self { bones, offset }
    }

    /// 计算单个顶点在第 `frame` 帧的蒙皮位置和法线
    ///
    /// x = Σ w_j * M_j(frame) * inverse(M_j(bind)) * x0
    ///
    /// 法线使用相同的加权矩阵但忽略平移，不重新归一化。
    /// 空影响列表得到零贡献。
    pub fn blend(
        &self,
        position: Vec3,
        normal: Vec3,
        influence: &VertexInfluence,
        frame: usize,
    ) -> Result<(Vec3, Vec3)> {
        let matrices = self.bones.skinning_matrices(frame)?;
        let x0 = position.extend(1.0);
        let n0 = normal.extend(0.0);

        let mut pos = Vec3::ZERO;
        let mut norm = Vec3::ZERO;
        for (bone, weight) in influence.iter() {
            let m = matrices.get(bone).ok_or(EngineError::BoneOutOfRange {
                bone,
                count: matrices.len(),
            })?;
            pos += (*m * x0).truncate() * weight;
            norm += (*m * n0).truncate() * weight;
        }

        pos.y -= self.offset;
        Ok((pos, norm))
    }
}

/// 计算整个网格在第 `frame` 帧的蒙皮 - 使用 rayon 并行
pub fn compute_skinning(
    context: &SkinningContext,
    input: &SkinningInput,
    frame: usize,
) -> Result<SkinningOutput> {
    let vertex_count = input.positions.len();
    if input.normals.len() != vertex_count {
        return Err(EngineError::NormalMismatch {
            positions: vertex_count,
            normals: input.normals.len(),
        });
    }
    if input.influences.len() != vertex_count {
        return Err(EngineError::WeightCountMismatch {
            vertices: vertex_count,
            records: input.influences.len(),
        });
    }
    // 帧号在进入并行区前检查一次
    context.bones.skinning_matrices(frame)?;

    let skinned = input
        .positions
        .par_iter()
        .zip(input.normals.par_iter())
        .zip(input.influences.par_iter())
        .map(|((position, normal), influence)| {
            context.blend(*position, *normal, influence, frame)
        })
        .collect::<Result<Vec<_>>>()?;

    let (positions, normals) = skinned.into_iter().unzip();
    Ok(SkinningOutput { positions, normals })
}
