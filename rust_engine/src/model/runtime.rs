//! 蒙皮网格运行时顶点源

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;

use crate::skeleton::BoneTransformTable;
use crate::skinning::{compute_skinning, SkinningContext, SkinningInput, SkinningOutput};
use crate::{EngineError, Result};

use super::{load_obj, load_weights, VertexInfluence};

/// 蒙皮网格顶点源
///
/// 持有绑定姿态的顶点、法线和每顶点骨骼影响，共享骨骼帧变换表。
pub struct VertexSource {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    influences: Vec<VertexInfluence>,
    bones: Arc<BoneTransformTable>,
    /// 网格重定位偏移：绑定姿态最大 Y 的一半
    offset: f32,
}

impl VertexSource {
    /// 由已解析的数据创建
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        influences: Vec<VertexInfluence>,
        bones: Arc<BoneTransformTable>,
    ) -> Result<Self> {
        if positions.len() != normals.len() {
            return Err(EngineError::NormalMismatch {
                positions: positions.len(),
                normals: normals.len(),
            });
        }
        if positions.len() != influences.len() {
            return Err(EngineError::WeightCountMismatch {
                vertices: positions.len(),
                records: influences.len(),
            });
        }

        let offset = recentering_offset(&positions);
        Ok(Self {
            positions,
            normals,
            influences,
            bones,
            offset,
        })
    }

    /// 从 OBJ 网格文件和权重文件加载
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        mesh_path: P,
        weight_path: Q,
        bones: Arc<BoneTransformTable>,
    ) -> Result<Self> {
        let mesh = load_obj(mesh_path)?;
        let weights = load_weights(weight_path)?;
        if weights.num_bones > bones.bone_count() {
            log::warn!(
                "权重文件声明 {} 根骨骼, 骨骼表只有 {} 根",
                weights.num_bones,
                bones.bone_count()
            );
        }

        Self::new(mesh.positions, mesh.normals, weights.influences, bones)
    }

    /// 获取顶点数量
    pub fn get_num_verts(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 绑定姿态顶点位置
    pub fn get_vertex(&self, index: usize) -> Result<Vec3> {
        self.positions
            .get(index)
            .copied()
            .ok_or(EngineError::VertexOutOfRange {
                vertex: index,
                count: self.positions.len(),
            })
    }

    /// 全部绑定姿态顶点位置
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn influences(&self) -> &[VertexInfluence] {
        &self.influences
    }

    pub fn bones(&self) -> &BoneTransformTable {
        &self.bones
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    fn context(&self) -> SkinningContext<'_> {
        SkinningContext::new(&self.bones, self.offset)
    }

    /// 计算顶点在第 `frame` 帧的目标位置
    ///
    /// 非动画状态下返回绑定姿态位置。
    pub fn update(&self, frame: usize, animating: bool, vertex: usize) -> Result<Vec3> {
        let position = self.get_vertex(vertex)?;
        if !animating {
            return Ok(position);
        }

        let (pos, _) = self.context().blend(
            position,
            self.normals[vertex],
            &self.influences[vertex],
            frame,
        )?;
        Ok(pos)
    }

    /// 整个网格在第 `frame` 帧的蒙皮结果
    pub fn skin_frame(&self, frame: usize) -> Result<SkinningOutput> {
        let input = SkinningInput {
            positions: &self.positions,
            normals: &self.normals,
            influences: &self.influences,
        };
        compute_skinning(&self.context(), &input, frame)
    }
}

/// 绑定姿态最大 Y（至少为 0）的一半
fn recentering_offset(positions: &[Vec3]) -> f32 {
    positions.iter().map(|p| p.y).fold(0.0f32, f32::max) / 2.0
}
