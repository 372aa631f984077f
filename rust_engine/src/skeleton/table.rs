//! 骨骼帧变换表

use glam::Mat4;

use crate::{EngineError, Result};

/// 骨骼帧变换表
///
/// 保存每根骨骼的逆绑定矩阵和每一帧的骨骼世界变换，
/// 并预先计算每帧的蒙皮矩阵 `frame[k][j] * bind_inverse[j]`。
#[derive(Clone, Debug, Default)]
pub struct BoneTransformTable {
    bind_inverse: Vec<Mat4>,
    frames: Vec<Vec<Mat4>>,
    skinning_matrices: Vec<Vec<Mat4>>,
    /// 骨骼文件头声明的帧数（可能与实际帧数不同）
    declared_frame_count: usize,
}

impl BoneTransformTable {
    /// 由逆绑定矩阵和逐帧变换构建
    ///
    /// 每一帧必须恰好包含 `bind_inverse.len()` 个变换。
    pub fn new(bind_inverse: Vec<Mat4>, frames: Vec<Vec<Mat4>>) -> Result<Self> {
        let bone_count = bind_inverse.len();
        for (frame, transforms) in frames.iter().enumerate() {
            if transforms.len() != bone_count {
                return Err(EngineError::SkeletonParse(format!(
                    "frame {} has {} bone transforms, expected {}",
                    frame,
                    transforms.len(),
                    bone_count
                )));
            }
        }

        let skinning_matrices = frames
            .iter()
            .map(|transforms| {
                transforms
                    .iter()
                    .zip(&bind_inverse)
                    .map(|(frame, inverse)| *frame * *inverse)
                    .collect()
            })
            .collect();

        let declared_frame_count = frames.len();
        Ok(Self {
            bind_inverse,
            frames,
            skinning_matrices,
            declared_frame_count,
        })
    }

    pub(crate) fn set_declared_frame_count(&mut self, count: usize) {
        self.declared_frame_count = count;
    }

    /// 骨骼数量
    pub fn bone_count(&self) -> usize {
        self.bind_inverse.len()
    }

    /// 实际存储的动画帧数
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 文件头声明的帧数
    pub fn declared_frame_count(&self) -> usize {
        self.declared_frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 逆绑定矩阵
    pub fn bind_inverse(&self, bone: usize) -> Result<Mat4> {
        self.bind_inverse
            .get(bone)
            .copied()
            .ok_or(EngineError::BoneOutOfRange {
                bone,
                count: self.bone_count(),
            })
    }

    /// 指定帧的全部骨骼世界变换
    pub fn frame(&self, frame: usize) -> Result<&[Mat4]> {
        self.frames
            .get(frame)
            .map(Vec::as_slice)
            .ok_or(EngineError::FrameOutOfRange {
                frame,
                count: self.frame_count(),
            })
    }

    /// 指定帧、指定骨骼的世界变换
    pub fn frame_transform(&self, frame: usize, bone: usize) -> Result<Mat4> {
        let transforms = self.frame(frame)?;
        transforms
            .get(bone)
            .copied()
            .ok_or(EngineError::BoneOutOfRange {
                bone,
                count: transforms.len(),
            })
    }

    /// 指定帧的蒙皮矩阵（已乘以逆绑定矩阵）
    pub fn skinning_matrices(&self, frame: usize) -> Result<&[Mat4]> {
        self.skinning_matrices
            .get(frame)
            .map(Vec::as_slice)
            .ok_or(EngineError::FrameOutOfRange {
                frame,
                count: self.frame_count(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn translation(x: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_skinning_matrix_is_frame_times_bind_inverse() {
        let table = BoneTransformTable::new(
            vec![translation(-1.0)],
            vec![vec![translation(3.0)], vec![translation(1.0)]],
        )
        .unwrap();

        let m = table.skinning_matrices(0).unwrap()[0];
        assert!(m.abs_diff_eq(translation(2.0), 1e-6));
        let m = table.skinning_matrices(1).unwrap()[0];
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_out_of_range_lookups() {
        let table =
            BoneTransformTable::new(vec![Mat4::IDENTITY], vec![vec![Mat4::IDENTITY]]).unwrap();

        assert!(matches!(
            table.frame(1),
            Err(EngineError::FrameOutOfRange { frame: 1, count: 1 })
        ));
        assert!(matches!(
            table.frame_transform(0, 4),
            Err(EngineError::BoneOutOfRange { bone: 4, count: 1 })
        ));
        assert!(table.bind_inverse(1).is_err());
    }

    #[test]
    fn test_ragged_frame_rejected() {
        let result = BoneTransformTable::new(
            vec![Mat4::IDENTITY, Mat4::IDENTITY],
            vec![vec![Mat4::IDENTITY]],
        );
        assert!(matches!(result, Err(EngineError::SkeletonParse(_))));
    }
}
