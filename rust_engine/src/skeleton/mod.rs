//! 骨骼帧变换表和骨骼文件解析

mod loader;
mod table;

pub use loader::{load_skeleton, parse_skeleton};
pub use table::BoneTransformTable;

use glam::{Mat4, Quat, Vec3};

/// 骨骼变换数据
#[derive(Clone, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl BoneTransform {
    /// 从骨骼文件中的 7 个数创建（四元数 x y z w，平移 x y z）
    ///
    /// 四元数在加载时归一化；全零四元数退化为单位旋转。
    pub fn from_file_values(values: &[f32; 7]) -> Self {
        let [x, y, z, w, tx, ty, tz] = *values;
        let rotation = Quat::from_xyzw(x, y, z, w);
        let rotation = if rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Self {
            translation: Vec3::new(tx, ty, tz),
            rotation,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}
