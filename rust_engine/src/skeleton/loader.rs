//! 骨骼动画文本文件解析
//!
//! 格式：
//! - 第一行：`帧数 骨骼数`
//! - 之后每行：骨骼数 × 7 个数（四元数 x y z w，平移 x y z）
//! - 第一条数据行是绑定姿态（存为逆矩阵），其后每行是一帧动画
//! - 空行和以 `#` 开头的行跳过

use std::fs;
use std::path::Path;

use glam::Mat4;

use crate::{EngineError, Result};

use super::{BoneTransform, BoneTransformTable};

/// 每根骨骼在一行中占用的数值个数
const VALUES_PER_BONE: usize = 7;

/// 从文件加载骨骼动画
pub fn load_skeleton<P: AsRef<Path>>(path: P) -> Result<BoneTransformTable> {
    let path = path.as_ref();
    log::info!("加载骨骼动画: {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_skeleton(&content)
}

/// 解析骨骼动画文本
pub fn parse_skeleton(content: &str) -> Result<BoneTransformTable> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (_, header) = lines
        .next()
        .ok_or_else(|| EngineError::SkeletonParse("missing header line".to_string()))?;
    let mut fields = header.split_whitespace();
    let declared_frames = parse_count(fields.next(), "frame count")?;
    let bone_count = parse_count(fields.next(), "bone count")?;

    let mut bind_inverse: Option<Vec<Mat4>> = None;
    let mut frames = Vec::new();

    for (line_number, line) in lines {
        let transforms = parse_pose_line(line, bone_count)
            .map_err(|e| EngineError::SkeletonParse(format!("line {}: {}", line_number + 1, e)))?;

        match bind_inverse {
            None => {
                bind_inverse = Some(transforms.iter().map(Mat4::inverse).collect());
            }
            Some(_) => frames.push(transforms),
        }
    }

    let bind_inverse = bind_inverse
        .ok_or_else(|| EngineError::SkeletonParse("missing bind pose line".to_string()))?;

    // 文件头的帧数包含绑定姿态行
    if declared_frames != frames.len() + 1 {
        log::warn!(
            "骨骼文件头声明 {} 行姿态, 实际 {} 行",
            declared_frames,
            frames.len() + 1
        );
    }

    let mut table = BoneTransformTable::new(bind_inverse, frames)?;
    table.set_declared_frame_count(declared_frames);

    log::info!(
        "骨骼解析完成: {} 根骨骼, {} 帧",
        table.bone_count(),
        table.frame_count()
    );
    Ok(table)
}

fn parse_count(field: Option<&str>, what: &str) -> Result<usize> {
    let field =
        field.ok_or_else(|| EngineError::SkeletonParse(format!("header is missing {}", what)))?;
    field
        .parse::<usize>()
        .map_err(|e| EngineError::SkeletonParse(format!("invalid {} {:?}: {}", what, field, e)))
}

/// 解析一行骨骼姿态，返回每根骨骼的世界变换
fn parse_pose_line(line: &str, bone_count: usize) -> std::result::Result<Vec<Mat4>, String> {
    let values = line
        .split_whitespace()
        .map(|v| v.parse::<f32>().map_err(|e| format!("invalid number {:?}: {}", v, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let expected = bone_count * VALUES_PER_BONE;
    if values.len() != expected {
        return Err(format!("expected {} numbers, found {}", expected, values.len()));
    }

    Ok(values
        .chunks_exact(VALUES_PER_BONE)
        .map(|chunk| {
            let mut group = [0.0f32; VALUES_PER_BONE];
            group.copy_from_slice(chunk);
            BoneTransform::from_file_values(&group).to_matrix()
        })
        .collect())
}
