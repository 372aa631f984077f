//! 顶点权重文件解析
//!
//! 格式：
//! - 第一行：`顶点数 骨骼数 每顶点权重数`
//! - 之后每个顶点一行：`影响数 (骨骼 权重) × 影响数`
//! - 不足 `每顶点权重数` 的部分用 (0, 0.0) 填充
//! - 空行和以 `#` 开头的行跳过

use std::fs;
use std::path::Path;

use crate::{EngineError, Result};

use super::VertexInfluence;

/// 权重文件数据
#[derive(Clone, Debug, Default)]
pub struct WeightFile {
    pub num_vertices: usize,
    pub num_bones: usize,
    pub num_weights: usize,
    pub influences: Vec<VertexInfluence>,
}

/// 从文件加载权重
pub fn load_weights<P: AsRef<Path>>(path: P) -> Result<WeightFile> {
    let path = path.as_ref();
    log::info!("加载权重文件: {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_weights(&content)
}

/// 解析权重文本
pub fn parse_weights(content: &str) -> Result<WeightFile> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (_, header) = lines
        .next()
        .ok_or_else(|| EngineError::WeightParse("missing header line".to_string()))?;
    let header: Vec<usize> = header
        .split_whitespace()
        .map(|f| f.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| EngineError::WeightParse(format!("invalid header: {}", e)))?;
    let [num_vertices, num_bones, num_weights] = header[..] else {
        return Err(EngineError::WeightParse(format!(
            "header has {} fields, expected 3",
            header.len()
        )));
    };

    let mut influences = Vec::with_capacity(num_vertices);
    for (line_number, line) in lines {
        let vertex = influences.len();
        let influence = parse_vertex_line(line, vertex, num_bones, num_weights).map_err(|e| {
            EngineError::WeightParse(format!("line {}: {}", line_number + 1, e))
        })?;
        influences.push(influence);
    }

    if influences.len() != num_vertices {
        log::warn!(
            "权重文件头声明 {} 个顶点, 实际 {} 条记录",
            num_vertices,
            influences.len()
        );
    }

    log::info!(
        "权重解析完成: {} 个顶点, {} 根骨骼, 每顶点 {} 个权重",
        influences.len(),
        num_bones,
        num_weights
    );

    Ok(WeightFile {
        num_vertices,
        num_bones,
        num_weights,
        influences,
    })
}

fn parse_vertex_line(
    line: &str,
    vertex: usize,
    num_bones: usize,
    num_weights: usize,
) -> std::result::Result<VertexInfluence, String> {
    let mut fields = line.split_whitespace();
    let count = fields
        .next()
        .ok_or_else(|| "missing influence count".to_string())?
        .parse::<usize>()
        .map_err(|e| format!("invalid influence count: {}", e))?;
    if count > num_weights {
        return Err(format!(
            "{} influences exceed the declared width {}",
            count, num_weights
        ));
    }

    let mut bones = Vec::with_capacity(num_weights);
    let mut weights = Vec::with_capacity(num_weights);
    for _ in 0..count {
        let bone = fields
            .next()
            .ok_or_else(|| "missing bone index".to_string())?
            .parse::<usize>()
            .map_err(|e| format!("invalid bone index: {}", e))?;
        let weight = fields
            .next()
            .ok_or_else(|| "missing weight".to_string())?
            .parse::<f32>()
            .map_err(|e| format!("invalid weight: {}", e))?;
        if bone >= num_bones {
            return Err(format!("bone {} out of range ({} bones)", bone, num_bones));
        }
        bones.push(bone);
        weights.push(weight);
    }

    // 填充到固定宽度
    bones.resize(num_weights, 0);
    weights.resize(num_weights, 0.0);

    VertexInfluence::new(vertex, bones, weights).map_err(|e| e.to_string())
}
