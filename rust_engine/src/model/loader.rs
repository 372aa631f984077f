//! OBJ 网格加载器
//!
//! 只读取引擎需要的部分：`v`、`vn`、`f`。纹理坐标等其余行忽略。
//! 要求每个面顶点的 v/t/n 索引相同（例如 `f 70/70/70 41/41/41 67/67/67`），
//! 这样位置和法线数组可以直接按顶点索引对齐。

use std::fs;
use std::path::Path;

use glam::Vec3;

use crate::{EngineError, Result};

/// OBJ 网格数据
#[derive(Clone, Debug, Default)]
pub struct ObjMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// 从文件加载 OBJ
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<ObjMesh> {
    let path = path.as_ref();
    log::info!("加载 OBJ: {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_obj(&content)
}

/// 解析 OBJ 文本
pub fn parse_obj(content: &str) -> Result<ObjMesh> {
    let mut mesh = ObjMesh::default();
    // 三角化后的顶点索引（0 起），只用于校验面引用
    let mut indices: Vec<u32> = Vec::new();

    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let err = |msg: String| EngineError::MeshParse(format!("line {}: {}", line_number + 1, msg));

        match parts[0] {
            "v" => mesh.positions.push(parse_vec3(&parts[1..]).map_err(err)?),
            "vn" => mesh.normals.push(parse_vec3(&parts[1..]).map_err(err)?),
            "f" => {
                let mut face = Vec::with_capacity(parts.len() - 1);
                for corner in &parts[1..] {
                    face.push(parse_corner(corner).map_err(err)?);
                }
                if face.len() < 3 {
                    return Err(err(format!("face has {} vertices", face.len())));
                }
                // 三角形扇形分割
                for i in 1..face.len() - 1 {
                    indices.extend([face[0], face[i], face[i + 1]]);
                }
            }
            // 纹理坐标、材质、分组等与蒙皮无关
            _ => {}
        }
    }

    if mesh.positions.len() != mesh.normals.len() {
        return Err(EngineError::NormalMismatch {
            positions: mesh.positions.len(),
            normals: mesh.normals.len(),
        });
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= mesh.positions.len()) {
        return Err(EngineError::MeshParse(format!(
            "face references vertex {} but mesh has {}",
            index + 1,
            mesh.positions.len()
        )));
    }

    log::info!(
        "OBJ 解析完成: {} 个顶点, {} 个三角形",
        mesh.vertex_count(),
        indices.len() / 3
    );
    Ok(mesh)
}

fn parse_float(field: Option<&&str>) -> std::result::Result<f32, String> {
    let field = field.ok_or_else(|| "missing component".to_string())?;
    field
        .parse::<f32>()
        .map_err(|e| format!("invalid number {:?}: {}", field, e))
}

fn parse_vec3(fields: &[&str]) -> std::result::Result<Vec3, String> {
    Ok(Vec3::new(
        parse_float(fields.first())?,
        parse_float(fields.get(1))?,
        parse_float(fields.get(2))?,
    ))
}

/// 解析面顶点 `v`、`v/t`、`v//n` 或 `v/t/n`，要求所有给出的索引相同
fn parse_corner(corner: &str) -> std::result::Result<u32, String> {
    let mut index = None;
    for field in corner.split('/').filter(|f| !f.is_empty()) {
        // OBJ 是 1 起索引
        let value = field
            .parse::<u32>()
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| format!("unsupported face index {:?}", field))?;
        match index {
            None => index = Some(value),
            Some(first) if first != value => {
                return Err(format!(
                    "face corner {:?} uses different v/t/n indices",
                    corner
                ));
            }
            Some(_) => {}
        }
    }
    index
        .map(|i| i - 1)
        .ok_or_else(|| format!("empty face corner {:?}", corner))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# quad
v 0 0 0
v 1 0 0
v 1 2 0
v 0 2 0
vn 0 0 1
vn 0 0 1
vn 0 0 1
vn 0 0 1
vt 0 0
f 1/1/1 2/2/2 3/3/3 4/4/4
";

    #[test]
    fn test_parse_quad() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.normals.len(), 4);
        assert_eq!(mesh.positions[2], Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_mismatched_corner_indices_rejected() {
        let content = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1//2 2//2 3//3\n";
        assert!(matches!(parse_obj(content), Err(EngineError::MeshParse(_))));
    }

    #[test]
    fn test_missing_normals_rejected() {
        let content = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\n";
        assert!(matches!(
            parse_obj(content),
            Err(EngineError::NormalMismatch {
                positions: 3,
                normals: 1
            })
        ));
    }

    #[test]
    fn test_face_out_of_range_rejected() {
        let content = "v 0 0 0\nvn 0 0 1\nf 1 1 9\n";
        assert!(matches!(parse_obj(content), Err(EngineError::MeshParse(_))));
    }

    #[test]
    fn test_parse_corner() {
        assert_eq!(parse_corner("3"), Ok(2));
        assert_eq!(parse_corner("3//3"), Ok(2));
        assert_eq!(parse_corner("3/3/3"), Ok(2));
        assert!(parse_corner("3/4/3").is_err());
        assert!(parse_corner("-1").is_err());
    }
}
