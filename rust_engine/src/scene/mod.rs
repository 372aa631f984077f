//! 场景描述文件 (input.txt) 和宿主模拟循环

mod simulation;

pub use simulation::{animation_frame, Simulation};

use std::fs;
use std::path::Path;

use crate::{EngineError, Result};

/// 场景描述文件名
pub const SCENE_FILE: &str = "input.txt";

/// 一条 MESH 记录
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshEntry {
    pub obj: String,
    pub weights: String,
    pub texture: String,
}

/// 场景描述
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneDescription {
    pub textures: Vec<String>,
    pub meshes: Vec<MeshEntry>,
    pub skeleton: Option<String>,
}

impl SceneDescription {
    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("加载场景描述: {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// 解析场景描述
    ///
    /// 未知关键字只记录警告。
    pub fn parse(content: &str) -> Result<Self> {
        let mut scene = Self::default();

        for (line_number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let key = fields.next().unwrap_or_default();
            let mut value = |what: &str| {
                fields.next().map(str::to_string).ok_or_else(|| {
                    EngineError::SceneParse(format!(
                        "line {}: {} is missing {}",
                        line_number + 1,
                        key,
                        what
                    ))
                })
            };

            match key {
                "TEXTURE" => scene.textures.push(value("texture path")?),
                "MESH" => {
                    let obj = value("obj path")?;
                    let weights = value("weight path")?;
                    let texture = value("texture path")?;
                    scene.meshes.push(MeshEntry {
                        obj,
                        weights,
                        texture,
                    });
                }
                "SKELETON" => scene.skeleton = Some(value("skeleton path")?),
                _ => log::warn!("未知关键字: {}", key),
            }
        }

        Ok(scene)
    }
}
