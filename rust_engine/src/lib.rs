//! Burst Engine - 蒙皮网格驱动的粒子爆散引擎
//!
//! 提供：
//! - 骨骼帧变换表和逆绑定姿态
//! - CPU 线性混合蒙皮
//! - 网格顶点源（OBJ + 权重文件）
//! - 每顶点一个粒子的爆散模拟
//! - 场景加载和宿主循环

pub mod config;
pub mod model;
pub mod particle;
pub mod scene;
pub mod skeleton;
pub mod skinning;

pub use config::SimulationConfig;
pub use model::{VertexInfluence, VertexSource};
pub use particle::{Particle, ParticlePhase, ParticleSystem};
pub use scene::{SceneDescription, Simulation};
pub use skeleton::{BoneTransform, BoneTransformTable};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ parse error: {0}")]
    MeshParse(String),

    #[error("weight file parse error: {0}")]
    WeightParse(String),

    #[error("skeleton parse error: {0}")]
    SkeletonParse(String),

    #[error("scene file parse error: {0}")]
    SceneParse(String),

    #[error("frame {frame} out of range ({count} frames)")]
    FrameOutOfRange { frame: usize, count: usize },

    #[error("bone {bone} out of range ({count} bones)")]
    BoneOutOfRange { bone: usize, count: usize },

    #[error("vertex {vertex} out of range ({count} vertices)")]
    VertexOutOfRange { vertex: usize, count: usize },

    #[error("vertex {vertex} has {influences} influences but {weights} weights")]
    InfluenceMismatch {
        vertex: usize,
        influences: usize,
        weights: usize,
    },

    #[error("mesh has {positions} positions but {normals} normals")]
    NormalMismatch { positions: usize, normals: usize },

    #[error("mesh has {vertices} vertices but {records} weight records")]
    WeightCountMismatch { vertices: usize, records: usize },

    #[error("particle buffers are not initialized")]
    NotInitialized,

    #[error("particle buffers are already initialized")]
    AlreadyInitialized,

    #[error("particle {index} out of range ({count} particles)")]
    ParticleOutOfRange { index: usize, count: usize },

    #[error("particle buffers hold at most {capacity} particles")]
    ParticleCapacity { capacity: usize },

    #[error("scene contains no meshes")]
    EmptyScene,
}

pub type Result<T> = std::result::Result<T, EngineError>;
