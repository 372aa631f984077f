//! 每顶点粒子爆散模拟
//!
//! 每个粒子跟踪网格上的一个顶点：
//! - Attached：剩余寿命 >= 爆散阈值，按当前速度平移
//! - Exploding：剩余寿命 < 爆散阈值，被目标位置吸引
//! - 寿命结束时在同一步内重生

mod particle;
mod system;

pub use particle::{Particle, ParticleSlots};
pub use system::ParticleSystem;

/// 粒子所处阶段（每步由剩余寿命推导，不单独存储）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticlePhase {
    Attached,
    Exploding,
}

/// 渲染缓冲区中每个粒子占用的 f32 数：位置 3 + 颜色 3 + alpha + 大小
pub const RENDER_STRIDE: usize = 8;
