//! 粒子系统：持有全部粒子和平铺共享缓冲区

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::{get_config, SimulationConfig};
use crate::{EngineError, Result};

use super::{Particle, ParticleSlots, RENDER_STRIDE};

/// 粒子系统
///
/// 位置、颜色、alpha、大小保存在连续的 f32 缓冲区中，
/// 方便整体上传给渲染后端；粒子按索引访问自己的槽位。
pub struct ParticleSystem {
    config: SimulationConfig,
    particles: Vec<Particle>,
    /// 3 * n
    positions: Vec<f32>,
    /// 3 * n
    colors: Vec<f32>,
    /// n
    alphas: Vec<f32>,
    /// n
    scales: Vec<f32>,
    /// None 表示缓冲区尚未初始化
    capacity: Option<usize>,
}

impl ParticleSystem {
    /// 使用全局配置创建
    pub fn new() -> Self {
        Self::with_config(get_config())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
            positions: Vec::new(),
            colors: Vec::new(),
            alphas: Vec::new(),
            scales: Vec::new(),
            capacity: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 分配 `count` 个粒子的共享缓冲区并写入默认值
    ///
    /// 必须在创建任何粒子前调用，且只能调用一次（`shutdown` 后可再次调用）。
    pub fn initialize(&mut self, count: usize) -> Result<()> {
        if self.capacity.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }

        self.positions = vec![0.0; 3 * count];
        self.colors = vec![1.0; 3 * count];
        self.alphas = vec![1.0; count];
        self.scales = vec![1.0; count];
        self.particles = Vec::with_capacity(count);
        self.capacity = Some(count);

        log::debug!("粒子缓冲区初始化: {} 个粒子", count);
        Ok(())
    }

    /// 释放缓冲区和全部粒子
    pub fn shutdown(&mut self) {
        self.particles = Vec::new();
        self.positions = Vec::new();
        self.colors = Vec::new();
        self.alphas = Vec::new();
        self.scales = Vec::new();
        self.capacity = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.capacity.is_some()
    }

    /// 创建下一个粒子，跟踪第 `shape_index` 个网格的第 `vertex_index` 个顶点
    ///
    /// 返回粒子索引。
    pub fn spawn(&mut self, shape_index: usize, vertex_index: usize) -> Result<usize> {
        let capacity = self.capacity.ok_or(EngineError::NotInitialized)?;
        let index = self.particles.len();
        if index >= capacity {
            return Err(EngineError::ParticleCapacity { capacity });
        }

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let particle = Particle::spawn(
            shape_index,
            vertex_index,
            rng,
            &self.config,
            &mut self.colors[3 * index..3 * index + 3],
            &mut self.scales[index],
        );
        self.particles.push(particle);
        Ok(index)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.particles.len() {
            Ok(())
        } else {
            Err(EngineError::ParticleOutOfRange {
                index,
                count: self.particles.len(),
            })
        }
    }

    /// 在 `time` 时刻重生第 `index` 个粒子
    pub fn rebirth(&mut self, index: usize, time: f32, anchor: Vec3) -> Result<()> {
        self.check_index(index)?;
        let mut slots = ParticleSlots {
            position: &mut self.positions[3 * index..3 * index + 3],
            alpha: &mut self.alphas[index],
        };
        self.particles[index].rebirth(&mut slots, time, anchor, &self.config);
        Ok(())
    }

    /// 单独推进第 `index` 个粒子
    pub fn step(&mut self, index: usize, time: f32, h: f32, target: Vec3) -> Result<bool> {
        self.check_index(index)?;
        let slots = ParticleSlots {
            position: &mut self.positions[3 * index..3 * index + 3],
            alpha: &mut self.alphas[index],
        };
        Ok(self.particles[index].step(slots, time, h, target, &self.config))
    }

    /// 推进全部粒子 - 使用 rayon 并行
    ///
    /// `target` 接收 (网格索引, 顶点索引)，返回该顶点当前的目标位置。
    /// 先取齐全部目标再推进，任一目标失败时所有粒子保持不变。
    /// 任一粒子处于爆散阶段时返回 true。
    pub fn step_all<F>(&mut self, time: f32, h: f32, target: F) -> Result<bool>
    where
        F: Fn(usize, usize) -> Result<Vec3> + Sync,
    {
        if self.capacity.is_none() {
            return Err(EngineError::NotInitialized);
        }

        let targets = self
            .particles
            .par_iter()
            .map(|particle| target(particle.shape_index(), particle.vertex_index()))
            .collect::<Result<Vec<_>>>()?;

        let count = self.particles.len();
        let config = &self.config;

        // 每个粒子只写自己的位置和 alpha 槽位
        let exploding = self
            .particles
            .par_iter_mut()
            .zip(self.positions[..3 * count].par_chunks_exact_mut(3))
            .zip(self.alphas[..count].par_iter_mut())
            .zip(targets.into_par_iter())
            .map(|(((particle, position), alpha), goal)| {
                let slots = ParticleSlots { position, alpha };
                particle.step(slots, time, h, goal, config)
            })
            .reduce(|| false, |a, b| a || b);
        Ok(exploding)
    }

    /// 粒子数量
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// 第 `index` 个粒子的位置
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions
            .get(3 * index..3 * index + 3)
            .filter(|_| index < self.particles.len())
            .map(Vec3::from_slice)
    }

    pub fn alpha(&self, index: usize) -> Option<f32> {
        self.alphas.get(index).copied().filter(|_| index < self.particles.len())
    }

    /// 位置缓冲区 (3n)
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// 颜色缓冲区 (3n)
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// alpha 缓冲区 (n)
    pub fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    /// 大小缓冲区 (n)
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// 写入交错渲染缓冲区：每个粒子 位置×3、颜色×3、alpha、大小
    pub fn write_render_buffer(&self, out: &mut Vec<f32>) {
        let count = self.particles.len();
        out.clear();
        out.reserve(count * RENDER_STRIDE);
        for i in 0..count {
            out.extend_from_slice(&self.positions[3 * i..3 * i + 3]);
            out.extend_from_slice(&self.colors[3 * i..3 * i + 3]);
            out.push(self.alphas[i]);
            out.push(self.scales[i]);
        }
    }

    pub fn render_buffer(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.write_render_buffer(&mut out);
        out
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}
