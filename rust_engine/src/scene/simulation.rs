//! 宿主模拟循环
//!
//! 负责加载场景、为每个网格顶点创建粒子、推进时间并选择动画帧。
//! 不包含窗口、着色器和 GPU 上传，渲染端只需读取 `render_buffer`。

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;

use crate::config::{get_config, SimulationConfig};
use crate::model::VertexSource;
use crate::particle::ParticleSystem;
use crate::skeleton::{load_skeleton, BoneTransformTable};
use crate::{EngineError, Result};

use super::{SceneDescription, SCENE_FILE};

/// 动画帧号 = floor(fps * t_frame) mod frame_count
pub fn animation_frame(frame_time: f32, fps: f32, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let frame = (fps * frame_time).floor().max(0.0) as usize;
    frame % frame_count
}

/// 模拟运行时
pub struct Simulation {
    config: SimulationConfig,
    scene: SceneDescription,
    bones: Arc<BoneTransformTable>,
    shapes: Vec<VertexSource>,
    particles: ParticleSystem,

    /// 模拟时间
    time: f32,
    /// 爆散期间累计的动画时间
    frame_time: f32,
    /// 当前动画帧
    frame: usize,
    running: bool,
}

impl Simulation {
    /// 使用全局配置从数据目录加载
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::load(data_dir, get_config())
    }

    /// 从数据目录加载 `input.txt` 及其引用的骨骼、网格和权重文件
    ///
    /// 任一文件加载失败都会记录错误并返回，不会产生部分加载的模拟。
    pub fn load<P: AsRef<Path>>(data_dir: P, config: SimulationConfig) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let scene = SceneDescription::load(data_dir.join(SCENE_FILE))
            .inspect_err(|e| log::error!("场景加载失败: {}", e))?;

        let skeleton = scene.skeleton.as_deref().ok_or_else(|| {
            EngineError::SceneParse("scene has no SKELETON entry".to_string())
        })?;
        let bones = load_skeleton(data_dir.join(skeleton))
            .inspect_err(|e| log::error!("骨骼加载失败 {}: {}", skeleton, e))?;
        let bones = Arc::new(bones);

        let shapes = scene
            .meshes
            .iter()
            .map(|mesh| {
                VertexSource::load(
                    data_dir.join(&mesh.obj),
                    data_dir.join(&mesh.weights),
                    bones.clone(),
                )
                .inspect_err(|e| log::error!("网格加载失败 {}: {}", mesh.obj, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut simulation = Self::new(shapes, bones, config)?;
        simulation.scene = scene;
        Ok(simulation)
    }

    /// 由已加载的网格和骨骼创建，每个顶点一个粒子
    ///
    /// 所有粒子在 t = 0 以第 0 帧的蒙皮位置为锚点出生。
    pub fn new(
        shapes: Vec<VertexSource>,
        bones: Arc<BoneTransformTable>,
        config: SimulationConfig,
    ) -> Result<Self> {
        if shapes.is_empty() {
            return Err(EngineError::EmptyScene);
        }

        let total: usize = shapes.iter().map(VertexSource::get_num_verts).sum();
        let animating = !bones.is_empty();
        let mut particles = ParticleSystem::with_config(config.clone());
        particles.initialize(total)?;

        for (shape_index, shape) in shapes.iter().enumerate() {
            for vertex in 0..shape.get_num_verts() {
                let index = particles.spawn(shape_index, vertex)?;
                let anchor = shape.update(0, animating, vertex)? * config.spawn_target_scale;
                particles.rebirth(index, 0.0, anchor)?;
            }
        }

        log::info!(
            "模拟初始化: {} 个网格, {} 个粒子, {} 帧动画",
            shapes.len(),
            total,
            bones.frame_count()
        );

        Ok(Self {
            config,
            scene: SceneDescription::default(),
            bones,
            shapes,
            particles,
            time: 0.0,
            frame_time: 0.0,
            frame: 0,
            running: true,
        })
    }

    /// 推进一步，返回是否有粒子处于爆散阶段
    ///
    /// 暂停时不推进粒子，返回 false，动画帧回到 0。
    pub fn tick(&mut self) -> Result<bool> {
        if !self.running {
            self.frame = 0;
            self.frame_time = 0.0;
            return Ok(false);
        }

        let h = self.config.timestep;
        let scale = self.config.target_scale;
        let targets = self.targets(self.frame)?;

        let exploding = self.particles.step_all(self.time, h, |shape, vertex| {
            targets
                .get(shape)
                .and_then(|positions| positions.get(vertex))
                .map(|p| *p * scale)
                .ok_or_else(|| EngineError::VertexOutOfRange {
                    vertex,
                    count: targets.get(shape).map_or(0, Vec::len),
                })
        })?;
        self.time += h;

        if exploding {
            self.frame =
                animation_frame(self.frame_time, self.config.animation_fps, self.bones.frame_count());
            self.frame_time += h;
        } else {
            self.frame = 0;
            self.frame_time = 0.0;
        }

        log::debug!(
            "模拟步进: t={:.2}, 爆散={}, 帧={}",
            self.time,
            exploding,
            self.frame
        );
        Ok(exploding)
    }

    /// 每个网格在 `frame` 帧的目标位置（未缩放）
    fn targets(&self, frame: usize) -> Result<Vec<Vec<Vec3>>> {
        if self.bones.is_empty() {
            return Ok(self.shapes.iter().map(|s| s.positions().to_vec()).collect());
        }
        self.shapes
            .iter()
            .map(|shape| shape.skin_frame(frame).map(|output| output.positions))
            .collect()
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    pub fn bones(&self) -> &BoneTransformTable {
        &self.bones
    }

    pub fn shapes(&self) -> &[VertexSource] {
        &self.shapes
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// 交错渲染缓冲区：每个粒子 位置×3、颜色×3、alpha、大小
    pub fn render_buffer(&self) -> Vec<f32> {
        self.particles.render_buffer()
    }

    pub fn write_render_buffer(&self, out: &mut Vec<f32>) {
        self.particles.write_render_buffer(out);
    }
}
