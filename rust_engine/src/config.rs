//! 模拟配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use glam::Vec3;
use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 模拟配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    // ========== 生命周期 ==========
    /// 粒子寿命，默认 2.4
    pub lifespan: f32,
    /// 爆散阈值：剩余寿命低于此值时进入爆散阶段，默认 1.14
    pub explode_threshold: f32,

    // ========== 力模型 ==========
    /// 爆散吸引力增益，默认 10000.0
    /// 公式：force = gain * (lifespan - explode_timer) * (target - velocity)
    pub force_gain: f32,
    /// 重力（当前力模型未使用，保留扩展）
    pub gravity: Vec3,
    /// 重生质量，默认 1.0
    pub mass: f32,
    /// 粘滞阻尼随机上限（不含），默认 3.0
    pub damping_max: f32,

    // ========== 重生 ==========
    /// 重生位置 = anchor * 此值，默认 0.001
    pub spawn_anchor_scale: f32,
    /// 重生速度，默认 (0, 1, 0)
    pub spawn_velocity: Vec3,

    // ========== 外观 ==========
    /// 点精灵大小，默认 0.025
    pub point_scale: f32,
    /// 随机颜色下限，默认 0.5
    pub color_min: f32,
    /// 随机颜色上限，默认 1.0
    pub color_max: f32,

    // ========== 宿主循环 ==========
    /// 固定时间步长，默认 0.01
    pub timestep: f32,
    /// 动画采样帧率，默认 30.0
    /// 帧号 = floor(animation_fps * t_frame) mod frame_count
    pub animation_fps: f32,
    /// 每步目标位置缩放，默认 1/75
    pub target_scale: f32,
    /// 初始重生锚点缩放，默认 1/100
    pub spawn_target_scale: f32,

    // ========== 随机数 ==========
    /// 随机种子；None 表示从线程随机源取种
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // ====== 生命周期 ======
            // 一条命 2.4 个时间单位，前 1.26 贴在网格上，后 1.14 爆散
            lifespan: 2.4,
            explode_threshold: 1.14,

            // ====== 力模型 ======
            // 随 explode_timer 递减线性增大
            force_gain: 10000.0,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            mass: 1.0,
            damping_max: 3.0,

            // ====== 重生 ======
            spawn_anchor_scale: 0.001,
            spawn_velocity: Vec3::Y,

            // ====== 外观 ======
            point_scale: 0.025,
            color_min: 0.5,
            color_max: 1.0,

            // ====== 宿主循环 ======
            timestep: 0.01,
            animation_fps: 30.0,
            target_scale: 1.0 / 75.0,
            spawn_target_scale: 1.0 / 100.0,

            seed: None,
        }
    }
}

/// 全局配置实例
static SIMULATION_CONFIG: Lazy<RwLock<SimulationConfig>> =
    Lazy::new(|| RwLock::new(SimulationConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> SimulationConfig {
    match SIMULATION_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: SimulationConfig) {
    match SIMULATION_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(SimulationConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_split() {
        let config = SimulationConfig::default();
        assert!(config.explode_threshold < config.lifespan);
        assert!((config.lifespan - config.explode_threshold - 1.26).abs() < 1e-5);
    }

    #[test]
    fn test_set_and_reset_config() {
        let mut config = get_config();
        config.seed = Some(7);
        set_config(config);
        assert_eq!(get_config().seed, Some(7));

        reset_config();
        assert_eq!(get_config().seed, None);
    }
}
