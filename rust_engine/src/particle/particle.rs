//! 单个粒子的物理和生命周期状态

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::SimulationConfig;

use super::ParticlePhase;

/// 粒子在共享缓冲区中的可写槽位
///
/// `position` 恰好 3 个 f32，由 `ParticleSystem` 按索引切出。
pub struct ParticleSlots<'a> {
    pub position: &'a mut [f32],
    pub alpha: &'a mut f32,
}

impl ParticleSlots<'_> {
    fn position(&self) -> Vec3 {
        Vec3::from_slice(&self.position[..])
    }

    fn set_position(&mut self, position: Vec3) {
        position.write_to_slice(&mut self.position[..]);
    }
}

/// 粒子
///
/// 位置、颜色、alpha、大小存放在 `ParticleSystem` 的平铺缓冲区中，
/// 这里只保存其余状态。
#[derive(Clone, Debug)]
pub struct Particle {
    // 固定属性
    shape_index: usize,
    vertex_index: usize,

    // 每次重生时重置
    mass: f32,
    damping: f32,
    lifespan: f32,
    death_time: f32,
    explode_timer: f32,

    // 每帧变化
    velocity: Vec3,
    /// 上一步的剩余寿命，用于检测跨越爆散阈值的那一步
    previous_remaining: f32,

    rng: StdRng,
}

impl Particle {
    /// 创建粒子，写入随机颜色和固定大小
    ///
    /// 新粒子处于已死亡状态，第一次 `step` 或显式 `rebirth` 时出生。
    pub fn spawn(
        shape_index: usize,
        vertex_index: usize,
        mut rng: StdRng,
        config: &SimulationConfig,
        color: &mut [f32],
        scale: &mut f32,
    ) -> Self {
        for channel in color.iter_mut().take(3) {
            *channel = rng.random_range(config.color_min..=config.color_max);
        }
        *scale = config.point_scale;

        Self {
            shape_index,
            vertex_index,
            mass: config.mass,
            damping: 0.0,
            lifespan: config.lifespan,
            death_time: f32::NEG_INFINITY,
            explode_timer: config.lifespan,
            velocity: config.spawn_velocity,
            previous_remaining: config.lifespan,
            rng,
        }
    }

    /// 重生：重置每条命的状态，位置放到 `anchor * spawn_anchor_scale`
    pub fn rebirth(
        &mut self,
        slots: &mut ParticleSlots,
        time: f32,
        anchor: Vec3,
        config: &SimulationConfig,
    ) {
        self.mass = config.mass;
        *slots.alpha = 1.0;
        self.damping = if config.damping_max > 0.0 {
            self.rng.random_range(0.0..config.damping_max)
        } else {
            0.0
        };
        slots.set_position(anchor * config.spawn_anchor_scale);
        self.velocity = config.spawn_velocity;
        self.lifespan = config.lifespan;
        self.explode_timer = self.lifespan;
        self.death_time = time + self.lifespan;
        self.previous_remaining = self.lifespan;
    }

    /// 前进一步，返回本步是否处于爆散阶段
    ///
    /// `target` 是该粒子跟踪顶点的当前目标位置，重生时也作为锚点。
    pub fn step(
        &mut self,
        mut slots: ParticleSlots,
        time: f32,
        h: f32,
        target: Vec3,
        config: &SimulationConfig,
    ) -> bool {
        if time > self.death_time {
            self.rebirth(&mut slots, time, target, config);
        }

        let remaining = self.time_remaining(time);
        *slots.alpha = (remaining / self.lifespan).clamp(0.0, 1.0);

        let threshold = config.explode_threshold;
        // 跨越阈值的那一步，速度对齐目标
        if self.previous_remaining >= threshold && remaining < threshold {
            self.velocity = target;
        }
        self.previous_remaining = remaining;

        if remaining < threshold {
            self.explode(&mut slots, h, target, config);
            self.explode_timer -= h;
            true
        } else {
            let position = slots.position() + h * self.velocity;
            slots.set_position(position);
            false
        }
    }

    /// 爆散阶段：朝目标的吸引力，积分后速度直接设为目标
    fn explode(&mut self, slots: &mut ParticleSlots, h: f32, target: Vec3, config: &SimulationConfig) {
        let force_scale = config.force_gain * (self.lifespan - self.explode_timer);
        let force = force_scale * (target - self.velocity);
        self.velocity += (h / self.mass) * force;

        let position = slots.position() + h * self.velocity;
        slots.set_position(position);

        self.velocity = target;
    }

    /// 剩余寿命
    pub fn time_remaining(&self, time: f32) -> f32 {
        self.death_time - time
    }

    /// 在 `time` 时刻所处的阶段
    pub fn phase(&self, time: f32, config: &SimulationConfig) -> ParticlePhase {
        if self.time_remaining(time) < config.explode_threshold {
            ParticlePhase::Exploding
        } else {
            ParticlePhase::Attached
        }
    }

    pub fn shape_index(&self) -> usize {
        self.shape_index
    }

    pub fn vertex_index(&self) -> usize {
        self.vertex_index
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// 粘滞阻尼系数（当前力模型未使用）
    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn lifespan(&self) -> f32 {
        self.lifespan
    }

    pub fn death_time(&self) -> f32 {
        self.death_time
    }

    pub fn explode_timer(&self) -> f32 {
        self.explode_timer
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Buffers {
        position: [f32; 3],
        color: [f32; 3],
        alpha: f32,
        scale: f32,
    }

    impl Buffers {
        fn new() -> Self {
            Self {
                position: [0.0; 3],
                color: [1.0; 3],
                alpha: 1.0,
                scale: 1.0,
            }
        }

        fn slots(&mut self) -> ParticleSlots<'_> {
            ParticleSlots {
                position: &mut self.position,
                alpha: &mut self.alpha,
            }
        }
    }

    fn particle(buffers: &mut Buffers, config: &SimulationConfig) -> Particle {
        Particle::spawn(
            0,
            0,
            StdRng::seed_from_u64(1),
            config,
            &mut buffers.color,
            &mut buffers.scale,
        )
    }

    #[test]
    fn test_spawn_writes_color_and_scale() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let _ = particle(&mut buffers, &config);

        assert_eq!(buffers.scale, 0.025);
        for c in buffers.color {
            assert!((0.5..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_rebirth_resets_state() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);

        p.rebirth(&mut buffers.slots(), 3.0, Vec3::new(100.0, 200.0, 300.0), &config);

        assert_eq!(p.velocity(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(p.lifespan(), 2.4);
        assert_eq!(p.explode_timer(), p.lifespan());
        assert_eq!(p.mass(), 1.0);
        assert!((p.death_time() - 5.4).abs() < 1e-6);
        assert!((0.0..3.0).contains(&p.damping()));
        assert_eq!(buffers.alpha, 1.0);
        let position = Vec3::from_array(buffers.position);
        assert!((position - Vec3::new(0.1, 0.2, 0.3)).length() < 1e-6);
    }

    #[test]
    fn test_first_step_rebirths_unborn_particle() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);

        let exploding = p.step(buffers.slots(), 0.5, 0.01, Vec3::new(1000.0, 0.0, 0.0), &config);
        assert!(!exploding);
        assert!((p.death_time() - 2.9).abs() < 1e-6);
        // 重生到 (1, 0, 0) 后沿 (0, 1, 0) 平移一步
        let position = Vec3::from_array(buffers.position);
        assert!((position - Vec3::new(1.0, 0.01, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_phase_flips_once_near_1_26() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);
        p.rebirth(&mut buffers.slots(), 0.0, Vec3::ZERO, &config);

        let h = 0.01;
        let mut t = 0.0f32;
        let mut previous = false;
        let mut flips = Vec::new();
        while t < 2.39 {
            let exploding = p.step(buffers.slots(), t, h, Vec3::ONE, &config);
            if exploding != previous {
                flips.push(t);
            }
            previous = exploding;
            t += h;
        }

        assert_eq!(flips.len(), 1);
        assert!(flips[0] > 1.25 && flips[0] < 1.28, "flip at {}", flips[0]);
    }

    #[test]
    fn test_attached_exactly_while_remaining_at_least_threshold() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);
        p.rebirth(&mut buffers.slots(), 0.0, Vec3::ZERO, &config);

        let mut t = 0.0f32;
        let mut last_remaining = f32::INFINITY;
        while t < 2.39 {
            let remaining = p.time_remaining(t);
            assert!(remaining < last_remaining);
            last_remaining = remaining;

            let exploding = p.step(buffers.slots(), t, 0.01, Vec3::ONE, &config);
            assert_eq!(exploding, remaining < config.explode_threshold);
            assert_eq!(
                p.phase(t, &config),
                if exploding { ParticlePhase::Exploding } else { ParticlePhase::Attached }
            );
            t += 0.01;
        }
    }

    #[test]
    fn test_alpha_stays_in_unit_range_across_lives() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);
        p.rebirth(&mut buffers.slots(), 0.0, Vec3::ONE, &config);

        let mut t = 0.0f32;
        for _ in 0..1000 {
            p.step(buffers.slots(), t, 0.01, Vec3::ONE, &config);
            assert!((0.0..=1.0).contains(&buffers.alpha), "alpha {}", buffers.alpha);
            t += 0.01;
        }
    }

    #[test]
    fn test_every_life_flips_once_and_rebirths_at_target() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);
        p.rebirth(&mut buffers.slots(), 0.0, Vec3::ZERO, &config);

        let h = 0.01;
        let target = Vec3::new(2.0, 4.0, 6.0);
        let mut life_start = 0.0f32;
        let mut lives = 1;
        let mut flips = 0;
        let mut previous = false;
        let mut previous_alpha = 1.0f32;

        for k in 0..500 {
            let t = k as f32 * h;
            let death_before = p.death_time();
            let exploding = p.step(buffers.slots(), t, h, target, &config);

            if p.death_time() != death_before {
                // 自然死亡后的重生
                assert!(t > death_before);
                assert_eq!(flips, 1, "life starting at {} flipped {} times", life_start, flips);
                assert!(!exploding);
                assert!((p.death_time() - (t + 2.4)).abs() < 1e-5);
                assert_eq!(p.velocity(), config.spawn_velocity);
                assert_eq!(p.explode_timer(), p.lifespan());
                let position = Vec3::from_array(buffers.position);
                let expected = 0.001 * target + h * config.spawn_velocity;
                assert!((position - expected).length() < 1e-6, "{} vs {}", position, expected);
                assert_eq!(buffers.alpha, 1.0);

                life_start = t;
                lives += 1;
                flips = 0;
            } else {
                // alpha 为 0 的下一步必然重生
                assert!(previous_alpha > 0.0, "alpha hit 0 at {} without rebirth", t);
                if exploding && !previous {
                    flips += 1;
                    let age = t - life_start;
                    assert!(age > 1.25 && age < 1.28, "flip at age {}", age);
                    assert_eq!(p.velocity(), target);
                }
                assert!(!(previous && !exploding), "left explosion without rebirth at {}", t);
            }

            previous = exploding;
            previous_alpha = buffers.alpha;
        }

        assert!(lives >= 3, "only {} lives", lives);
    }

    #[test]
    fn test_alpha_reaches_zero_only_before_rebirth() {
        // 二进制精确的时间参数，剩余寿命能恰好为 0
        let config = SimulationConfig {
            lifespan: 2.5,
            explode_threshold: 1.25,
            ..SimulationConfig::default()
        };
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);
        p.rebirth(&mut buffers.slots(), 0.0, Vec3::ZERO, &config);

        let h = 0.125;
        let mut zero_alpha_steps = Vec::new();
        let mut rebirth_steps = Vec::new();
        for k in 0..50 {
            let t = k as f32 * h;
            let death_before = p.death_time();
            p.step(buffers.slots(), t, h, Vec3::ONE, &config);
            if p.death_time() != death_before {
                rebirth_steps.push(k);
            }
            if buffers.alpha == 0.0 {
                zero_alpha_steps.push(k);
            }
        }

        assert_eq!(zero_alpha_steps, vec![20, 41]);
        assert_eq!(rebirth_steps, vec![21, 42]);
    }

    #[test]
    fn test_explosion_snaps_velocity_to_target() {
        let config = SimulationConfig::default();
        let mut buffers = Buffers::new();
        let mut p = particle(&mut buffers, &config);
        p.rebirth(&mut buffers.slots(), 0.0, Vec3::ZERO, &config);

        let target = Vec3::new(0.5, -0.25, 2.0);
        let exploding = p.step(buffers.slots(), 1.5, 0.01, target, &config);
        assert!(exploding);
        assert_eq!(p.velocity(), target);
        assert!((p.explode_timer() - 2.39).abs() < 1e-6);

        // 第二步：explode_timer 已减少，力非零，但速度仍被设为目标
        let before = Vec3::from_array(buffers.position);
        let next_target = Vec3::new(1.0, 0.0, 0.0);
        p.step(buffers.slots(), 1.51, 0.01, next_target, &config);
        assert_eq!(p.velocity(), next_target);

        // v' = v + h * gain * (2.4 - 2.39) * (target - v)
        let gain = config.force_gain * (2.4 - p.explode_timer() - 0.01);
        let v = target + 0.01 * gain * (next_target - target);
        let expected = before + 0.01 * v;
        let after = Vec3::from_array(buffers.position);
        assert!((after - expected).length() < 1e-3, "{} vs {}", after, expected);
    }
}
