#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler: phase state machine, wave composition and spawn cadence.
//!
//! The scheduler walks `preparation -> wave_active <-> wave_break -> ended`.
//! Timed phases count down and warn once shortly before they end; an active
//! wave ends only once its queue drained and the engine reports no live
//! enemy. Invader blocks ride along on every third zombie wave.

use std::collections::VecDeque;

use bastion_core::{Edge, EnemyKind, GameConfig, GameEvent, Phase, WaveKind};
use rand::{seq::SliceRandom, Rng};

/// Number of zombie waves in a full session.
pub const ZOMBIE_WAVES: u32 = 15;

/// Number of invader waves in a full session.
pub const INVADER_WAVES: u32 = 5;

/// Zombie waves whose completion appends an invader block.
const INVADER_CADENCE: u32 = 3;

/// Growth of the zombie count per wave.
const SPAWN_COUNT_SCALE: u32 = 2;

/// A single queued enemy spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Edge the enemy enters from.
    pub edge: Edge,
    /// Zombie wave used for stat scaling.
    pub wave: u32,
}

/// Zombie counts of one wave before shuffling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveMix {
    /// Normal zombies.
    pub normal: u32,
    /// Fast zombies.
    pub fast: u32,
    /// Heavy zombies.
    pub heavy: u32,
}

impl WaveMix {
    /// Zombies in the wave, bosses excluded.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.normal + self.fast + self.heavy
    }
}

/// Durations driving the timed phases, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveTiming {
    /// Length of the initial preparation phase.
    pub preparation: f32,
    /// Length of every break between waves.
    pub wave_break: f32,
    /// Lead time of the warning before a timed phase ends.
    pub warning: f32,
    /// Seconds between two queued spawns.
    pub spawn_interval: f32,
}

impl WaveTiming {
    /// Extracts the scheduler timings from the session configuration.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            preparation: config.preparation_secs,
            wave_break: config.wave_break_secs,
            warning: config.warning_secs,
            spawn_interval: config.spawn_interval_secs,
        }
    }
}

impl Default for WaveTiming {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Base zombie count of the bracket containing `wave`.
#[must_use]
pub const fn base_count(wave: u32) -> u32 {
    match wave {
        0..=5 => 8,
        6..=10 => 12,
        _ => 16,
    }
}

/// Zombies in `wave`: the bracket base plus two per previous wave.
#[must_use]
pub const fn total_count(wave: u32) -> u32 {
    base_count(wave) + wave.saturating_sub(1) * SPAWN_COUNT_SCALE
}

/// Fast and heavy percentages for `wave`; the rest are normal zombies.
const fn mix_percentages(wave: u32) -> (u32, u32) {
    match wave {
        0..=2 => (0, 0),
        3..=4 => (20, 0),
        5..=6 => (20, 10),
        7..=9 => (25, 15),
        10..=12 => (30, 20),
        _ => (30, 30),
    }
}

/// Zombie composition of `wave`.
#[must_use]
pub const fn zombie_mix(wave: u32) -> WaveMix {
    let total = total_count(wave);
    let (fast_pct, heavy_pct) = mix_percentages(wave);
    let fast = total * fast_pct / 100;
    let heavy = total * heavy_pct / 100;
    WaveMix {
        normal: total - fast - heavy,
        fast,
        heavy,
    }
}

fn zombie_queue<R>(wave: u32, rng: &mut R) -> Vec<SpawnRequest>
where
    R: Rng + ?Sized,
{
    let mix = zombie_mix(wave);
    let mut kinds = Vec::with_capacity(mix.total() as usize + Edge::ALL.len());
    kinds.extend(std::iter::repeat(EnemyKind::NormalZombie).take(mix.normal as usize));
    kinds.extend(std::iter::repeat(EnemyKind::FastZombie).take(mix.fast as usize));
    kinds.extend(std::iter::repeat(EnemyKind::HeavyZombie).take(mix.heavy as usize));
    kinds.shuffle(rng);

    let mut queue: Vec<SpawnRequest> = kinds
        .into_iter()
        .map(|kind| SpawnRequest {
            kind,
            edge: random_edge(rng),
            wave,
        })
        .collect();
    if wave == ZOMBIE_WAVES {
        queue.extend(Edge::ALL.iter().map(|edge| SpawnRequest {
            kind: EnemyKind::BossZombie,
            edge: *edge,
            wave,
        }));
    }
    queue
}

fn invader_queue<R>(invader_wave: u32, zombie_wave: u32, rng: &mut R) -> Vec<SpawnRequest>
where
    R: Rng + ?Sized,
{
    let soldiers = 4 + 2 * invader_wave;
    let mut kinds: Vec<EnemyKind> = std::iter::repeat(EnemyKind::Soldier)
        .take(soldiers as usize)
        .chain(std::iter::repeat(EnemyKind::Elite).take(invader_wave as usize))
        .collect();
    if invader_wave == INVADER_WAVES {
        kinds.push(EnemyKind::General);
    }
    kinds
        .into_iter()
        .map(|kind| SpawnRequest {
            kind,
            edge: random_edge(rng),
            wave: zombie_wave,
        })
        .collect()
}

fn random_edge<R>(rng: &mut R) -> Edge
where
    R: Rng + ?Sized,
{
    Edge::ALL[rng.gen_range(0..Edge::ALL.len())]
}

/// Phase state machine and spawn queue.
#[derive(Clone, Debug)]
pub struct WaveManager {
    timing: WaveTiming,
    phase: Phase,
    zombie_wave: u32,
    invader_wave: u32,
    time_remaining: f32,
    queue: VecDeque<SpawnRequest>,
    spawn_accumulator: f32,
    warning_sent: bool,
    invader_pending: bool,
}

impl WaveManager {
    /// Creates a scheduler in the preparation phase.
    #[must_use]
    pub fn new(timing: WaveTiming) -> Self {
        Self {
            timing,
            phase: Phase::Preparation,
            zombie_wave: 0,
            invader_wave: 0,
            time_remaining: timing.preparation,
            queue: VecDeque::new(),
            spawn_accumulator: 0.0,
            warning_sent: false,
            invader_pending: false,
        }
    }

    /// Restarts the scheduler from the preparation phase.
    pub fn reset(&mut self) {
        *self = Self::new(self.timing);
    }

    /// Active phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Zombie wave counter, zero before the first wave.
    #[must_use]
    pub const fn zombie_wave(&self) -> u32 {
        self.zombie_wave
    }

    /// Invader wave counter, zero before the first invader wave.
    #[must_use]
    pub const fn invader_wave(&self) -> u32 {
        self.invader_wave
    }

    /// Seconds left in a timed phase, zero otherwise.
    #[must_use]
    pub fn time_remaining(&self) -> f32 {
        match self.phase {
            Phase::Preparation | Phase::WaveBreak => self.time_remaining.max(0.0),
            Phase::WaveActive | Phase::Ended => 0.0,
        }
    }

    /// Spawns still waiting in the queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Reports whether every wave has been cleared.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// Advances the scheduler by `dt` seconds.
    ///
    /// `live_enemies` is the engine's count of enemies still on the map
    /// before this call's spawns. Phase changes, wave starts and warnings are
    /// appended to `events`; enemies due now are appended to `spawns`.
    pub fn update<R>(
        &mut self,
        dt: f32,
        live_enemies: usize,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
        spawns: &mut Vec<SpawnRequest>,
    ) where
        R: Rng + ?Sized,
    {
        match self.phase {
            Phase::Preparation | Phase::WaveBreak => self.count_down(dt, rng, events),
            Phase::WaveActive => self.drain(dt, live_enemies, rng, events, spawns),
            Phase::Ended => {}
        }
    }

    fn count_down<R>(&mut self, dt: f32, rng: &mut R, events: &mut Vec<GameEvent>)
    where
        R: Rng + ?Sized,
    {
        self.time_remaining -= dt;
        if !self.warning_sent && self.time_remaining <= self.timing.warning {
            self.warning_sent = true;
            events.push(GameEvent::WaveWarning {
                phase: self.phase,
                seconds_remaining: self.time_remaining.max(0.0),
                next_wave: self.zombie_wave + 1,
            });
        }
        if self.time_remaining <= 0.0 {
            self.start_zombie_wave(self.zombie_wave + 1, rng, events);
        }
    }

    fn start_zombie_wave<R>(&mut self, wave: u32, rng: &mut R, events: &mut Vec<GameEvent>)
    where
        R: Rng + ?Sized,
    {
        self.zombie_wave = wave;
        self.phase = Phase::WaveActive;
        self.time_remaining = 0.0;
        self.spawn_accumulator = 0.0;
        self.queue = zombie_queue(wave, rng).into();
        self.invader_pending =
            wave % INVADER_CADENCE == 0 && self.invader_wave < INVADER_WAVES;
        tracing::info!(wave, enemies = self.queue.len(), "zombie wave started");
        events.push(GameEvent::PhaseChanged {
            phase: Phase::WaveActive,
        });
        events.push(GameEvent::WaveStarted {
            kind: WaveKind::Zombie,
            number: wave,
        });
    }

    fn drain<R>(
        &mut self,
        dt: f32,
        live_enemies: usize,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
        spawns: &mut Vec<SpawnRequest>,
    ) where
        R: Rng + ?Sized,
    {
        let before = spawns.len();
        self.spawn_accumulator += dt;
        while self.spawn_accumulator >= self.timing.spawn_interval {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            self.spawn_accumulator -= self.timing.spawn_interval;
            spawns.push(request);
        }

        if !self.queue.is_empty() {
            return;
        }
        self.spawn_accumulator = self.spawn_accumulator.min(self.timing.spawn_interval);

        if self.invader_pending {
            self.invader_pending = false;
            self.invader_wave += 1;
            self.queue = invader_queue(self.invader_wave, self.zombie_wave, rng).into();
            tracing::info!(wave = self.invader_wave, enemies = self.queue.len(), "invader wave started");
            events.push(GameEvent::WaveStarted {
                kind: WaveKind::Invader,
                number: self.invader_wave,
            });
            return;
        }

        if live_enemies > 0 || spawns.len() > before {
            return;
        }

        if self.zombie_wave >= ZOMBIE_WAVES && self.invader_wave >= INVADER_WAVES {
            self.phase = Phase::Ended;
            tracing::info!("all waves cleared");
        } else {
            self.phase = Phase::WaveBreak;
            self.time_remaining = self.timing.wave_break;
            self.warning_sent = false;
        }
        events.push(GameEvent::PhaseChanged { phase: self.phase });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fast_timing() -> WaveTiming {
        WaveTiming {
            preparation: 12.0,
            wave_break: 11.0,
            warning: 10.0,
            spawn_interval: 0.5,
        }
    }

    fn step(
        waves: &mut WaveManager,
        dt: f32,
        live: usize,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<GameEvent>, Vec<SpawnRequest>) {
        let mut events = Vec::new();
        let mut spawns = Vec::new();
        waves.update(dt, live, rng, &mut events, &mut spawns);
        (events, spawns)
    }

    #[test]
    fn bracket_totals_match_table() {
        assert_eq!(total_count(1), 8);
        assert_eq!(total_count(5), 16);
        assert_eq!(total_count(6), 22);
        assert_eq!(total_count(15), 44);
        assert_eq!(
            zombie_mix(1),
            WaveMix {
                normal: 8,
                fast: 0,
                heavy: 0
            }
        );
        assert_eq!(
            zombie_mix(5),
            WaveMix {
                normal: 12,
                fast: 3,
                heavy: 1
            }
        );
    }

    #[test]
    fn final_wave_appends_one_boss_per_edge() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let queue = zombie_queue(ZOMBIE_WAVES, &mut rng);
        let bosses: Vec<_> = queue
            .iter()
            .filter(|request| request.kind == EnemyKind::BossZombie)
            .map(|request| request.edge)
            .collect();
        assert_eq!(bosses, Edge::ALL.to_vec());
        assert_eq!(queue.len() as u32, total_count(ZOMBIE_WAVES) + 4);
    }

    #[test]
    fn invader_blocks_grow_and_end_with_a_general() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let first = invader_queue(1, 3, &mut rng);
        assert_eq!(first.len(), 7);
        let last = invader_queue(5, 15, &mut rng);
        assert_eq!(last.len(), 14 + 5 + 1);
        assert_eq!(last.last().map(|request| request.kind), Some(EnemyKind::General));
    }

    #[test]
    fn preparation_warns_once_then_starts_wave_one() {
        let mut waves = WaveManager::new(fast_timing());
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let (events, _) = step(&mut waves, 1.0, 0, &mut rng);
        assert!(events.is_empty());
        let (events, _) = step(&mut waves, 1.0, 0, &mut rng);
        assert_eq!(
            events,
            vec![GameEvent::WaveWarning {
                phase: Phase::Preparation,
                seconds_remaining: 10.0,
                next_wave: 1,
            }]
        );
        let (events, _) = step(&mut waves, 5.0, 0, &mut rng);
        assert!(events.is_empty());

        let (events, spawns) = step(&mut waves, 5.0, 0, &mut rng);
        assert!(spawns.is_empty());
        assert_eq!(waves.phase(), Phase::WaveActive);
        assert_eq!(waves.zombie_wave(), 1);
        assert!(events.contains(&GameEvent::WaveStarted {
            kind: WaveKind::Zombie,
            number: 1
        }));
        assert_eq!(waves.time_remaining(), 0.0);
    }

    #[test]
    fn spawns_follow_the_half_second_cadence() {
        let mut waves = WaveManager::new(fast_timing());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let _ = step(&mut waves, 12.0, 0, &mut rng);

        let (_, spawns) = step(&mut waves, 0.25, 0, &mut rng);
        assert!(spawns.is_empty());
        let (_, spawns) = step(&mut waves, 0.25, 0, &mut rng);
        assert_eq!(spawns.len(), 1);
        let (_, spawns) = step(&mut waves, 1.6, 1, &mut rng);
        assert_eq!(spawns.len(), 3);
        assert_eq!(waves.queued(), 4);
    }

    #[test]
    fn wave_waits_for_live_enemies_before_break() {
        let mut waves = WaveManager::new(fast_timing());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let _ = step(&mut waves, 12.0, 0, &mut rng);
        let (_, spawns) = step(&mut waves, 4.0, 0, &mut rng);
        assert_eq!(spawns.len(), 8);
        assert_eq!(waves.phase(), Phase::WaveActive);

        let (_, spawns) = step(&mut waves, 0.05, 8, &mut rng);
        assert!(spawns.is_empty());
        assert_eq!(waves.phase(), Phase::WaveActive);

        let (events, _) = step(&mut waves, 0.05, 0, &mut rng);
        assert_eq!(
            events,
            vec![GameEvent::PhaseChanged {
                phase: Phase::WaveBreak
            }]
        );
        assert_eq!(waves.time_remaining(), 11.0);
    }

    #[test]
    fn full_session_reaches_the_end() {
        let mut waves = WaveManager::new(fast_timing());
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut zombie_starts = 0;
        let mut invader_starts = 0;
        let mut warnings = 0;
        for _ in 0..20_000 {
            let (events, _) = step(&mut waves, 0.5, 0, &mut rng);
            for event in events {
                match event {
                    GameEvent::WaveStarted {
                        kind: WaveKind::Zombie,
                        ..
                    } => zombie_starts += 1,
                    GameEvent::WaveStarted {
                        kind: WaveKind::Invader,
                        ..
                    } => invader_starts += 1,
                    GameEvent::WaveWarning { .. } => warnings += 1,
                    _ => {}
                }
            }
            if waves.is_complete() {
                break;
            }
        }
        assert!(waves.is_complete());
        assert_eq!(zombie_starts, ZOMBIE_WAVES);
        assert_eq!(invader_starts, INVADER_WAVES);
        assert_eq!(warnings, ZOMBIE_WAVES);
        assert_eq!(waves.invader_wave(), INVADER_WAVES);
    }

    proptest! {
        #[test]
        fn composition_always_sums_to_total(wave in 1u32..=15) {
            let mix = zombie_mix(wave);
            prop_assert_eq!(mix.total(), base_count(wave) + (wave - 1) * 2);
            prop_assert!(mix.fast * 100 <= mix.total() * 30);
        }
    }
}
