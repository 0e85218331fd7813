//! Static catalogue of every unit, building and upgrade in the game.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ParseKindError, CellRectSize};

/// Maximum number of times a wall may be stacked onto the same tile.
pub const MAX_WALL_STACK: u32 = 3;

macro_rules! string_kind {
    ($ty:ident, $category:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Canonical snake_case name used on the wire.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseKindError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ParseKindError::new($category, other)),
                }
            }
        }
    };
}

/// Types of buildings players may construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Cheap stackable wall.
    WoodenWall,
    /// Sturdy stackable wall.
    StoneWall,
    /// Single-target tower.
    ArrowTower,
    /// Splash damage around the struck enemy.
    Cannon,
    /// Bolt that pierces collinear enemies.
    Ballista,
    /// Airborne splash bomber.
    HotAirBalloon,
    /// One-shot proximity explosive.
    ExplosiveMine,
}

string_kind!(BuildingKind, "building type", {
    WoodenWall => "wooden_wall",
    StoneWall => "stone_wall",
    ArrowTower => "arrow_tower",
    Cannon => "cannon",
    Ballista => "ballista",
    HotAirBalloon => "hot_air_balloon",
    ExplosiveMine => "explosive_mine",
});

/// Static statistics shared by every building of one kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingStats {
    /// Gold charged per placement (and per wall stack).
    pub cost: u32,
    /// Hit points of a freshly placed building.
    pub hp: f32,
    /// Damage dealt per attack.
    pub damage: f32,
    /// Targeting range in cells measured from the building centre.
    pub range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Splash radius around the impact point, zero for single-target attacks.
    pub aoe_radius: f32,
    /// Number of enemies a piercing attack may strike, zero if not piercing.
    pub pierce: u32,
    /// Footprint width in cells.
    pub width: u32,
    /// Footprint height in cells.
    pub height: u32,
    /// The building is consumed by its first attack.
    pub one_time: bool,
    /// The building is a wall: passive, stackable and meleed by enemies.
    pub wall: bool,
}

impl BuildingKind {
    /// Returns the static statistics for the building kind.
    #[must_use]
    pub const fn stats(self) -> BuildingStats {
        match self {
            Self::WoodenWall => wall(5, 100.0),
            Self::StoneWall => wall(15, 300.0),
            Self::ArrowTower => BuildingStats {
                cost: 25,
                hp: 150.0,
                damage: 8.0,
                range: 5.0,
                attack_speed: 1.0,
                ..TOWER
            },
            Self::Cannon => BuildingStats {
                cost: 60,
                hp: 250.0,
                damage: 20.0,
                range: 4.0,
                attack_speed: 0.5,
                aoe_radius: 1.5,
                width: 2,
                height: 2,
                ..TOWER
            },
            Self::Ballista => BuildingStats {
                cost: 45,
                hp: 180.0,
                damage: 25.0,
                range: 7.0,
                attack_speed: 0.67,
                pierce: 2,
                ..TOWER
            },
            Self::HotAirBalloon => BuildingStats {
                cost: 80,
                hp: 120.0,
                damage: 15.0,
                range: 6.0,
                attack_speed: 0.67,
                aoe_radius: 2.0,
                ..TOWER
            },
            Self::ExplosiveMine => BuildingStats {
                cost: 30,
                hp: 1.0,
                damage: 100.0,
                range: 1.5,
                attack_speed: 0.0,
                aoe_radius: 2.0,
                one_time: true,
                ..TOWER
            },
        }
    }

    /// Footprint occupied by the building.
    #[must_use]
    pub const fn footprint(self) -> CellRectSize {
        let stats = self.stats();
        CellRectSize::new(stats.width, stats.height)
    }

    /// Reports whether the building is a stackable wall.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        self.stats().wall
    }

    /// Seconds between two attacks, or `None` for passive and one-time buildings.
    #[must_use]
    pub fn attack_cooldown(self) -> Option<f32> {
        let stats = self.stats();
        if stats.wall || stats.one_time || stats.attack_speed <= 0.0 {
            None
        } else {
            Some(1.0 / stats.attack_speed)
        }
    }
}

const TOWER: BuildingStats = BuildingStats {
    cost: 0,
    hp: 0.0,
    damage: 0.0,
    range: 0.0,
    attack_speed: 0.0,
    aoe_radius: 0.0,
    pierce: 0,
    width: 1,
    height: 1,
    one_time: false,
    wall: false,
};

const fn wall(cost: u32, hp: f32) -> BuildingStats {
    BuildingStats {
        cost,
        hp,
        wall: true,
        ..TOWER
    }
}

/// Types of enemies the wave scheduler may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline zombie.
    NormalZombie,
    /// Quick, fragile zombie.
    FastZombie,
    /// Slow zombie that tears through walls.
    HeavyZombie,
    /// Final-wave boss that slams nearby defences.
    BossZombie,
    /// Invader infantry.
    Soldier,
    /// Armoured invader.
    Elite,
    /// Invader commander whose war cry heals allies.
    General,
}

string_kind!(EnemyKind, "enemy type", {
    NormalZombie => "normal_zombie",
    FastZombie => "fast_zombie",
    HeavyZombie => "heavy_zombie",
    BossZombie => "boss_zombie",
    Soldier => "soldier",
    Elite => "elite",
    General => "general",
});

/// Special ability carried by some enemy kinds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemySpecial {
    /// Doubles melee damage dealt to walls.
    WallBreaker,
    /// Periodic area slam hitting buildings and castles.
    Slam {
        /// Radius of the slam in cells.
        radius: f32,
        /// Damage dealt to every structure in the radius.
        damage: f32,
        /// Seconds between two slams.
        cooldown: f32,
    },
    /// Periodic heal applied to nearby enemies.
    WarCry {
        /// Radius of the war cry in cells.
        radius: f32,
        /// Fraction of each ally's maximum hit points restored.
        heal_fraction: f32,
        /// Seconds between two war cries.
        cooldown: f32,
    },
}

/// Static statistics shared by every enemy of one kind before wave scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Base hit points.
    pub hp: f32,
    /// Base movement speed in cells per second.
    pub speed: f32,
    /// Damage dealt to a castle on arrival, and melee damage per second to walls.
    pub damage: f32,
    /// Gold awarded for the kill.
    pub reward: u32,
    /// Optional special ability.
    pub special: Option<EnemySpecial>,
}

impl EnemyKind {
    /// Returns the unscaled statistics for the enemy kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::NormalZombie => enemy(50.0, 1.0, 5.0, 5, None),
            Self::FastZombie => enemy(30.0, 2.0, 3.0, 4, None),
            Self::HeavyZombie => enemy(150.0, 0.6, 15.0, 12, Some(EnemySpecial::WallBreaker)),
            Self::BossZombie => enemy(
                1_500.0,
                0.5,
                100.0,
                150,
                Some(EnemySpecial::Slam {
                    radius: 3.0,
                    damage: 40.0,
                    cooldown: 5.0,
                }),
            ),
            Self::Soldier => enemy(80.0, 1.2, 8.0, 8, None),
            Self::Elite => enemy(200.0, 1.0, 20.0, 20, None),
            Self::General => enemy(
                800.0,
                0.8,
                60.0,
                100,
                Some(EnemySpecial::WarCry {
                    radius: 4.0,
                    heal_fraction: 0.1,
                    cooldown: 6.0,
                }),
            ),
        }
    }

    /// Hit points after applying the wave multiplier `1 + (wave - 1) * 0.15`.
    #[must_use]
    pub fn scaled_hp(self, wave: u32) -> f32 {
        self.stats().hp * (1.0 + wave.saturating_sub(1) as f32 * 0.15)
    }

    /// Speed after applying the wave multiplier `1 + (wave - 1) * 0.05`.
    #[must_use]
    pub fn scaled_speed(self, wave: u32) -> f32 {
        self.stats().speed * (1.0 + wave.saturating_sub(1) as f32 * 0.05)
    }
}

const fn enemy(
    hp: f32,
    speed: f32,
    damage: f32,
    reward: u32,
    special: Option<EnemySpecial>,
) -> EnemyStats {
    EnemyStats {
        hp,
        speed,
        damage,
        reward,
        special,
    }
}

/// Offensive units players buy to assault another player's castle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmyKind {
    /// Fast and cheap raider.
    Scout,
    /// Balanced melee unit.
    Knight,
    /// Slow unit with heavy castle damage.
    SiegeRam,
}

string_kind!(ArmyKind, "army unit type", {
    Scout => "scout",
    Knight => "knight",
    SiegeRam => "siege_ram",
});

/// Static statistics shared by every army unit of one kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmyStats {
    /// Gold charged per unit.
    pub cost: u32,
    /// Hit points.
    pub hp: f32,
    /// Movement speed in cells per second.
    pub speed: f32,
    /// Damage dealt per attack on the target castle.
    pub damage: f32,
    /// Attack range in cells.
    pub range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
}

impl ArmyKind {
    /// Returns the static statistics for the army kind.
    #[must_use]
    pub const fn stats(self) -> ArmyStats {
        match self {
            Self::Scout => army(30, 60.0, 2.0, 5.0, 1.0),
            Self::Knight => army(60, 200.0, 1.0, 15.0, 1.0),
            Self::SiegeRam => army(100, 300.0, 0.6, 50.0, 0.5),
        }
    }
}

const fn army(cost: u32, hp: f32, speed: f32, damage: f32, attack_speed: f32) -> ArmyStats {
    ArmyStats {
        cost,
        hp,
        speed,
        damage,
        range: 1.5,
        attack_speed,
    }
}

/// Castle improvements players can purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// First tier of extra castle hit points.
    FortifyI,
    /// Second tier of extra castle hit points, requires [`UpgradeKind::FortifyI`].
    FortifyII,
    /// Bonus gold for every kill credited to the owner.
    Treasury,
    /// Restores a fixed amount of castle hit points; repeatable.
    Repair,
}

string_kind!(UpgradeKind, "upgrade type", {
    FortifyI => "fortify_i",
    FortifyII => "fortify_ii",
    Treasury => "treasury",
    Repair => "repair",
});

/// Static description of a castle upgrade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradeStats {
    /// Gold charged per purchase.
    pub cost: u32,
    /// Increase applied to both maximum and current hit points.
    pub max_hp_bonus: f32,
    /// Current hit points restored, clamped at the maximum.
    pub heal: f32,
    /// Extra gold awarded per credited kill.
    pub gold_per_kill: u32,
    /// Upgrade that must already be owned.
    pub requires: Option<UpgradeKind>,
    /// The upgrade can only be bought once per castle.
    pub one_time: bool,
}

impl UpgradeKind {
    /// Returns the static description of the upgrade.
    #[must_use]
    pub const fn stats(self) -> UpgradeStats {
        let base = UpgradeStats {
            cost: 0,
            max_hp_bonus: 0.0,
            heal: 0.0,
            gold_per_kill: 0,
            requires: None,
            one_time: true,
        };
        match self {
            Self::FortifyI => UpgradeStats {
                cost: 100,
                max_hp_bonus: 500.0,
                ..base
            },
            Self::FortifyII => UpgradeStats {
                cost: 200,
                max_hp_bonus: 1_000.0,
                requires: Some(Self::FortifyI),
                ..base
            },
            Self::Treasury => UpgradeStats {
                cost: 150,
                gold_per_kill: 2,
                ..base
            },
            Self::Repair => UpgradeStats {
                cost: 50,
                heal: 200.0,
                one_time: false,
                ..base
            },
        }
    }
}

/// Static castle parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastleStats {
    /// Hit points of a fresh castle.
    pub max_hp: f32,
    /// Range of the built-in king attack in cells.
    pub king_range: f32,
    /// Damage of the built-in king attack.
    pub king_damage: f32,
    /// Seconds between two king attacks.
    pub king_cooldown: f32,
}

/// Castle parameters used by every player.
pub const CASTLE_STATS: CastleStats = CastleStats {
    max_hp: 1_000.0,
    king_range: 6.0,
    king_damage: 10.0,
    king_cooldown: 1.0,
};

/// Phases of the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Initial build-up period before the first wave.
    Preparation,
    /// Enemies are spawning or still alive.
    WaveActive,
    /// Pause between two waves.
    WaveBreak,
    /// Every wave has been cleared; terminal.
    Ended,
}

/// Distinguishes the two interleaved wave counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveKind {
    /// Zombie waves, numbered 1 to 15.
    Zombie,
    /// Invader waves, numbered 1 to 5.
    Invader,
}
