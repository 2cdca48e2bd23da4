/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and HUD notices.

#[derive(Clone, Debug, PartialEq)]
#[allow(dead_code)]
pub enum GameEvent {
    CoinPicked { x: f32, y: f32 },
    HeartPicked,
    HeartDropped { x: f32, y: f32 },
    PlayerJumped,
    PlayerDamaged,
    PlayerKilled,
    ShotFired,
    TurretFired,
    BossFired,
    EnemyKilled { points: u32, boss: bool },
    EnemySpawned { boss: bool },
    AllCoinsCollected,
    TransitionStarted,
    VineGrown,
    LevelAdvanced { index: usize },
    GameWon,
}
