/// Events emitted during a movement update.
/// The presentation layer consumes these for sound and logging.

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MoveEvent {
    Jumped,
    Landed { row: i64 },
    Bonked { row: i64 },
    HitWall { column: i64 },
    FallStart,
    Teleported { x: f64, y: f64 },
}
