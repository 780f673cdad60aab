//! Patrol state machine
//!
//! Turns per-direction occupancy and the detection flags into motion
//! commands, one step per loop iteration. The controller never sleeps:
//! every step returns the pause the loop thread must observe before the
//! next iteration, which keeps all suspension points in the thread that
//! owns them and makes the state machine testable against a mock link.
//!
//! Lifecycle: Idle -> Patrolling, then Patrolling <-> Responding while the
//! service runs, and finally Stopped. A waving person preempts the move
//! decision for that iteration; the robot halts, raises a hand and holds.

use setu_io::{Error as LinkError, Mode, Motion};
use tracing::{info, warn};

use crate::config::MotionConfig;
use crate::grid::{CellState, Direction, DirectionMap, OccupancyGrid};
use crate::shared::Detection;

/// Controller lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatrolState {
    /// Created, no command issued yet
    Idle,
    /// Normal obstacle-avoiding walk
    Patrolling,
    /// Holding a greeting gesture for a detected person
    Responding,
    /// Terminal
    Stopped,
}

/// Pause the loop thread must observe after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepPause {
    /// Hold the response gesture (dwell)
    Dwell,
    /// Inter-step delay between moves
    MoveGap,
}

/// The patrol state machine. Owns the occupancy grid and the motion link.
pub struct PatrolController<M: Motion> {
    motion: M,
    grid: OccupancyGrid,
    state: PatrolState,
    /// Set while the robot is stopped for a person; cleared on resume
    person_stopped: bool,
    config: MotionConfig,
}

impl<M: Motion> PatrolController<M> {
    pub fn new(motion: M, grid_size: usize, config: MotionConfig) -> Self {
        Self {
            motion,
            grid: OccupancyGrid::new(grid_size),
            state: PatrolState::Idle,
            person_stopped: false,
            config,
        }
    }

    pub fn state(&self) -> PatrolState {
        self.state
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Run one iteration of the patrol loop.
    ///
    /// Transient command failures are logged and the iteration carries on;
    /// only a dead link propagates, at which point the caller winds down.
    pub fn step(
        &mut self,
        classifications: &DirectionMap<CellState>,
        detection: Detection,
    ) -> Result<StepPause, LinkError> {
        if self.state == PatrolState::Idle {
            self.motion.set_mode(Mode::Walk)?;
            self.motion.set_led(0, 255, 0)?;
            self.state = PatrolState::Patrolling;
            info!("Patrol started at cell {:?}", self.grid.position());
        }

        self.grid.update(classifications);

        if detection.waving {
            info!("Waving detected, holding greeting gesture");
            self.motion.set_led(255, 255, 255)?;
            tolerate(self.motion.halt(self.config.move_duration_ms), "stop")?;
            self.motion.set_mode(Mode::StraightHand1)?;
            self.person_stopped = true;
            self.state = PatrolState::Responding;
            return Ok(StepPause::Dwell);
        }

        if self.person_stopped {
            info!("Person gone, resuming patrol");
            self.motion.set_mode(Mode::Walk)?;
            self.person_stopped = false;
            self.state = PatrolState::Patrolling;
        }

        match self.grid.select_move() {
            Some(dir) => {
                let speed = self.config.move_speed;
                let duration = self.config.move_duration_ms;
                let result = match dir {
                    Direction::Front => self.motion.go_forward(speed, duration),
                    Direction::Back => self.motion.go_backward(speed, duration),
                    Direction::Left => self.motion.go_left(speed, duration),
                    Direction::Right => self.motion.go_right(speed, duration),
                };
                if result.is_ok() {
                    info!("Moved {:?} to cell {:?}", dir, self.grid.position());
                }
                // The grid already committed the move; a failed command is
                // not retried and the stop below still runs.
                tolerate(result, "move")?;
            }
            None => {
                info!("No passable direction, holding position");
            }
        }

        tolerate(self.motion.halt(self.config.move_duration_ms), "stop")?;
        Ok(StepPause::MoveGap)
    }

    /// Terminal transition. Issues a final halt so the robot is not left
    /// drifting mid-step; safe to call more than once.
    pub fn stop(&mut self) {
        if self.state == PatrolState::Stopped {
            return;
        }
        if let Err(e) = self.motion.halt(self.config.move_duration_ms) {
            warn!("Final halt failed: {}", e);
        }
        self.state = PatrolState::Stopped;
        info!("Patrol stopped");
    }
}

/// Swallow transient command failures, propagate fatal link errors.
fn tolerate(result: Result<(), LinkError>, what: &str) -> Result<(), LinkError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if !e.is_fatal() => {
            warn!("{} command failed: {}", what, e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEFAULT_GRID_SIZE;
    use std::io;

    #[derive(Clone, Debug, PartialEq)]
    enum Command {
        Mode(Mode),
        Led(u8, u8, u8),
        Forward(f32, u32),
        Backward(f32, u32),
        Left(f32, u32),
        Right(f32, u32),
    }

    impl Command {
        /// A movement command with non-zero speed.
        fn is_movement(&self) -> bool {
            matches!(
                self,
                Command::Forward(s, _)
                    | Command::Backward(s, _)
                    | Command::Left(s, _)
                    | Command::Right(s, _)
                    if *s > 0.0
            )
        }
    }

    /// What the mock should do with each command.
    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Behavior {
        Succeed,
        RejectMoves,
        FailAll,
    }

    struct RecordingMotion {
        commands: Vec<Command>,
        behavior: Behavior,
    }

    impl RecordingMotion {
        fn new() -> Self {
            Self {
                commands: Vec::new(),
                behavior: Behavior::Succeed,
            }
        }

        fn record_move(&mut self, command: Command) -> setu_io::Result<()> {
            self.commands.push(command);
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::RejectMoves => Err(LinkError::Command("rejected".into())),
                Behavior::FailAll => Err(LinkError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "link down",
                ))),
            }
        }

        fn record_control(&mut self, command: Command) -> setu_io::Result<()> {
            self.commands.push(command);
            match self.behavior {
                Behavior::FailAll => Err(LinkError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "link down",
                ))),
                _ => Ok(()),
            }
        }
    }

    impl Motion for RecordingMotion {
        fn set_mode(&mut self, mode: Mode) -> setu_io::Result<()> {
            self.record_control(Command::Mode(mode))
        }

        fn set_led(&mut self, r: u8, g: u8, b: u8) -> setu_io::Result<()> {
            self.record_control(Command::Led(r, g, b))
        }

        fn go_forward(&mut self, speed: f32, duration_ms: u32) -> setu_io::Result<()> {
            self.record_move(Command::Forward(speed, duration_ms))
        }

        fn go_backward(&mut self, speed: f32, duration_ms: u32) -> setu_io::Result<()> {
            self.record_move(Command::Backward(speed, duration_ms))
        }

        fn go_left(&mut self, speed: f32, duration_ms: u32) -> setu_io::Result<()> {
            self.record_move(Command::Left(speed, duration_ms))
        }

        fn go_right(&mut self, speed: f32, duration_ms: u32) -> setu_io::Result<()> {
            self.record_move(Command::Right(speed, duration_ms))
        }
    }

    fn controller() -> PatrolController<RecordingMotion> {
        PatrolController::new(
            RecordingMotion::new(),
            DEFAULT_GRID_SIZE,
            MotionConfig::default(),
        )
    }

    fn unknown_everywhere() -> DirectionMap<CellState> {
        DirectionMap::default()
    }

    fn occupied_everywhere() -> DirectionMap<CellState> {
        DirectionMap::from_fn(|_| CellState::Occupied)
    }

    fn quiet() -> Detection {
        Detection::default()
    }

    #[test]
    fn test_first_step_enters_patrolling() {
        let mut controller = controller();

        let pause = controller.step(&unknown_everywhere(), quiet()).unwrap();

        assert_eq!(pause, StepPause::MoveGap);
        assert_eq!(controller.state(), PatrolState::Patrolling);

        let commands = &controller.motion.commands;
        assert_eq!(commands[0], Command::Mode(Mode::Walk));
        assert_eq!(commands[1], Command::Led(0, 255, 0));
        // Unknown cells are passable, so the first move is Front
        assert!(matches!(commands[2], Command::Forward(s, _) if s > 0.0));
        // A stop command closes every move step
        assert_eq!(
            commands.last(),
            Some(&Command::Forward(0.0, MotionConfig::default().move_duration_ms))
        );
    }

    #[test]
    fn test_waving_emits_one_stop_and_one_gesture() {
        let mut controller = controller();
        controller.step(&unknown_everywhere(), quiet()).unwrap();
        controller.motion.commands.clear();

        let pause = controller
            .step(&unknown_everywhere(), Detection { person: true, waving: true })
            .unwrap();

        assert_eq!(pause, StepPause::Dwell);
        assert_eq!(controller.state(), PatrolState::Responding);

        let commands = &controller.motion.commands;
        assert_eq!(
            commands,
            &vec![
                Command::Led(255, 255, 255),
                Command::Forward(0.0, MotionConfig::default().move_duration_ms),
                Command::Mode(Mode::StraightHand1),
            ]
        );
        assert!(commands.iter().all(|c| !c.is_movement()));
    }

    #[test]
    fn test_resume_after_waving_clears() {
        let mut controller = controller();
        controller.step(&unknown_everywhere(), quiet()).unwrap();
        controller
            .step(&unknown_everywhere(), Detection { person: true, waving: true })
            .unwrap();
        controller.motion.commands.clear();

        let pause = controller.step(&unknown_everywhere(), quiet()).unwrap();

        assert_eq!(pause, StepPause::MoveGap);
        assert_eq!(controller.state(), PatrolState::Patrolling);
        assert_eq!(controller.motion.commands[0], Command::Mode(Mode::Walk));
    }

    #[test]
    fn test_surrounded_robot_holds_position() {
        let mut controller = controller();

        let pause = controller.step(&occupied_everywhere(), quiet()).unwrap();

        assert_eq!(pause, StepPause::MoveGap);
        assert_eq!(controller.grid().position(), (5, 5));
        // Startup commands, then only the zero-velocity stop
        assert!(controller.motion.commands.iter().all(|c| !c.is_movement()));
    }

    #[test]
    fn test_blocked_front_moves_left() {
        let mut controller = controller();
        let mut reading = unknown_everywhere();
        reading[Direction::Front] = CellState::Occupied;

        controller.step(&reading, quiet()).unwrap();

        assert!(controller
            .motion
            .commands
            .iter()
            .any(|c| matches!(c, Command::Left(s, _) if *s > 0.0)));
        assert_eq!(controller.grid().position(), (5, 4));
    }

    #[test]
    fn test_rejected_move_does_not_end_patrol() {
        let mut controller = controller();
        controller.motion.behavior = Behavior::RejectMoves;

        let pause = controller.step(&unknown_everywhere(), quiet()).unwrap();

        assert_eq!(pause, StepPause::MoveGap);
        assert_eq!(controller.state(), PatrolState::Patrolling);
    }

    #[test]
    fn test_dead_link_propagates() {
        let mut controller = controller();
        controller.motion.behavior = Behavior::FailAll;

        let err = controller.step(&unknown_everywhere(), quiet()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_stop_is_terminal_and_idempotent() {
        let mut controller = controller();
        controller.step(&unknown_everywhere(), quiet()).unwrap();
        controller.motion.commands.clear();

        controller.stop();
        assert_eq!(controller.state(), PatrolState::Stopped);
        assert_eq!(controller.motion.commands.len(), 1);

        controller.stop();
        assert_eq!(controller.motion.commands.len(), 1);
    }
}
