//! Integration tests for turn sequencing and level progression.

use ladder_engine::{
    GameStatus, Ladder, Level, Mark, MoveError, MoveTarget, NextTarget, Outcome, PendingMove,
    Player, RecordEvent, RecordKind, TurnReport, TurnStatus,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::rngs::mock::StepRng;

/// Infection trials never succeed with this source.
fn no_infection() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

/// Plays the human at `human`, then the opponent at `opponent`.
fn exchange<R: rand::Rng>(
    ladder: &mut Ladder,
    human: MoveTarget,
    opponent: MoveTarget,
    rng: &mut R,
) -> TurnReport {
    let report = ladder.human_move(human, rng).expect("Human move rejected");
    let pending = report.pending.expect("Opponent move not scheduled");
    ladder
        .opponent_move(pending, opponent, rng)
        .expect("Opponent move rejected")
}

fn flat(i: usize) -> MoveTarget {
    MoveTarget::Flat(i)
}

fn nested(board: usize, cell: usize) -> MoveTarget {
    MoveTarget::Nested { board, cell }
}

#[test]
fn test_level_one_win_records_and_advances() {
    let mut ladder = Ladder::new();
    let mut rng = StdRng::seed_from_u64(1);

    exchange(&mut ladder, flat(0), flat(3), &mut rng);
    exchange(&mut ladder, flat(1), flat(4), &mut rng);
    let report = ladder.human_move(flat(2), &mut rng).expect("Winning move rejected");

    assert_eq!(report.status, TurnStatus::HumanWin);
    assert_eq!(
        report.record,
        Some(RecordEvent {
            level: Level::Classic,
            kind: RecordKind::Win
        })
    );
    assert_eq!(report.advanced_to, Some(Level::Memory));
    assert!(report.pending.is_none());

    assert_eq!(ladder.level(), Level::Memory);
    let board = ladder.session().board().expect("Memory is a flat level");
    assert_eq!(board.side(), 3);
    assert!(board.cells().iter().all(|m| m.is_empty()));
    assert_eq!(ladder.session().turns(), 0);
    assert_eq!(ladder.session().to_move(), Player::X);
}

#[test]
fn test_climb_through_flat_levels() {
    let mut ladder = Ladder::new();
    let mut rng = no_infection();

    // Classic, Memory and Overlay: top row against the middle row.
    for level in [Level::Classic, Level::Memory, Level::Overlay] {
        assert_eq!(ladder.level(), level);
        exchange(&mut ladder, flat(0), flat(3), &mut rng);
        exchange(&mut ladder, flat(1), flat(4), &mut rng);
        let report = ladder.human_move(flat(2), &mut rng).expect("Winning move rejected");
        assert_eq!(report.status, TurnStatus::HumanWin, "on {}", level);
    }

    // Gravity: any cell of a column drops to the bottom.
    assert_eq!(ladder.level(), Level::Gravity);
    let report = exchange(&mut ladder, flat(0), flat(0), &mut rng);
    assert_eq!(report.target, flat(3));
    exchange(&mut ladder, flat(1), flat(1), &mut rng);
    let report = ladder.human_move(flat(2), &mut rng).expect("Winning move rejected");
    assert_eq!(report.target, flat(8));
    assert_eq!(report.status, TurnStatus::HumanWin);

    // Infection: four in a row on 4x4.
    assert_eq!(ladder.level(), Level::Infection);
    for (human, opponent) in [(0, 12), (1, 13), (2, 14)] {
        exchange(&mut ladder, flat(human), flat(opponent), &mut rng);
    }
    let report = ladder.human_move(flat(3), &mut rng).expect("Winning move rejected");
    assert_eq!(report.status, TurnStatus::HumanWin);
    assert_eq!(report.advanced_to, Some(Level::Rotation));
}

#[test]
fn test_rotation_level_win_across_turns() {
    let mut ladder = Ladder::starting_at(Level::Rotation);
    let mut rng = no_infection();

    exchange(&mut ladder, flat(0), flat(15), &mut rng);
    let third = ladder.human_move(flat(1), &mut rng).expect("Move rejected");
    assert!(third.rotation.is_some());
    let pending = third.pending.expect("Opponent move not scheduled");
    ladder.opponent_move(pending, flat(13), &mut rng).expect("Move rejected");

    let report = exchange(&mut ladder, flat(11), flat(14), &mut rng);
    let cells = report.rotation.expect("Sixth turn rotates");
    let x = Mark::Occupied(Player::X);
    assert_eq!(&cells[13..16], &[x, x, x]);
    assert_eq!(ladder.session().turns(), 6);

    let report = ladder.human_move(flat(12), &mut rng).expect("Winning move rejected");
    assert_eq!(report.status, TurnStatus::HumanWin);
    assert_eq!(report.advanced_to, Some(Level::Ultimate));
}

#[test]
fn test_ultimate_win_clears_ladder() {
    let mut ladder = Ladder::starting_at(Level::Ultimate);
    let mut rng = StdRng::seed_from_u64(3);

    // X takes the bottom row of boards 0-2; each reply sends X back.
    let script = [
        ((0, 6), (6, 0)),
        ((0, 7), (7, 0)),
        ((0, 8), (8, 1)),
        ((1, 6), (6, 1)),
        ((1, 7), (7, 1)),
        ((1, 8), (8, 2)),
        ((2, 6), (6, 2)),
        ((2, 7), (7, 2)),
    ];
    for ((hb, hc), (ob, oc)) in script {
        exchange(&mut ladder, nested(hb, hc), nested(ob, oc), &mut rng);
    }
    let report = ladder.human_move(nested(2, 8), &mut rng).expect("Winning move rejected");

    assert_eq!(report.status, TurnStatus::HumanWin);
    assert_eq!(report.super_update.and_then(|u| u.decided), Some(2));
    assert_eq!(report.advanced_to, None);
    assert_eq!(report.record.map(|r| r.level), Some(Level::Ultimate));
    assert!(ladder.is_cleared());
    assert_eq!(
        ladder.session().status(),
        GameStatus::Decided(Outcome::Winner(Player::X))
    );
}

#[test]
fn test_decided_sub_board_frees_next_move() {
    let mut ladder = Ladder::starting_at(Level::Ultimate);
    let mut rng = StdRng::seed_from_u64(9);
    exchange(&mut ladder, nested(0, 6), nested(6, 0), &mut rng);
    exchange(&mut ladder, nested(0, 7), nested(7, 0), &mut rng);
    let report = ladder.human_move(nested(0, 8), &mut rng).expect("Move rejected");
    let update = report.super_update.expect("Composite move");
    assert_eq!(update.decided, Some(0));
    assert_eq!(update.next, NextTarget::Board(8));

    let pending = report.pending.expect("Opponent move not scheduled");
    // Sending O into the decided board 0 frees X's next move.
    let reply = ladder
        .opponent_move(pending, nested(8, 0), &mut rng)
        .expect("Move rejected");
    assert_eq!(reply.super_update.map(|u| u.next), Some(NextTarget::Free));
    assert_eq!(
        ladder.human_move(nested(0, 4), &mut rng),
        Err(MoveError::BoardClosed(0))
    );
    ladder.human_move(nested(5, 5), &mut rng).expect("Free move rejected");
}

#[test]
fn test_stale_pending_move_is_dropped() {
    let mut ladder = Ladder::new();
    let mut rng = StdRng::seed_from_u64(5);
    let report = ladder.human_move(flat(4), &mut rng).expect("Move rejected");
    let stale: PendingMove = report.pending.expect("Opponent move not scheduled");

    let record = ladder.reset();
    assert_eq!(record.map(|r| r.kind), Some(RecordKind::Fail));
    assert_eq!(ladder.play_pending(stale, &mut rng), Err(MoveError::StaleSession));

    let board = ladder.session().board().expect("Flat level");
    assert!(board.cells().iter().all(|m| m.is_empty()));
    assert!(ladder.accepts_input());
}

#[test]
fn test_heuristic_opponent_blocks_in_session() {
    let mut ladder = Ladder::new();
    let mut rng = StdRng::seed_from_u64(11);
    exchange(&mut ladder, flat(0), flat(4), &mut rng);
    let report = ladder.human_move(flat(1), &mut rng).expect("Move rejected");
    let reply = ladder
        .play_pending(report.pending.expect("Opponent move not scheduled"), &mut rng)
        .expect("Opponent move failed");
    assert_eq!(reply.target, flat(2));
    assert_eq!(reply.mover, Player::O);
}

#[test]
fn test_memory_level_erases_oldest_mark() {
    let mut ladder = Ladder::starting_at(Level::Memory);
    let mut rng = StdRng::seed_from_u64(2);
    exchange(&mut ladder, flat(0), flat(4), &mut rng);
    exchange(&mut ladder, flat(2), flat(1), &mut rng);
    exchange(&mut ladder, flat(6), flat(8), &mut rng);
    let report = ladder.human_move(flat(5), &mut rng).expect("Move rejected");
    assert!(report.changes.iter().any(|c| c.target == flat(0) && c.mark == Mark::Empty));
    let board = ladder.session().board().expect("Flat level");
    assert_eq!(board.get(0), Some(Mark::Empty));
}

#[test]
fn test_record_event_wire_format() {
    let event = RecordEvent {
        level: Level::Overlay,
        kind: RecordKind::Fail,
    };
    let kind = serde_json::to_value(event.kind).expect("Serialize failed");
    assert_eq!(kind, serde_json::json!("fail"));
    assert_eq!(RecordKind::Win.to_string(), "win");
}
