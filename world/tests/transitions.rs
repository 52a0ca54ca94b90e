use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use maze_chase_core::{AgentIndex, CellCoord, Direction, Position};
use maze_chase_world::{apply_action, query, Layout, ScoreTable, TransitionError, WorldState};
use proptest::prelude::*;

const ADVERSARY: AgentIndex = AgentIndex::new(1);

fn world(rows: &[&str], scoring: ScoreTable) -> WorldState {
    let layout = Layout::parse(rows).expect("valid layout");
    WorldState::initial(&layout, usize::MAX, scoring)
}

fn step(state: &WorldState, agent: AgentIndex, direction: Direction) -> WorldState {
    apply_action(state, agent, direction).expect("legal move")
}

fn fingerprint(state: &WorldState) -> u64 {
    let mut hasher = DefaultHasher::new();
    state.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn eating_food_scores_and_leaves_predecessor_untouched() {
    let state = world(&[" P.. "], ScoreTable::classic().with_time_penalty(0));
    let next = step(&state, AgentIndex::CONTROLLED, Direction::East);

    assert_eq!(next.score(), 10);
    assert_eq!(query::food_remaining(&next), 1);
    assert!(!next.is_win());
    assert_eq!(next.delta().food_eaten, Some(CellCoord::new(2, 0)));
    assert_eq!(
        query::controlled_position(&next),
        Some(Position::new(2.0, 0.0))
    );

    assert_eq!(state.score(), 0);
    assert_eq!(query::food_remaining(&state), 2);
    assert_eq!(
        query::controlled_position(&state),
        Some(Position::new(1.0, 0.0))
    );
}

#[test]
fn walking_into_a_dangerous_adversary_loses() {
    let state = world(&["  PG."], ScoreTable::classic());
    let next = step(&state, AgentIndex::CONTROLLED, Direction::East);

    assert!(next.is_lose());
    assert!(!next.is_win());
    assert_eq!(next.score(), -1 - 500);
    assert!(query::legal_actions(&next, AgentIndex::CONTROLLED).is_empty());
    assert_eq!(
        apply_action(&next, ADVERSARY, Direction::West),
        Err(TransitionError::TerminalState)
    );
}

#[test]
fn scared_adversary_is_consumed_and_sent_home() {
    let state = world(&[" Po G."], ScoreTable::classic().with_scared_duration(7));

    let scared = step(&state, AgentIndex::CONTROLLED, Direction::East);
    let half = step(&scared, ADVERSARY, Direction::West);
    assert_eq!(query::adversary_positions(&half), vec![Position::new(3.5, 0.0)]);

    let waited = step(&half, AgentIndex::CONTROLLED, Direction::Stop);
    let approached = step(&waited, ADVERSARY, Direction::West);
    let adversary = approached.agent(ADVERSARY).expect("adversary");
    assert_eq!(adversary.position(), Position::new(3.0, 0.0));
    assert_eq!(adversary.scared_timer(), 5);

    let captured = step(&approached, AgentIndex::CONTROLLED, Direction::East);
    let adversary = captured.agent(ADVERSARY).expect("adversary");
    assert_eq!(adversary.position(), Position::new(4.0, 0.0));
    assert_eq!(adversary.scared_timer(), 0);
    assert!(captured.was_eaten(ADVERSARY));
    assert!(!captured.is_lose());
    assert_eq!(captured.delta().score_change, 200 - 1);
    assert_eq!(captured.score(), 200 - 3);

    let after = step(&captured, AgentIndex::CONTROLLED, Direction::Stop);
    assert!(!after.was_eaten(ADVERSARY));
    assert!(captured.was_eaten(ADVERSARY));
}

#[test]
fn blocked_moves_are_rejected_with_the_alternatives() {
    let state = world(&["P%."], ScoreTable::classic());
    assert_eq!(
        apply_action(&state, AgentIndex::CONTROLLED, Direction::East),
        Err(TransitionError::IllegalAction {
            agent: AgentIndex::CONTROLLED,
            direction: Direction::East,
            possible: vec![Direction::Stop],
        })
    );
}

#[test]
fn adversary_moves_do_not_charge_the_time_penalty() {
    let state = world(&["P   G."], ScoreTable::classic());
    let next = step(&state, ADVERSARY, Direction::West);
    assert_eq!(next.score(), 0);
    assert_eq!(next.delta().moved, Some(ADVERSARY));
}

#[test]
fn snapshots_reached_by_different_paths_compare_equal() {
    let state = world(&["     ", "  P  ", "     "], ScoreTable::classic().with_time_penalty(0));
    let walk = |moves: &[Direction]| {
        moves.iter().fold(state.clone(), |current, direction| {
            step(&current, AgentIndex::CONTROLLED, *direction)
        })
    };
    let via_east = walk(&[Direction::East, Direction::West, Direction::North]);
    let via_west = walk(&[Direction::West, Direction::East, Direction::North]);

    assert_ne!(via_east.delta(), state.delta());
    assert_eq!(via_east, via_west);
    assert_eq!(fingerprint(&via_east), fingerprint(&via_west));
    assert_ne!(via_east, state);
}

/// Scares both adversaries, lets the one starting at (5,0) run out its timer
/// and walk onto the other at (3,0), then walks the controlled agent onto both.
fn converge_on_stacked_adversaries(rows: &[&str], runner: AgentIndex) -> WorldState {
    let mut state = world(rows, ScoreTable::classic().with_scared_duration(2));
    state = step(&state, AgentIndex::CONTROLLED, Direction::East);
    for _ in 0..3 {
        state = step(&state, runner, Direction::West);
    }
    state = step(&state, AgentIndex::CONTROLLED, Direction::East);
    step(&state, AgentIndex::CONTROLLED, Direction::East)
}

#[test]
fn scared_adversary_earlier_in_turn_order_is_consumed_before_the_loss() {
    let end = converge_on_stacked_adversaries(&["Po G G."], AgentIndex::new(2));
    assert!(end.was_eaten(AgentIndex::new(1)));
    assert!(end.is_lose());
    assert_eq!(end.score(), -3 + 200 - 500);
}

#[test]
fn dangerous_adversary_earlier_in_turn_order_stops_evaluation() {
    let end = converge_on_stacked_adversaries(&["Po 2 1."], AgentIndex::new(1));
    assert!(!end.was_eaten(AgentIndex::new(2)));
    assert_eq!(end.agent(AgentIndex::new(2)).map(|a| a.scared_timer()), Some(2));
    assert!(end.is_lose());
    assert_eq!(end.score(), -3 - 500);
}

fn play(choices: &[usize]) -> Vec<WorldState> {
    let mut state = world(
        &[
            "%%%%%%%",
            "%P. .o%",
            "% %% .%",
            "%.  G %",
            "%%%%%%%",
        ],
        ScoreTable::classic(),
    );
    let mut trail = vec![state.clone()];
    for (turn, choice) in choices.iter().enumerate() {
        let agent = AgentIndex::new(turn % state.agent_count());
        let legal = query::legal_actions(&state, agent);
        if legal.is_empty() {
            break;
        }
        state = step(&state, agent, legal[choice % legal.len()]);
        trail.push(state.clone());
    }
    trail
}

proptest! {
    #[test]
    fn replaying_legal_moves_is_deterministic(choices in prop::collection::vec(0usize..8, 0..60)) {
        let first = play(&choices);
        let second = play(&choices);
        prop_assert_eq!(first.len(), second.len());
        for (left, right) in first.iter().zip(&second) {
            prop_assert_eq!(left, right);
            prop_assert_eq!(fingerprint(left), fingerprint(right));
            prop_assert_eq!(left.to_string(), right.to_string());
        }
    }

    #[test]
    fn equal_snapshots_hash_equally(
        left in prop::collection::vec(0usize..8, 0..30),
        right in prop::collection::vec(0usize..8, 0..30),
    ) {
        let left = play(&left);
        let right = play(&right);
        for a in &left {
            for b in &right {
                if a == b {
                    prop_assert_eq!(fingerprint(a), fingerprint(b));
                }
            }
        }
    }
}
