mod common;

use std::thread;
use std::time::Duration;

use bomber_mcts::{
    Action, BestActionSlot, Grid, Item, Observation, Position, SearchAgent, SearchConfig,
    SearchError, SearchVariant,
};
use common::{about_to_blow, duel, init_logger, model};

#[test]
fn test_decide_escapes_within_budget() {
    init_logger();
    let mut agent = SearchAgent::new(SearchConfig::default().with_seed(7), model());
    let slot = agent.best_action_slot();

    let action = agent
        .decide(&about_to_blow(), &Action::ALL, Duration::from_millis(100))
        .unwrap();
    assert!(action == Action::Up || action == Action::Down);
    assert_eq!(slot.load(), action);
}

#[test]
fn test_action_outside_space_falls_back() {
    let mut agent = SearchAgent::new(SearchConfig::default().with_seed(7), model());

    let action = agent
        .decide(&about_to_blow(), &[Action::Stop], Duration::from_millis(100))
        .unwrap();
    assert_eq!(action, Action::Stop);
    assert_eq!(agent.best_action_slot().load(), Action::Stop);
}

#[test]
fn test_empty_action_space_is_rejected() {
    let mut agent = SearchAgent::new(SearchConfig::default(), model());
    let result = agent.decide(&duel(), &[], Duration::from_millis(10));
    assert!(matches!(result, Err(SearchError::InvalidConfiguration(_))));
}

#[test]
fn test_unknown_self_propagates() {
    let mut agent = SearchAgent::new(SearchConfig::default(), model());
    let obs = Observation::new(Grid::filled(5, 5, Item::Passage), Position::new(2, 2));

    let result = agent.decide(&obs, &Action::ALL, Duration::from_millis(10));
    assert!(matches!(result, Err(SearchError::UnknownSelf { .. })));
}

#[test]
fn test_zero_budget_still_answers() {
    let mut agent = SearchAgent::new(SearchConfig::default().with_seed(3), model());
    let action = agent
        .decide(&duel(), &Action::ALL, Duration::from_millis(0))
        .unwrap();
    assert!(Action::ALL.contains(&action));
}

#[test]
fn test_fixed_depth_variant() {
    let config = SearchConfig::default()
        .with_variant(SearchVariant::FixedDepth)
        .with_depth(1)
        .with_seed(9);
    let mut agent = SearchAgent::new(config, model());

    let action = agent
        .decide(&about_to_blow(), &Action::ALL, Duration::from_millis(10))
        .unwrap();
    assert!(action == Action::Up || action == Action::Down);
}

#[test]
fn test_slot_is_shared_across_threads() {
    let slot = BestActionSlot::new(Action::Stop);
    let writer = slot.clone();

    thread::spawn(move || writer.store(Action::Left))
        .join()
        .unwrap();
    assert_eq!(slot.load(), Action::Left);
    assert_eq!(BestActionSlot::default().load(), Action::Stop);
}
