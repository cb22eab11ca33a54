mod common;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use bomber_mcts::{
    Action, BackupMode, MCTree, Mode, Position, SearchConfig, SearchError, SearchPhase,
    UcbPolicy,
};
use common::{about_to_blow, add_bomb, duel, init_logger, model, quiet};

#[test]
fn test_explore_root_picks_a_random_legal_action() {
    init_logger();
    let mut picks = HashSet::new();

    for seed in 0..40 {
        let config = SearchConfig::default().with_seed(seed);
        let mut tree = MCTree::new(quiet(), config, model()).unwrap();
        assert_eq!(tree.root().mode, Mode::Explore);
        assert_eq!(tree.phase(), SearchPhase::Terminated);

        let action = tree.run().unwrap();
        assert!(tree.root().actions().contains(&action));
        assert_eq!(tree.get_statistics().iterations, 0);
        assert_eq!(tree.root().children_count(), 0);
        picks.insert(action);
    }

    // Not biased towards any single action such as Stop
    assert!(picks.len() > 1);
}

#[test]
fn test_escapes_an_imminent_blast() {
    init_logger();
    for seed in 0..10 {
        let config = SearchConfig::default().with_seed(seed);
        let mut tree = MCTree::new(about_to_blow(), config, model()).unwrap();
        assert_eq!(tree.root().mode, Mode::Evade);

        let action = tree.run().unwrap();
        assert!(
            action == Action::Up || action == Action::Down,
            "seed {} chose {:?}",
            seed,
            action
        );
    }
}

#[test]
fn test_search_ends_when_exhausted() {
    let config = SearchConfig::default().with_max_turns(200).with_seed(3);
    let mut tree = MCTree::new(about_to_blow(), config, model()).unwrap();
    tree.run().unwrap();

    let stats = tree.get_statistics();
    assert!(stats.exhausted);
    assert!(!stats.stopped_early);
    // One playout per escape route, then nothing is left to learn
    assert_eq!(stats.iterations, 2);
    assert!(tree.root().exhausted);
    assert_eq!(tree.phase(), SearchPhase::Terminated);
}

#[test]
fn test_drained_branches_are_revisited() {
    // No opponents: every root action has exactly one joint combination, so
    // its cursor drains on the first draw while the child below stays open
    let mut obs = quiet();
    add_bomb(&mut obs, Position::new(2, 3), 3, 2);
    let config = SearchConfig::default()
        .with_depth(2)
        .with_max_turns(10_000)
        .with_seed(4);
    let mut tree = MCTree::new(obs, config, model()).unwrap();
    assert_eq!(tree.root().mode, Mode::Evade);
    tree.run().unwrap();

    let root = tree.root();
    assert!(tree.get_statistics().exhausted);
    assert!(root.is_fully_expanded());
    assert!(tree.get_statistics().iterations > root.branches.len());
    for branch in &root.branches {
        assert_eq!(branch.children.len(), 1);
        for child in &branch.children {
            assert!(child.exhausted);
            assert!(child.is_fully_expanded());
        }
    }
}

#[test]
fn test_turn_budget_is_respected() {
    let config = SearchConfig::default().with_max_turns(5).with_seed(8);
    let mut tree = MCTree::new(duel(), config, model()).unwrap();
    tree.run().unwrap();

    let stats = tree.get_statistics();
    assert!(stats.iterations <= 5);
    assert!(stats.iterations > 0);
    assert_eq!(stats.tree_size, tree.root().subtree_size());
    assert_eq!(stats.forward_steps, stats.tree_size - 1);
    assert!(stats.max_depth <= 2);
    assert_eq!(tree.phase(), SearchPhase::Terminated);
}

#[test]
fn test_best_action_is_idempotent() {
    let config = SearchConfig::default().with_seed(21);
    let mut tree = MCTree::new(duel(), config, model()).unwrap();

    let initial = tree.best_action();
    assert_eq!(initial, tree.best_action());

    for _ in 0..10 {
        tree.step().unwrap();
        let first = tree.best_action();
        assert_eq!(first, tree.best_action());
        assert!(tree.root().actions().contains(&first));
    }
}

#[test]
fn test_action_stats_sorted_best_first() {
    let config = SearchConfig::default().with_max_turns(60).with_seed(2);
    let mut tree = MCTree::new(duel(), config, model()).unwrap();
    let best = tree.run().unwrap();

    let stats = tree.action_stats();
    assert_eq!(stats.len(), tree.root().actions().len());
    assert!(stats.windows(2).all(|pair| pair[0].reward >= pair[1].reward));
    assert_eq!(stats[0].reward, stats.iter().find(|s| s.action == best).unwrap().reward);
}

#[test]
fn test_same_seed_same_search() {
    let run = |seed| {
        let config = SearchConfig::default().with_max_turns(40).with_seed(seed);
        let mut tree = MCTree::new(duel(), config, model()).unwrap();
        let action = tree.run().unwrap();
        (action, tree.action_stats().to_vec(), tree.get_statistics().tree_size)
    };
    assert_eq!(run(17), run(17));
}

#[test]
fn test_deadline_stops_search() {
    let config = SearchConfig::default().with_max_turns(10_000).with_seed(1);
    let mut tree = MCTree::new(duel(), config, model()).unwrap();

    let action = tree.run_until(Some(Instant::now())).unwrap();
    let stats = tree.get_statistics();
    assert!(stats.stopped_early);
    assert_eq!(stats.iterations, 0);
    assert!(tree.root().actions().contains(&action));
}

#[test]
fn test_time_limited_run() {
    let config = SearchConfig::default()
        .with_depth(3)
        .with_max_turns(usize::MAX)
        .with_max_time(Duration::from_millis(50))
        .with_seed(5);
    let mut tree = MCTree::new(duel(), config, model()).unwrap();

    let start = Instant::now();
    tree.run().unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
    let stats = tree.get_statistics();
    assert!(stats.stopped_early || stats.exhausted);
}

#[test]
fn test_adversarial_backup_runs() {
    let config = SearchConfig::default()
        .with_backup_mode(BackupMode::Adversarial)
        .with_max_turns(50)
        .with_seed(4);
    let mut tree = MCTree::new(duel(), config, model())
        .unwrap()
        .with_selection_policy(UcbPolicy::new(1.0));
    let action = tree.run().unwrap();

    assert!(tree.root().actions().contains(&action));
    assert!(tree.root().visited);
    assert!(tree.root().max_reward >= tree.root().aggregate);
}

#[test]
fn test_invalid_config_rejected() {
    let config = SearchConfig::default().with_depth(0);
    match MCTree::new(duel(), config, model()) {
        Err(SearchError::InvalidConfiguration(_)) => {}
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("depth 0 must be rejected"),
    }
}

#[test]
fn test_visualization_lists_nodes() {
    let config = SearchConfig::default().with_max_turns(3).with_seed(12);
    let mut tree = MCTree::new(duel(), config, model()).unwrap();
    tree.run().unwrap();

    let output = tree.visualize_tree();
    assert!(output.starts_with("Root [Attack]"));
    assert_eq!(output.lines().count(), tree.root().subtree_size());
}
