use minesweeper_inference::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn play(dim: usize, mines: &[Point], config: AgentConfig, seed: u64) -> (GameReport, GridBoard) {
    let board = GridBoard::from_mines(dim, mines).unwrap();
    let mut agent = Agent::new(board, StdRng::seed_from_u64(seed), config).unwrap();
    let report = agent.solve().unwrap();
    (report, agent.board().clone())
}

fn tier(max_tier: Tier) -> AgentConfig {
    AgentConfig {
        max_tier,
        ..AgentConfig::default()
    }
}

#[test]
fn test_lone_corner_mine_needs_no_guess() {
    let (report, board) = play(5, &[Point::new(4, 4)], tier(Tier::Local), 1);

    assert_eq!(report.score_value(), 1.0);
    assert_eq!(report.forced_guesses, 0);
    assert_eq!(report.deductions.global + report.deductions.cardinality, 0);
    for y in 0..5 {
        for x in 0..5 {
            let at = Point::new(x, y);
            assert_eq!(board.is_flagged(at), board.is_mine(at));
            assert_eq!(board.is_revealed(at), !board.is_mine(at));
        }
    }
}

#[test]
fn test_column_of_mines_is_proven_globally() {
    let mines = [Point::new(2, 0), Point::new(2, 2)];
    let (report, board) = play(3, &mines, tier(Tier::Global), 1);

    assert_eq!(report.score_value(), 1.0);
    assert_eq!(report.forced_guesses, 0);
    assert_eq!(report.mines_hit, 0);
    assert!(board.is_revealed(Point::new(2, 1)));
}

#[test]
fn test_local_tier_alone_guesses_on_the_same_layout() {
    let mines = [Point::new(2, 0), Point::new(2, 2)];
    for seed in 0..5 {
        let (report, _) = play(3, &mines, tier(Tier::Local), seed);
        assert!(report.forced_guesses >= 1);
        assert!(report.score.is_some());
    }
}

#[test]
fn test_guess_free_layouts_score_full_marks() {
    let layouts: [&[Point]; 5] = [
        &[Point::new(4, 4)],
        &[Point::new(2, 0), Point::new(2, 2)],
        &[Point::new(1, 3), Point::new(3, 1), Point::new(4, 4)],
        &[Point::new(0, 4), Point::new(4, 0)],
        &[Point::new(4, 3), Point::new(4, 4)],
    ];
    for mines in layouts {
        for max_tier in [Tier::Global, Tier::Cardinality] {
            let (report, _) = play(5, mines, tier(max_tier), 3);
            assert_eq!(report.forced_guesses, 0, "{mines:?} {max_tier:?}");
            assert_eq!(report.mines_hit, 0);
            assert_eq!(report.score_value(), 1.0);
        }
    }
}

#[test]
fn test_mine_count_settles_what_clues_cannot() {
    let mines = [Point::new(2, 2), Point::new(3, 3)];

    let (report, _) = play(5, &mines, tier(Tier::Global), 3);
    assert!(report.forced_guesses >= 1);

    let (report, _) = play(5, &mines, tier(Tier::Cardinality), 3);
    assert_eq!(report.forced_guesses, 0);
    assert!(report.deductions.cardinality > 0);
    assert_eq!(report.score_value(), 1.0);
}

#[test]
fn test_mine_count_over_clause_limit_still_deduces() {
    let mines = [Point::new(2, 2), Point::new(3, 3)];
    let config = AgentConfig {
        cardinality_clause_limit: Some(1),
        ..AgentConfig::default()
    };
    let (report, _) = play(5, &mines, config, 3);
    assert_eq!(report.forced_guesses, 0);
    assert!(report.deductions.cardinality > 0);
}

#[test]
fn test_sequential_counter_plays_like_binomial() {
    let mines = [Point::new(0, 2), Point::new(3, 3)];
    let binomial = play(4, &mines, AgentConfig::default(), 7).0;
    let counter = play(
        4,
        &mines,
        AgentConfig {
            cardinality: CardinalityEncoding::SequentialCounter,
            ..AgentConfig::default()
        },
        7,
    )
    .0;
    assert_eq!(binomial, counter);
}

#[test]
fn test_fogged_random_games_finish() {
    for seed in 0..4 {
        let spec = GameSpec {
            fog_probability: 0.3,
            seed: Some(seed),
            agent: AgentConfig {
                check_consistency: true,
                ..AgentConfig::default()
            },
            ..GameSpec::new(6, 6)
        };
        let report = run_game(&spec).unwrap();
        let score = report.score.unwrap();
        assert_eq!(score.total_mines, 6);
        assert!(score.correct_flags + report.mines_hit <= 6);
    }
}

#[test]
fn test_flags_are_never_wrong() {
    for seed in 0..10 {
        let spec = GameSpec {
            seed: Some(seed),
            ..GameSpec::new(6, 5)
        };
        let report = run_game(&spec).unwrap();
        let score = report.score.unwrap();
        assert_eq!(score.incorrect_flags, 0);
    }
}
