//! End-to-end scoreboard flows through the public API only.

use std::cell::RefCell;
use std::rc::Rc;

use reactive_element::{
    element, page, ElementProps, MemoryDocument, MemoryNode, Node, Player, Scoreboard,
    ScoreboardConfig, State, Value,
};

fn mount() -> (MemoryDocument, Scoreboard) {
    let config = ScoreboardConfig::default();
    let doc = page(&config);
    let board = Scoreboard::mount(&doc, &config).unwrap();
    (doc, board)
}

#[test]
fn full_game_then_reset() {
    let (doc, board) = mount();
    let score_node = doc.find(".score").unwrap();

    for _ in 0..4 {
        doc.dispatch(".player-one", "click");
    }
    doc.dispatch(".player-two", "click");
    assert_eq!(score_node.content(), "4 to 1");
    assert!(!board.is_game_over());

    doc.dispatch(".player-one", "click");
    assert_eq!(score_node.content(), "<span class=\"green\">5</span> to 1");
    assert_eq!(board.winner(), Some(Player::One));

    // Clicks are ignored after game over
    doc.dispatch(".player-two", "click");
    assert_eq!(board.score_of(Player::Two), 1);

    doc.dispatch(".reset", "click");
    assert_eq!(score_node.content(), "0 to 0");
    doc.dispatch(".player-two", "click");
    assert_eq!(board.score_of(Player::Two), 1);
}

#[test]
fn application_observers_see_every_increment() {
    let (_doc, board) = mount();
    let calls = Rc::new(RefCell::new(Vec::new()));

    let calls_clone = calls.clone();
    board
        .score
        .subscribe(["playerOne", "playerTwo"], move |values: &[Value]| {
            calls_clone.borrow_mut().push(values.to_vec());
        });

    for _ in 0..4 {
        board.increment_score(Player::One);
    }
    board.reset_game();

    let expected: Vec<Vec<Value>> = (1..=4)
        .map(|n| vec![Value::Int(n), Value::Int(0)])
        .collect();
    assert_eq!(*calls.borrow(), expected);
    assert_eq!(
        board.score.state(),
        State::from([("playerOne", 0), ("playerTwo", 0)])
    );
}

#[test]
fn custom_selectors_and_threshold() {
    let config = ScoreboardConfig {
        play_to: 2,
        player_one: "#left".into(),
        player_two: "#right".into(),
        play_to_input: "#limit".into(),
        reset_button: "#again".into(),
        play_to_label: "#label".into(),
        score: "p#tally".into(),
    };
    let doc = page(&config);
    assert_eq!(doc.find("#limit").unwrap().value().as_deref(), Some("2"));
    assert_eq!(doc.find("#left").unwrap().content(), "Player One");

    let board = Scoreboard::mount(&doc, &config).unwrap();

    assert_eq!(doc.find("#label").unwrap().content(), "Playing to 2");
    doc.dispatch("#right", "click");
    doc.dispatch("#right", "click");
    assert_eq!(board.winner(), Some(Player::Two));
    assert_eq!(doc.find("#tally").unwrap().content(), "0 to <span class=\"green\">2</span>");
}

#[test]
fn independent_elements_share_nothing() {
    let doc = MemoryDocument::new();
    doc.append(MemoryNode::new("div").with_class("a"));
    doc.append(MemoryNode::new("div").with_class("b"));

    let render = |state: &State| state.value_of("n").to_string();
    let a = element(&doc, ".a", ElementProps::stateful(State::from([("n", 0)]), render)).unwrap();
    let b = element(&doc, ".b", ElementProps::stateful(State::from([("n", 0)]), render)).unwrap();

    a.mutate(|_| State::from([("n", 9)]));

    assert_eq!(doc.find(".a").unwrap().content(), "9");
    assert_eq!(doc.find(".b").unwrap().content(), "0");
    assert_eq!(b.state().get_int("n"), Some(0));
}
