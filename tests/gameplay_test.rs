mod common;

use axum::Router;
use axum::http::StatusCode;
use migration::{Migrator, MigratorTrait};
use serde_json::json;
use tokio::time::{timeout, Duration};

use gridplay_api::config::{Config, Environment};
use gridplay_api::state::AppState;

async fn test_app() -> Router {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let config = Config {
        database_url: String::new(),
        server_host: std::net::IpAddr::from([127, 0, 0, 1]),
        server_port: 0,
        environment: Environment::Development,
        log_level: "warn".to_string(),
        cors_origins: vec![],
    };

    gridplay_api::routes::router().with_state(AppState::new(db, config))
}

/// Like `test_app`, but with the pool capped at one connection.
///
/// An in-memory SQLite database exists per connection, so racing requests
/// must share the single writer; its transactions serialize them the same
/// way the row lock does on a server database.
async fn serialized_test_app() -> Router {
    let mut opts = sea_orm::ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(opts).await.unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let config = Config {
        database_url: String::new(),
        server_host: std::net::IpAddr::from([127, 0, 0, 1]),
        server_port: 0,
        environment: Environment::Development,
        log_level: "warn".to_string(),
        cors_origins: vec![],
    };

    gridplay_api::routes::router().with_state(AppState::new(db, config))
}

async fn create_user(app: &Router, name: &str) -> String {
    let (status, body) = common::post_json(app, "/users", &json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
    let user: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    user["id"].as_str().unwrap_or_default().to_string()
}

/// Create two users and an active session between them.
/// Returns (host_id, guest_id, session_id).
async fn active_session(app: &Router, game_type: &str) -> (String, String, String) {
    let host = create_user(app, "host").await;
    let guest = create_user(app, "guest").await;

    let (status, body) = common::post_json(
        app,
        "/sessions",
        &json!({ "hostId": host, "gameType": game_type }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create session failed: {body}");
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let session_id = session["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = common::post_json(
        app,
        &format!("/sessions/{session_id}/join"),
        &json!({ "playerId": guest }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "join failed: {body}");

    (host, guest, session_id)
}

/// Submit one move and return (status, response JSON).
async fn play(
    app: &Router,
    session_id: &str,
    player_id: &str,
    row: i32,
    col: i32,
) -> (StatusCode, serde_json::Value) {
    let (status, body) = common::post_json(
        app,
        &format!("/sessions/{session_id}/move"),
        &json!({ "playerId": player_id, "row": row, "col": col }),
    )
    .await;
    (status, serde_json::from_str(&body).unwrap_or_default())
}

/// Play a scripted sequence of moves, all expected to succeed; returns the
/// final session state.
async fn play_all(
    app: &Router,
    session_id: &str,
    moves: &[(&str, i32, i32)],
) -> serde_json::Value {
    let mut last = serde_json::Value::Null;
    for &(player, row, col) in moves {
        let (status, session) = play(app, session_id, player, row, col).await;
        assert_eq!(status, StatusCode::OK, "move ({row}, {col}) failed: {session}");
        last = session;
    }
    last
}

/// Assert the board/move-log consistency invariants: the number of filled
/// cells equals the number of moves, each move's cell holds its player, and
/// move numbers form the contiguous sequence 1..N.
fn assert_board_matches_moves(session: &serde_json::Value) {
    let board = session["board"].as_array().cloned().unwrap_or_default();
    let moves = session["moves"].as_array().cloned().unwrap_or_default();

    let filled = board
        .iter()
        .flat_map(|row| row.as_array().cloned().unwrap_or_default())
        .filter(|cell| !cell.is_null())
        .count();
    assert_eq!(filled, moves.len(), "filled cells != recorded moves");

    for (index, game_move) in moves.iter().enumerate() {
        let row = game_move["row"].as_u64().unwrap_or_default() as usize;
        let col = game_move["col"].as_u64().unwrap_or_default() as usize;
        assert_eq!(
            board[row][col], game_move["playerId"],
            "cell ({row}, {col}) does not hold the mover"
        );
        assert_eq!(
            game_move["moveNo"].as_u64(),
            Some(index as u64 + 1),
            "move numbers must be 1..N without gaps"
        );
    }
}

/// Assert the connect-four gravity invariant: each column is filled as a
/// contiguous segment from the bottom.
fn assert_no_floating_pieces(session: &serde_json::Value) {
    let board = session["board"].as_array().cloned().unwrap_or_default();
    let rows = board.len();
    let cols = board
        .first()
        .and_then(|row| row.as_array().map(Vec::len))
        .unwrap_or_default();

    for col in 0..cols {
        let mut seen_piece = false;
        for row in 0..rows {
            let occupied = !board[row][col].is_null();
            assert!(
                !(seen_piece && !occupied),
                "floating piece above empty cell in column {col}"
            );
            seen_piece |= occupied;
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tic-tac-toe scenarios
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tic_tac_toe_diagonal_win() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    let final_state = play_all(
        &app,
        &session_id,
        &[
            (&host, 0, 0),
            (&guest, 0, 1),
            (&host, 1, 1),
            (&guest, 0, 2),
            (&host, 2, 2),
        ],
    )
    .await;

    assert_eq!(final_state["status"], "FINISHED");
    assert_eq!(final_state["winner"], json!(host));
    assert_eq!(final_state["draw"], false);
    assert!(final_state["currentTurn"].is_null());
    assert_eq!(final_state["moves"].as_array().map(Vec::len), Some(5));
    assert_board_matches_moves(&final_state);
}

#[tokio::test]
async fn tic_tac_toe_draw() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    let final_state = play_all(
        &app,
        &session_id,
        &[
            (&host, 0, 0),
            (&guest, 0, 1),
            (&host, 0, 2),
            (&guest, 1, 1),
            (&host, 1, 0),
            (&guest, 1, 2),
            (&host, 2, 1),
            (&guest, 2, 0),
            (&host, 2, 2),
        ],
    )
    .await;

    assert_eq!(final_state["status"], "FINISHED");
    assert_eq!(final_state["draw"], true);
    assert!(final_state["winner"].is_null());
    assert!(final_state["currentTurn"].is_null());
    assert_eq!(final_state["moves"].as_array().map(Vec::len), Some(9));
    assert_board_matches_moves(&final_state);
}

#[tokio::test]
async fn out_of_turn_move_rejected_and_state_unchanged() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    // Guest tries to move first; host is on turn
    let (status, error) = play(&app, &session_id, &guest, 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "NOT_YOUR_TURN");

    let (status, body) = common::get(&app, &format!("/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(session["moves"].as_array().map(Vec::len), Some(0));
    assert_eq!(session["currentTurn"], json!(host));
    assert_board_matches_moves(&session);
}

#[tokio::test]
async fn contended_cell_only_first_move_lands() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    // Both players race for the center; the engine serializes them. The
    // guest's request loses whichever way the race resolves: out of turn if
    // it runs first, occupied cell if it runs second.
    let (status, _session) = play(&app, &session_id, &host, 1, 1).await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = play(&app, &session_id, &guest, 1, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "CELL_OCCUPIED");

    let (status, body) = common::get(&app, &format!("/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(session["moves"].as_array().map(Vec::len), Some(1));
    assert_board_matches_moves(&session);
}

#[tokio::test]
async fn concurrent_moves_on_same_cell_commit_exactly_once() {
    let app = serialized_test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    // Both players race for the center at once; the store picks the order.
    // The guest loses whichever way it resolves: out of turn when scheduled
    // first, occupied cell when scheduled second.
    let (host_result, guest_result) = tokio::join!(
        timeout(Duration::from_secs(5), play(&app, &session_id, &host, 1, 1)),
        timeout(Duration::from_secs(5), play(&app, &session_id, &guest, 1, 1)),
    );

    let (host_status, host_body) = host_result.expect("host move timed out");
    let (guest_status, guest_body) = guest_result.expect("guest move timed out");

    assert_eq!(host_status, StatusCode::OK, "{host_body}");
    assert_eq!(guest_status, StatusCode::CONFLICT, "{guest_body}");
    let code = guest_body["code"].as_str().unwrap_or_default();
    assert!(
        code == "NOT_YOUR_TURN" || code == "CELL_OCCUPIED",
        "unexpected conflict code: {code}"
    );

    // Exactly one move committed either way
    let (status, body) = common::get(&app, &format!("/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(session["moves"].as_array().map(Vec::len), Some(1));
    assert_eq!(session["board"][1][1], json!(host));
    assert_eq!(session["currentTurn"], json!(guest));
    assert_board_matches_moves(&session);
}

#[tokio::test]
async fn concurrent_moves_on_distinct_cells_linearize() {
    let app = serialized_test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    // Distinct cells: when the host's request runs first the guest is then
    // on turn and both land; when the guest's runs first it fails out of
    // turn and only the host's lands.
    let (host_result, guest_result) = tokio::join!(
        timeout(Duration::from_secs(5), play(&app, &session_id, &host, 0, 0)),
        timeout(Duration::from_secs(5), play(&app, &session_id, &guest, 1, 1)),
    );

    let (host_status, host_body) = host_result.expect("host move timed out");
    let (guest_status, guest_body) = guest_result.expect("guest move timed out");

    assert_eq!(host_status, StatusCode::OK, "{host_body}");
    assert!(
        guest_status == StatusCode::OK || guest_status == StatusCode::CONFLICT,
        "unexpected guest status {guest_status}: {guest_body}"
    );
    if guest_status == StatusCode::CONFLICT {
        assert_eq!(guest_body["code"], "NOT_YOUR_TURN");
    }

    // The committed log is a valid linearization: the host's move leads,
    // numbering is gap-free and the board mirrors the log
    let (status, body) = common::get(&app, &format!("/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let moves = session["moves"].as_array().cloned().unwrap_or_default();
    let expected = if guest_status == StatusCode::OK { 2 } else { 1 };
    assert_eq!(moves.len(), expected);
    assert_eq!(moves[0]["playerId"], json!(host));
    assert_board_matches_moves(&session);
}

#[tokio::test]
async fn out_of_bounds_move_rejected() {
    let app = test_app().await;
    let (host, _guest, session_id) = active_session(&app, "tic_tac_toe").await;

    let (status, error) = play(&app, &session_id, &host, 3, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_COORDINATES");

    let (status, error) = play(&app, &session_id, &host, 0, -1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_COORDINATES");
}

#[tokio::test]
async fn stranger_cannot_move() {
    let app = test_app().await;
    let (_host, _guest, session_id) = active_session(&app, "tic_tac_toe").await;
    let stranger = create_user(&app, "stranger").await;

    let (status, error) = play(&app, &session_id, &stranger, 0, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "NOT_IN_SESSION");
}

#[tokio::test]
async fn move_before_join_rejected() {
    let app = test_app().await;
    let host = create_user(&app, "host").await;
    let (status, body) =
        common::post_json(&app, "/sessions", &json!({ "hostId": host })).await;
    assert_eq!(status, StatusCode::CREATED);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let session_id = session["id"].as_str().unwrap_or_default();

    let (status, error) = play(&app, session_id, &host, 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "NOT_ACTIVE");
}

#[tokio::test]
async fn finished_session_is_absorbing() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    let final_state = play_all(
        &app,
        &session_id,
        &[
            (&host, 0, 0),
            (&guest, 0, 1),
            (&host, 1, 1),
            (&guest, 0, 2),
            (&host, 2, 2),
        ],
    )
    .await;
    assert_eq!(final_state["status"], "FINISHED");

    // Any further move is rejected and leaves the state untouched
    let (status, error) = play(&app, &session_id, &guest, 2, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "ALREADY_FINISHED");

    let (status, body) = common::get(&app, &format!("/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(session["moves"].as_array().map(Vec::len), Some(5));
    assert_eq!(session["winner"], json!(host));
    assert_board_matches_moves(&session);
}

#[tokio::test]
async fn join_after_finish_rejected() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "tic_tac_toe").await;

    play_all(
        &app,
        &session_id,
        &[
            (&host, 0, 0),
            (&guest, 0, 1),
            (&host, 1, 1),
            (&guest, 0, 2),
            (&host, 2, 2),
        ],
    )
    .await;

    let third = create_user(&app, "third").await;
    let (status, body) = common::post_json(
        &app,
        &format!("/sessions/{session_id}/join"),
        &json!({ "playerId": third }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(error["code"], "ALREADY_FINISHED");

    let (status, body) = common::get(&app, &format!("/sessions/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(session["players"].as_array().map(Vec::len), Some(2));
    assert_eq!(session["winner"], json!(host));
}

// ──────────────────────────────────────────────────────────────────────────────
// Connect four scenarios
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_four_vertical_win() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "connect_four").await;

    // Host stacks column 3, guest stacks column 4; host completes four first
    let final_state = play_all(
        &app,
        &session_id,
        &[
            (&host, 5, 3),
            (&guest, 5, 4),
            (&host, 4, 3),
            (&guest, 4, 4),
            (&host, 3, 3),
            (&guest, 3, 4),
            (&host, 2, 3),
        ],
    )
    .await;

    assert_eq!(final_state["status"], "FINISHED");
    assert_eq!(final_state["winner"], json!(host));
    assert!(final_state["currentTurn"].is_null());
    assert_board_matches_moves(&final_state);
    assert_no_floating_pieces(&final_state);

    // The winning run: column 3, rows 2..=5
    let board = final_state["board"].as_array().cloned().unwrap_or_default();
    for row in 2..=5 {
        assert_eq!(board[row][3], json!(host));
    }
}

#[tokio::test]
async fn connect_four_rejects_floating_piece() {
    let app = test_app().await;
    let (host, _guest, session_id) = active_session(&app, "connect_four").await;

    // Row 4 of an empty column is not the drop row
    let (status, error) = play(&app, &session_id, &host, 4, 3).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "CELL_OCCUPIED");
}

#[tokio::test]
async fn connect_four_rejects_full_column() {
    let app = test_app().await;
    let (host, guest, session_id) = active_session(&app, "connect_four").await;

    // Alternate into column 0 until it fills (six pieces, no four-run)
    let final_state = play_all(
        &app,
        &session_id,
        &[
            (&host, 5, 0),
            (&guest, 4, 0),
            (&host, 3, 0),
            (&guest, 2, 0),
            (&host, 1, 0),
            (&guest, 0, 0),
        ],
    )
    .await;
    assert_eq!(final_state["status"], "ACTIVE");
    assert_no_floating_pieces(&final_state);

    let (status, error) = play(&app, &session_id, &host, 0, 0).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "CELL_OCCUPIED");
}

#[tokio::test]
async fn connect_four_column_out_of_range() {
    let app = test_app().await;
    let (host, _guest, session_id) = active_session(&app, "connect_four").await;

    let (status, error) = play(&app, &session_id, &host, 5, 7).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_COORDINATES");
}
