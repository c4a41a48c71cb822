//! REST API endpoint handlers for the Observer server.
//!
//! Read endpoints serve the latest published [`LedgerView`] from
//! [`AppState`]. Write endpoints take a transaction signed by the builder's
//! wallet, check it against the addressed builder, relay it on a
//! background task and report progress through the status board.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/feed` | Live commits, newest first |
//! | `GET` | `/api/leaderboard` | Top builders |
//! | `GET` | `/api/users/{address}` | Stats, badges, puzzle flag, live commit |
//! | `GET` | `/api/users/{address}/commit` | Current on-chain commit |
//! | `POST` | `/api/users/{address}/commit` | Relay a signed `setCommit` |
//! | `DELETE` | `/api/users/{address}/commit` | Relay a signed `clearCommit` |
//! | `GET` | `/api/users/{address}/status` | Transient transaction status |
//! | `GET` | `/api/puzzle` | Today's puzzle |
//! | `POST` | `/api/users/{address}/puzzle` | Answer today's puzzle |
//! | `POST` | `/api/suggest` | Commit helper suggestions |
//! | `POST` | `/api/suggest/improve` | Tidy a draft commitment |
//!
//! [`LedgerView`]: commitboard_types::LedgerView

use std::fmt::Write as _;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use commitboard_chain::{CommitCall, CommitContract, SignedCommit};
use commitboard_core::suggest::{self, Category};
use commitboard_types::{TxStatus, UserProfile, short_address};
use tracing::{info, warn};
use validator::Validate;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Request body for `POST` and `DELETE /api/users/{address}/commit`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignedTransactionRequest {
    /// EIP-2718 encoded transaction, signed by the builder's wallet.
    pub raw_transaction: Bytes,
}

/// The `setCommit` message carried by a signed transaction.
#[derive(Debug, Clone, Validate)]
pub struct CommitMessage {
    /// The commitment text, trimmed. At most 280 characters.
    #[validate(length(min = 1, max = 280))]
    pub message: String,
}

/// Request body for `POST /api/suggest`.
#[derive(Debug, Clone, Default, serde::Deserialize, Validate)]
pub struct SuggestRequest {
    /// Free-text project description; may be empty.
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    /// Return this category's plain templates instead of matching the
    /// description.
    #[serde(default)]
    pub category: Option<Category>,
}

/// Request body for `POST /api/suggest/improve`.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct ImproveRequest {
    /// Draft commitment.
    #[validate(length(min = 1, max = 1000))]
    pub draft: String,
}

/// Request body for `POST /api/users/{address}/puzzle`.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct PuzzleAnswerRequest {
    /// The submitted answer.
    #[validate(length(min = 1, max = 200))]
    pub answer: String,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing indexer status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.view.read().await;
    let latest_block = view.latest_block;
    let live = view.feed.len();
    let builders = view.stats.len();
    let refreshed = view
        .computed_at
        .map_or_else(|| "never".to_owned(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    let mut board = String::new();
    for (rank, entry) in (1_usize..).zip(&view.leaderboard) {
        let _ = write!(
            board,
            "<tr><td>{rank}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            short_address(&entry.address),
            entry.streak,
            entry.commits,
            entry.score,
        );
    }

    let mut feed = String::new();
    for commit in view.feed.iter().take(10) {
        let _ = write!(
            feed,
            "<li><span class=\"who\">{}</span> {}</li>",
            short_address(&commit.user),
            escape_html(&commit.message),
        );
    }
    drop(view);

    let puzzle = if state.puzzles.is_empty() { "off" } else { "on" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Commitboard Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        table {{ border-collapse: collapse; }}
        td, th {{ padding: 0.3rem 1rem 0.3rem 0; text-align: left; }}
        .who {{ color: #7ee787; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Commitboard Observer</h1>
    <p class="subtitle">Builder commitments indexed from chain events</p>

    <div>
        <div class="metric"><div class="label">Block</div><div class="value">{latest_block}</div></div>
        <div class="metric"><div class="label">Live commits</div><div class="value">{live}</div></div>
        <div class="metric"><div class="label">Builders</div><div class="value">{builders}</div></div>
        <div class="metric"><div class="label">Puzzle</div><div class="value">{puzzle}</div></div>
    </div>
    <p class="subtitle">Last refresh: {refreshed}</p>

    <hr>

    <h2>Leaderboard</h2>
    <table>
        <tr><th>#</th><th>Builder</th><th>Streak</th><th>Commits</th><th>Score</th></tr>
        {board}
    </table>

    <h2>Latest commits</h2>
    <ul>{feed}</ul>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/feed">GET /api/feed</a> -- Live commits</li>
        <li><a href="/api/leaderboard">GET /api/leaderboard</a> -- Top builders</li>
        <li>GET /api/users/{{address}} -- Builder profile</li>
        <li>GET | POST | DELETE /api/users/{{address}}/commit -- On-chain commit</li>
        <li>GET /api/users/{{address}}/status -- Transaction status</li>
        <li><a href="/api/puzzle">GET /api/puzzle</a> -- Daily puzzle</li>
        <li>POST /api/suggest | /api/suggest/improve -- Commit helper</li>
        <li>POST /api/users/{{address}}/puzzle -- Answer the puzzle</li>
        <li><code>ws://host:port/ws/feed</code> -- Refresh stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/feed, GET /api/leaderboard
// ---------------------------------------------------------------------------

/// Return the live commit feed, newest first.
pub async fn get_feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.view.read().await;
    Json(serde_json::json!({
        "count": view.feed.len(),
        "latest_block": view.latest_block,
        "commits": view.feed,
    }))
}

/// Return the leaderboard.
pub async fn get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.view.read().await;
    Json(serde_json::json!({
        "count": view.leaderboard.len(),
        "entries": view.leaderboard,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/users/{address}
// ---------------------------------------------------------------------------

/// Return a builder's stats, badges, puzzle flag, and live commit.
///
/// Addresses with no history get zeroed stats rather than a 404.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<UserProfile>, ObserverError> {
    let address = parse_address(&raw)?;
    let puzzle_solved = puzzle_solved_today(&state, &address).await;

    let view = state.view.read().await;
    let stats = view.stats_for(&address);
    let badges = commitboard_ledger::achievements(stats.streak, stats.total_commits, puzzle_solved);

    Ok(Json(UserProfile {
        address,
        stats,
        badges,
        puzzle_solved,
        live_commit: view.live_commit_for(&address).cloned(),
    }))
}

// ---------------------------------------------------------------------------
// /api/users/{address}/commit
// ---------------------------------------------------------------------------

/// Read the current on-chain commit for an address.
pub async fn get_onchain_commit(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let address = parse_address(&raw)?;
    let contract = require_contract(&state)?;
    let commit = contract.get_commit(address).await?;
    Ok(Json(commit))
}

/// Relay a signed `setCommit(message)` for the address.
///
/// The transaction must be signed by the address itself (403 otherwise),
/// target the configured contract and chain, and carry a message of 1 to
/// 280 characters after trimming. Returns `202 Accepted` once the
/// transaction flow has started; progress is reported on the status
/// endpoint.
pub async fn set_commit(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Json(body): Json<SignedTransactionRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let address = parse_address(&raw)?;
    let contract = require_contract(&state)?;
    let signed = contract
        .verify(&body.raw_transaction, address)
        .map_err(|e| ObserverError::rejected(&e))?;
    let CommitCall::Set { message } = &signed.call else {
        return Err(ObserverError::Validation(
            "expected a setCommit transaction".to_owned(),
        ));
    };
    CommitMessage {
        message: message.trim().to_owned(),
    }
    .validate()?;

    let tx_hash = signed.tx_hash;
    let status = start_transaction(&state, contract, signed).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted_body(address, tx_hash, &status))))
}

/// Relay a signed `clearCommit()` for the address.
pub async fn clear_commit(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Json(body): Json<SignedTransactionRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let address = parse_address(&raw)?;
    let contract = require_contract(&state)?;
    let signed = contract
        .verify(&body.raw_transaction, address)
        .map_err(|e| ObserverError::rejected(&e))?;
    if signed.call != CommitCall::Clear {
        return Err(ObserverError::Validation(
            "expected a clearCommit transaction".to_owned(),
        ));
    }

    let tx_hash = signed.tx_hash;
    let status = start_transaction(&state, contract, signed).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted_body(address, tx_hash, &status))))
}

/// Return the transient transaction status for an address.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let address = parse_address(&raw)?;
    let status = state.statuses.read().await.get(&address);
    Ok(Json(status_body(address, status.as_ref())))
}

// ---------------------------------------------------------------------------
// Puzzle
// ---------------------------------------------------------------------------

/// Return today's puzzle without its answer.
pub async fn get_puzzle(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    let today = state.clock.today();
    let puzzle = state
        .puzzles
        .puzzle_for(today)
        .ok_or_else(|| ObserverError::NotFound("no puzzle configured".to_owned()))?;
    Ok(Json(serde_json::json!({
        "date": today,
        "day_index": puzzle.day_index,
        "question": puzzle.question,
        "hint": puzzle.hint,
    })))
}

/// Check an answer to today's puzzle and record a correct one.
///
/// A wrong answer is a normal `200` response with `correct: false`.
pub async fn answer_puzzle(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Json(body): Json<PuzzleAnswerRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let address = parse_address(&raw)?;
    body.validate()?;

    let today = state.clock.today();
    let day_index = state
        .puzzles
        .day_index(today)
        .ok_or_else(|| ObserverError::NotFound("no puzzle configured".to_owned()))?;
    let correct = state.puzzles.check(today, &body.answer).unwrap_or(false);

    let mut flags = state.puzzle_flags.write().await;
    if correct {
        flags.mark_solved(address, today, day_index);
        info!(%address, day_index, "puzzle solved");
    }
    let solved = flags.is_solved(&address, today, day_index);
    drop(flags);

    Ok(Json(serde_json::json!({
        "correct": correct,
        "day_index": day_index,
        "puzzle_solved": solved,
    })))
}

// ---------------------------------------------------------------------------
// Commit helper
// ---------------------------------------------------------------------------

/// Suggest commitment phrasings.
///
/// With a `category`, returns that category's templates unchanged.
/// Otherwise the description is matched to a category and the templates
/// are personalized; an empty description gets general ideas.
pub async fn suggest_commit(
    Json(body): Json<SuggestRequest>,
) -> Result<Json<suggest::Suggestions>, ObserverError> {
    body.validate()?;
    let result = match body.category {
        Some(category) => suggest::quick_templates(category),
        None => suggest::suggest(&body.description),
    };
    Ok(Json(result))
}

/// Tidy a draft commitment.
pub async fn improve_commit(
    Json(body): Json<ImproveRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    body.validate()?;
    let improved = suggest::improve(&body.draft)
        .ok_or_else(|| ObserverError::Validation("draft is blank".to_owned()))?;
    Ok(Json(serde_json::json!({ "text": improved })))
}

// ---------------------------------------------------------------------------
// Transaction flow
// ---------------------------------------------------------------------------

/// Mark the signer as sending and run the transaction in the background.
async fn start_transaction(
    state: &Arc<AppState>,
    contract: Arc<CommitContract>,
    signed: SignedCommit,
) -> Result<TxStatus, ObserverError> {
    let address = signed.sender;
    {
        let mut statuses = state.statuses.write().await;
        if statuses.is_pending(&address) {
            return Err(ObserverError::Conflict(format!(
                "a transaction for {address} is already in flight"
            )));
        }
        statuses.set(address, TxStatus::Sending);
    }

    let state = Arc::clone(state);
    tokio::spawn(async move {
        run_transaction(&state, &contract, signed).await;
    });
    Ok(TxStatus::Sending)
}

/// Relay, await the receipt, then request a refresh. No retry.
async fn run_transaction(state: &AppState, contract: &CommitContract, signed: SignedCommit) {
    let address = signed.sender;
    let outcome = match contract.send(&signed).await {
        Ok(sent) => {
            state.statuses.write().await.set(address, TxStatus::Confirming);
            sent.confirmed().await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            state.statuses.write().await.set(address, TxStatus::Success);
            state.refresh.notify_one();
        }
        Err(e) => {
            warn!(%address, call = ?signed.call, error = %e, "transaction failed");
            state
                .statuses
                .write()
                .await
                .set(address, TxStatus::Error(e.to_string()));
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a hex address from a path segment.
fn parse_address(s: &str) -> Result<Address, ObserverError> {
    s.parse::<Address>()
        .map_err(|e| ObserverError::InvalidAddress(format!("{s}: {e}")))
}

fn require_contract(state: &AppState) -> Result<Arc<CommitContract>, ObserverError> {
    state
        .contract
        .clone()
        .ok_or_else(|| ObserverError::Unavailable("no chain connection configured".to_owned()))
}

async fn puzzle_solved_today(state: &AppState, address: &Address) -> bool {
    let today = state.clock.today();
    match state.puzzles.day_index(today) {
        Some(day_index) => state
            .puzzle_flags
            .read()
            .await
            .is_solved(address, today, day_index),
        None => false,
    }
}

fn status_body(address: Address, status: Option<&TxStatus>) -> serde_json::Value {
    serde_json::json!({
        "address": address,
        "status": status,
        "label": status.map(TxStatus::label),
    })
}

fn accepted_body(address: Address, tx_hash: B256, status: &TxStatus) -> serde_json::Value {
    serde_json::json!({
        "address": address,
        "tx_hash": tx_hash,
        "status": status,
        "label": status.label(),
    })
}

/// Escape user text for the HTML status page.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
