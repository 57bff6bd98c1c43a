//! Background worker that owns the controller.
//!
//! Front ends send [`WorkerRequest`]s and get [`WorkerResponse`]s back, plus a
//! `watch` receiver with the latest snapshot. The worker handles one command
//! at a time; anything that arrives while a turn is in flight is refused
//! with [`CommandError::Pending`] instead of being queued.

use crate::controller::{GameController, SessionConfig, TurnOutcome};
use crate::oracle::Oracle;
use crate::session::{CommandError, SessionSnapshot};
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Request sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Start (or restart) a game.
    StartGame,
    /// Submit the player's verse.
    SubmitVerse(String),
    /// Stop the worker, abandoning any turn in flight.
    Shutdown,
}

/// Response sent from the worker to the UI.
#[derive(Debug)]
pub enum WorkerResponse {
    /// A game was opened.
    Started,
    /// The game could not be opened; the session is inactive again.
    StartFailed(CommandError),
    /// A submitted verse was judged (or failed to be).
    TurnComplete(TurnOutcome),
    /// The command was refused without touching the session.
    Rejected(CommandError),
}

/// Channel endpoints for talking to a running worker.
pub struct WorkerHandle {
    pub requests: mpsc::Sender<WorkerRequest>,
    pub responses: mpsc::Receiver<WorkerResponse>,
    pub updates: watch::Receiver<SessionSnapshot>,
    pub task: JoinHandle<()>,
}

/// Spawn the worker on the current tokio runtime.
pub fn spawn_worker<O>(oracle: O, config: SessionConfig) -> WorkerHandle
where
    O: Oracle + 'static,
{
    let (request_tx, request_rx) = mpsc::channel(8);
    let (response_tx, response_rx) = mpsc::channel(32);

    let controller = GameController::new(oracle, config);
    let updates = controller.subscribe();

    let task = tokio::spawn(worker_loop(controller, request_rx, response_tx));

    WorkerHandle {
        requests: request_tx,
        responses: response_rx,
        updates,
        task,
    }
}

/// The main worker loop that processes requests.
async fn worker_loop<O: Oracle>(
    mut controller: GameController<O>,
    mut request_rx: mpsc::Receiver<WorkerRequest>,
    response_tx: mpsc::Sender<WorkerResponse>,
) {
    info!("Worker started");
    while let Some(request) = request_rx.recv().await {
        let keep_going = match request {
            WorkerRequest::StartGame => {
                let turn = controller.start_game();
                let result = run_exclusive(turn, &mut request_rx, &response_tx).await;
                match result {
                    Some(Ok(())) => send(&response_tx, WorkerResponse::Started).await,
                    Some(Err(CommandError::Connection(e))) => {
                        send(
                            &response_tx,
                            WorkerResponse::StartFailed(CommandError::Connection(e)),
                        )
                        .await
                    }
                    Some(Err(refused)) => {
                        send(&response_tx, WorkerResponse::Rejected(refused)).await
                    }
                    None => false,
                }
            }
            WorkerRequest::SubmitVerse(text) => {
                let turn = controller.submit_verse(&text);
                match run_exclusive(turn, &mut request_rx, &response_tx).await {
                    Some(Ok(outcome)) => {
                        send(&response_tx, WorkerResponse::TurnComplete(outcome)).await
                    }
                    Some(Err(refused)) => {
                        send(&response_tx, WorkerResponse::Rejected(refused)).await
                    }
                    None => false,
                }
            }
            WorkerRequest::Shutdown => false,
        };

        if !keep_going {
            break;
        }
    }
    info!("Worker stopped");
}

/// Drive one turn to completion while refusing whatever else arrives.
///
/// Returns `None` if a shutdown arrived (or the UI went away) first; the
/// turn future is dropped, which cancels its pending timers.
async fn run_exclusive<F, T>(
    turn: F,
    request_rx: &mut mpsc::Receiver<WorkerRequest>,
    response_tx: &mpsc::Sender<WorkerResponse>,
) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::pin!(turn);
    loop {
        tokio::select! {
            result = &mut turn => return Some(result),
            request = request_rx.recv() => match request {
                Some(WorkerRequest::Shutdown) | None => {
                    debug!("Abandoning turn in flight");
                    return None;
                }
                Some(other) => {
                    debug!(?other, "Refusing request while pending");
                    let _ = response_tx
                        .send(WorkerResponse::Rejected(CommandError::Pending))
                        .await;
                }
            },
        }
    }
}

/// Returns false once the UI has hung up.
async fn send(response_tx: &mpsc::Sender<WorkerResponse>, response: WorkerResponse) -> bool {
    response_tx.send(response).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockOracle, MockReply};
    use crate::verdict::{JudgmentVerdict, Verse};
    use std::time::Duration;

    fn opening() -> MockReply {
        MockReply::Verdict(
            JudgmentVerdict::accepted("سلام")
                .with_verse(Verse::new("بیت۱").by("حافظ"))
                .with_next_letter('ز'),
        )
    }

    #[tokio::test]
    async fn test_worker_start_and_submit() {
        let oracle = MockOracle::new(vec![
            opening(),
            MockReply::Verdict(JudgmentVerdict::rejected("این بیت معروف نیست")),
        ]);
        let mut handle = spawn_worker(oracle, SessionConfig::instant());

        handle.requests.send(WorkerRequest::StartGame).await.unwrap();
        assert!(matches!(
            handle.responses.recv().await,
            Some(WorkerResponse::Started)
        ));

        handle
            .requests
            .send(WorkerRequest::SubmitVerse("زبان فارسی زیباست".into()))
            .await
            .unwrap();
        assert!(matches!(
            handle.responses.recv().await,
            Some(WorkerResponse::TurnComplete(TurnOutcome::Rejected))
        ));

        let snapshot = handle.updates.borrow().clone();
        assert_eq!(snapshot.history.len(), 4);
        assert_eq!(snapshot.required_letter, Some('ز'));

        handle.requests.send(WorkerRequest::Shutdown).await.unwrap();
        handle.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_reports_start_failure() {
        let oracle = MockOracle::new(vec![MockReply::OracleFailure]);
        let mut handle = spawn_worker(oracle, SessionConfig::instant());

        handle.requests.send(WorkerRequest::StartGame).await.unwrap();
        assert!(matches!(
            handle.responses.recv().await,
            Some(WorkerResponse::StartFailed(CommandError::Connection(_)))
        ));
        assert!(!handle.updates.borrow().active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_refuses_requests_while_pending() {
        let oracle = MockOracle::new(vec![opening(), opening()]);
        let config = SessionConfig::default().with_opening_reveal_delay(Duration::from_secs(5));
        let mut handle = spawn_worker(oracle.clone(), config);

        handle.requests.send(WorkerRequest::StartGame).await.unwrap();
        handle.requests.send(WorkerRequest::StartGame).await.unwrap();
        handle
            .requests
            .send(WorkerRequest::SubmitVerse("زمین".into()))
            .await
            .unwrap();

        assert!(matches!(
            handle.responses.recv().await,
            Some(WorkerResponse::Rejected(CommandError::Pending))
        ));
        assert!(matches!(
            handle.responses.recv().await,
            Some(WorkerResponse::Rejected(CommandError::Pending))
        ));
        assert!(matches!(
            handle.responses.recv().await,
            Some(WorkerResponse::Started)
        ));

        assert_eq!(oracle.opening_calls(), 1);
        assert!(oracle.verdict_calls().is_empty());
        assert_eq!(oracle.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_deferred_verse() {
        let oracle = MockOracle::new(vec![opening()]);
        let config = SessionConfig::default().with_opening_reveal_delay(Duration::from_secs(5));
        let mut handle = spawn_worker(oracle, config);

        handle.requests.send(WorkerRequest::StartGame).await.unwrap();
        handle.updates.wait_for(|s| s.history.len() == 1).await.unwrap();
        handle.requests.send(WorkerRequest::Shutdown).await.unwrap();
        handle.task.await.unwrap();

        assert!(handle.responses.recv().await.is_none());
        let snapshot = handle.updates.borrow().clone();
        assert_eq!(snapshot.history.len(), 1);
        assert!(snapshot.pending);
    }
}
