use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::api::{ApiError, WorldsApi};
use crate::types::{GenerateRequest, World};

/// Poll cadence against the operations endpoint.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Named states of the generation flow. `Failed` is reachable from
/// every other state; the rest advance strictly left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Fetching,
    Ready,
    Failed,
}

/// Errors terminating a generation attempt. Every variant is terminal;
/// recovery requires a fresh user-initiated request.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("generation did not return an operation id")]
    MissingOperationId,
    #[error("operation completed but returned no world")]
    MissingWorldId,
    #[error("{0}")]
    Remote(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Update emitted over the channel by a worker-thread generation.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Status {
        phase: GenerationPhase,
        message: String,
    },
    Ready(Box<World>),
    Failed(String),
}

/// Drives submit → poll-until-terminal → fetch against a [`WorldsApi`].
pub struct GenerationDriver<A: WorldsApi> {
    api: A,
    poll_interval: Duration,
}

impl<A: WorldsApi> GenerationDriver<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll cadence. Tests use `Duration::ZERO`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the full generation flow, emitting a status line at every
    /// transition. Blocks until a terminal state is observed; there is
    /// no wall-clock budget on the poll loop.
    pub fn run(
        &self,
        request: &GenerateRequest,
        emit: &mut dyn FnMut(GenerationPhase, &str),
    ) -> Result<World, GenerationError> {
        if request.text.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        emit(GenerationPhase::Submitting, "Starting generation…");
        let operation = self.api.generate_world(request)?;
        let operation_id = operation
            .operation_id
            .filter(|id| !id.is_empty())
            .ok_or(GenerationError::MissingOperationId)?;
        info!(%operation_id, "generation submitted");

        emit(
            GenerationPhase::Polling,
            &format!("Generating… (operation {}…)", short_id(&operation_id)),
        );

        loop {
            // Single suspend point per iteration.
            std::thread::sleep(self.poll_interval);

            let operation = self.api.get_operation(&operation_id)?;

            // Providers may report a terminal error without flipping
            // the done flag; the error payload wins.
            if let Some(error) = &operation.error {
                return Err(GenerationError::Remote(error.message_or_default()));
            }

            if operation.done {
                emit(GenerationPhase::Fetching, "Finalizing…");
                let world_id = operation
                    .response
                    .map(|world| world.world_id)
                    .filter(|id| !id.is_empty())
                    .ok_or(GenerationError::MissingWorldId)?;

                // The embedded copy can be stale; fetch the canonical
                // record before declaring the world ready.
                let world = self.api.get_world(&world_id)?;
                info!(%world_id, "world ready");
                emit(GenerationPhase::Ready, "World ready.");
                return Ok(world);
            }

            match operation.metadata.and_then(|m| m.progress) {
                Some(progress) => {
                    let percent = (progress * 100.0).round() as i64;
                    emit(GenerationPhase::Polling, &format!("Generating… {percent}%"));
                }
                None => emit(GenerationPhase::Polling, "Generating…"),
            }
        }
    }
}

/// Run a generation on a worker thread, forwarding every status
/// transition and the terminal outcome over `sender`. Send failures
/// are ignored: a dropped receiver means the viewer is shutting down.
pub fn spawn_generation<A>(
    api: A,
    request: GenerateRequest,
    sender: Sender<GenerationEvent>,
) -> JoinHandle<()>
where
    A: WorldsApi + Send + 'static,
{
    std::thread::spawn(move || {
        let driver = GenerationDriver::new(api);
        let mut emit = |phase: GenerationPhase, message: &str| {
            let _ = sender.send(GenerationEvent::Status {
                phase,
                message: message.to_string(),
            });
        };
        match driver.run(&request, &mut emit) {
            Ok(world) => {
                let _ = sender.send(GenerationEvent::Ready(Box::new(world)));
            }
            Err(error) => {
                warn!(%error, "generation failed");
                let _ = sender.send(GenerationEvent::Failed(error.to_string()));
            }
        }
    })
}

/// Fetch an existing world by id on a worker thread, skipping
/// generation entirely.
pub fn spawn_world_fetch<A>(
    api: A,
    world_id: String,
    sender: Sender<GenerationEvent>,
) -> JoinHandle<()>
where
    A: WorldsApi + Send + 'static,
{
    std::thread::spawn(move || {
        let _ = sender.send(GenerationEvent::Status {
            phase: GenerationPhase::Fetching,
            message: format!("Fetching world {}…", short_id(&world_id)),
        });
        match api.get_world(&world_id) {
            Ok(world) => {
                let _ = sender.send(GenerationEvent::Ready(Box::new(world)));
            }
            Err(error) => {
                warn!(%error, "world fetch failed");
                let _ = sender.send(GenerationEvent::Failed(error.to_string()));
            }
        }
    })
}

/// Leading characters of an identifier for status echo. Ids are
/// provider-controlled, so truncation must respect char boundaries.
pub fn short_id(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    &id[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Operation, OperationError, OperationMetadata};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedApi {
        generate_result: RefCell<Option<Result<Operation, ApiError>>>,
        poll_results: RefCell<VecDeque<Result<Operation, ApiError>>>,
        world_result: RefCell<Option<World>>,
        generate_calls: Cell<u32>,
        poll_calls: Cell<u32>,
        world_ids_fetched: RefCell<Vec<String>>,
    }

    impl ScriptedApi {
        fn with_operation(id: &str) -> Self {
            let api = Self::default();
            *api.generate_result.borrow_mut() = Some(Ok(Operation {
                operation_id: Some(id.to_string()),
                ..Operation::default()
            }));
            api
        }

        fn push_poll(&self, result: Result<Operation, ApiError>) {
            self.poll_results.borrow_mut().push_back(result);
        }

        fn serve_world(&self, world_id: &str) {
            *self.world_result.borrow_mut() = Some(World {
                world_id: world_id.to_string(),
                display_name: None,
                world_marble_url: None,
                assets: None,
            });
        }
    }

    impl WorldsApi for ScriptedApi {
        fn generate_world(&self, _request: &GenerateRequest) -> Result<Operation, ApiError> {
            self.generate_calls.set(self.generate_calls.get() + 1);
            self.generate_result
                .borrow_mut()
                .take()
                .expect("unexpected generate call")
        }

        fn get_operation(&self, _operation_id: &str) -> Result<Operation, ApiError> {
            self.poll_calls.set(self.poll_calls.get() + 1);
            self.poll_results
                .borrow_mut()
                .pop_front()
                .expect("unexpected poll call")
        }

        fn get_world(&self, world_id: &str) -> Result<World, ApiError> {
            self.world_ids_fetched.borrow_mut().push(world_id.to_string());
            Ok(self.world_result.borrow().clone().expect("no world scripted"))
        }
    }

    fn driver(api: ScriptedApi) -> GenerationDriver<ScriptedApi> {
        GenerationDriver::new(api).with_poll_interval(Duration::ZERO)
    }

    fn run_collecting(
        driver: &GenerationDriver<ScriptedApi>,
        request: &GenerateRequest,
    ) -> (Result<World, GenerationError>, Vec<String>) {
        let mut statuses = Vec::new();
        let result = driver.run(request, &mut |_, message| {
            statuses.push(message.to_string());
        });
        (result, statuses)
    }

    #[test]
    fn whitespace_prompt_fails_without_network_calls() {
        let api = ScriptedApi::default();
        let driver = driver(api);
        let (result, statuses) = run_collecting(&driver, &GenerateRequest::new("   \n\t"));
        assert!(matches!(result, Err(GenerationError::EmptyPrompt)));
        assert!(statuses.is_empty());
        assert_eq!(driver.api.generate_calls.get(), 0);
        assert_eq!(driver.api.poll_calls.get(), 0);
    }

    #[test]
    fn progress_then_done_fetches_world_once() {
        let api = ScriptedApi::with_operation("op-12345678");
        api.push_poll(Ok(Operation {
            metadata: Some(OperationMetadata {
                progress: Some(0.42),
            }),
            ..Operation::default()
        }));
        api.push_poll(Ok(Operation {
            done: true,
            response: Some(World {
                world_id: "abc123".to_string(),
                display_name: None,
                world_marble_url: None,
                assets: None,
            }),
            ..Operation::default()
        }));
        api.serve_world("abc123");

        let driver = driver(api);
        let (result, statuses) = run_collecting(&driver, &GenerateRequest::new("a misty valley"));

        let world = result.unwrap();
        assert_eq!(world.world_id, "abc123");
        assert!(statuses.iter().any(|s| s.contains("42%")));
        assert!(statuses.iter().any(|s| s == "Finalizing…"));
        assert_eq!(
            *driver.api.world_ids_fetched.borrow(),
            vec!["abc123".to_string()]
        );
    }

    #[test]
    fn error_payload_aborts_before_done() {
        let api = ScriptedApi::with_operation("op-1");
        api.push_poll(Ok(Operation {
            done: false,
            error: Some(OperationError {
                code: Some(13),
                message: Some("scene too complex".to_string()),
            }),
            ..Operation::default()
        }));

        let driver = driver(api);
        let (result, _) = run_collecting(&driver, &GenerateRequest::new("impossible geometry"));

        match result {
            Err(GenerationError::Remote(message)) => assert_eq!(message, "scene too complex"),
            other => panic!("expected remote error, got {other:?}"),
        }
        assert!(driver.api.world_ids_fetched.borrow().is_empty());
    }

    #[test]
    fn missing_operation_id_is_a_protocol_error() {
        let api = ScriptedApi::default();
        *api.generate_result.borrow_mut() = Some(Ok(Operation::default()));
        let driver = driver(api);
        let (result, _) = run_collecting(&driver, &GenerateRequest::new("a prompt"));
        assert!(matches!(result, Err(GenerationError::MissingOperationId)));
        assert_eq!(driver.api.poll_calls.get(), 0);
    }

    #[test]
    fn done_without_world_id_is_a_protocol_error() {
        let api = ScriptedApi::with_operation("op-1");
        api.push_poll(Ok(Operation {
            done: true,
            ..Operation::default()
        }));
        let driver = driver(api);
        let (result, _) = run_collecting(&driver, &GenerateRequest::new("a prompt"));
        assert!(matches!(result, Err(GenerationError::MissingWorldId)));
        assert!(driver.api.world_ids_fetched.borrow().is_empty());
    }

    #[test]
    fn poll_transport_failure_aborts_with_remote_message() {
        let api = ScriptedApi::with_operation("op-1");
        api.push_poll(Err(ApiError::Status {
            status: 404,
            message: "operation not found".to_string(),
        }));
        let driver = driver(api);
        let (result, _) = run_collecting(&driver, &GenerateRequest::new("a prompt"));
        match result {
            Err(GenerationError::Api(ApiError::Status { status, message })) => {
                assert_eq!(status, 404);
                assert_eq!(message, "operation not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn short_id_truncates_long_identifiers() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("op-1"), "op-1");
        assert_eq!(short_id("1234567é9"), "1234567é");
    }
}
