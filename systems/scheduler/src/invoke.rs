//! Time-boxed execution of agent hooks.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{mpsc, Arc, Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use crate::{
    capture::OutputCapture,
    collaborators::Agent,
    error::{AgentFault, Hook},
};

/// Agent shared between the scheduler and the worker thread running its hook.
pub(crate) type SharedAgent = Arc<Mutex<Box<dyn Agent>>>;

/// How a hook call is shielded from the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Isolation {
    /// Runs on the scheduler thread; panics propagate to the caller.
    Unguarded,
    /// Runs on the scheduler thread; panics become faults.
    Inline,
    /// Runs on a worker thread that is abandoned after the limit.
    Threaded(Duration),
}

/// Runs `call` against `agent` and returns its value with the time it took.
///
/// A timed-out worker keeps its lock on the agent and its result is dropped on
/// arrival, so the abandoned call cannot reach scheduler state.
pub(crate) fn invoke<T, F>(
    agent: &SharedAgent,
    hook: Hook,
    isolation: Isolation,
    capture: Option<OutputCapture>,
    call: F,
) -> Result<(T, Duration), AgentFault>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn Agent) -> anyhow::Result<T> + Send + 'static,
{
    let started = Instant::now();
    let outcome = match isolation {
        Isolation::Unguarded => Ok(run(agent, capture.as_ref(), call)),
        Isolation::Inline => {
            panic::catch_unwind(AssertUnwindSafe(|| run(agent, capture.as_ref(), call)))
        }
        Isolation::Threaded(limit) => {
            return run_with_timeout(agent, hook, limit, capture, call, started);
        }
    };
    settle(hook, outcome).map(|value| (value, started.elapsed()))
}

fn run<T, F>(agent: &SharedAgent, capture: Option<&OutputCapture>, call: F) -> anyhow::Result<T>
where
    F: FnOnce(&mut dyn Agent) -> anyhow::Result<T>,
{
    let _guard = capture.map(OutputCapture::scoped);
    let mut agent = agent.lock().unwrap_or_else(PoisonError::into_inner);
    call(&mut **agent)
}

fn run_with_timeout<T, F>(
    agent: &SharedAgent,
    hook: Hook,
    limit: Duration,
    capture: Option<OutputCapture>,
    call: F,
    started: Instant,
) -> Result<(T, Duration), AgentFault>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn Agent) -> anyhow::Result<T> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let worker = Arc::clone(agent);
    let spawned = thread::Builder::new()
        .name(format!("agent-{hook}"))
        .spawn(move || {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| run(&worker, capture.as_ref(), call)));
            let _ = sender.send(outcome);
        });
    if let Err(error) = spawned {
        return Err(AgentFault::Runtime {
            hook,
            message: format!("failed to start worker thread: {error}"),
        });
    }

    match receiver.recv_timeout(limit) {
        Ok(outcome) => settle(hook, outcome).map(|value| (value, started.elapsed())),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(AgentFault::Timeout {
            hook,
            budget: limit,
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(AgentFault::Runtime {
            hook,
            message: "worker thread exited without a result".to_owned(),
        }),
    }
}

fn settle<T>(hook: Hook, outcome: thread::Result<anyhow::Result<T>>) -> Result<T, AgentFault> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(AgentFault::Runtime {
            hook,
            message: format!("{error:#}"),
        }),
        Err(payload) => Err(AgentFault::Runtime {
            hook,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "agent panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use maze_chase_core::Direction;
    use maze_chase_world::WorldState;

    use super::*;

    struct Sleeper(Duration);

    impl Agent for Sleeper {
        fn get_action(&mut self, _state: &WorldState) -> anyhow::Result<Option<Direction>> {
            thread::sleep(self.0);
            Ok(Some(Direction::Stop))
        }
    }

    fn shared(agent: impl Agent + 'static) -> SharedAgent {
        let boxed: Box<dyn Agent> = Box::new(agent);
        Arc::new(Mutex::new(boxed))
    }

    #[test]
    fn threaded_calls_return_values_within_budget() {
        let agent = shared(Sleeper(Duration::ZERO));
        let (value, elapsed) = invoke(
            &agent,
            Hook::Registration,
            Isolation::Threaded(Duration::from_secs(5)),
            None,
            |_agent| Ok(7_u32),
        )
        .expect("fast hook");
        assert_eq!(value, 7);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn slow_calls_are_abandoned() {
        let agent = shared(Sleeper(Duration::from_secs(10)));
        let started = Instant::now();
        let result = invoke(
            &agent,
            Hook::Action,
            Isolation::Threaded(Duration::from_millis(50)),
            None,
            |agent| {
                let layout = maze_chase_world::Layout::parse(&["P"])?;
                let state = WorldState::initial(&layout, 0, Default::default());
                agent.get_action(&state)
            },
        );
        assert_eq!(
            result.map(|(value, _)| value),
            Err(AgentFault::Timeout {
                hook: Hook::Action,
                budget: Duration::from_millis(50),
            })
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn errors_and_panics_become_runtime_faults() {
        let agent = shared(Sleeper(Duration::ZERO));
        let failed = invoke(&agent, Hook::Observation, Isolation::Inline, None, |_agent| {
            Err::<(), _>(anyhow::anyhow!("no path").context("planning"))
        });
        assert_eq!(
            failed.map(|(value, _)| value),
            Err(AgentFault::Runtime {
                hook: Hook::Observation,
                message: "planning: no path".to_owned(),
            })
        );

        let panicked = invoke(
            &agent,
            Hook::Finalization,
            Isolation::Threaded(Duration::from_secs(5)),
            None,
            |_agent| -> anyhow::Result<()> { panic!("index out of range") },
        );
        assert_eq!(
            panicked.map(|(value, _)| value),
            Err(AgentFault::Runtime {
                hook: Hook::Finalization,
                message: "index out of range".to_owned(),
            })
        );
    }
}
