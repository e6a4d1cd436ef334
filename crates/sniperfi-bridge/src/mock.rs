//! Scripted in-process bridge for tests and dry runs

use crate::{ExecutionBridge, Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Command name
    pub command: String,
    /// Arguments in order
    pub args: Vec<String>,
}

#[derive(Clone)]
enum Reply {
    Respond(Result<Value>),
    Panic(String),
}

struct Rule {
    command: String,
    arg: Option<String>,
    reply: Reply,
    once: bool,
}

impl Rule {
    fn matches(&self, command: &str, args: &[String]) -> bool {
        self.command == command
            && match &self.arg {
                Some(arg) => args.iter().any(|a| a == arg),
                None => true,
            }
    }
}

struct Delay {
    command: String,
    arg: Option<String>,
    after: Duration,
}

/// Mock execution bridge
///
/// Replies are scripted per command, optionally narrowed to calls carrying a
/// given argument. Argument-specific rules win over command-wide ones, and
/// one-shot rules are consumed before standing ones. Unscripted commands
/// fail with a process error.
#[derive(Default)]
pub struct MockBridge {
    rules: Mutex<Vec<Rule>>,
    delays: Mutex<Vec<Delay>>,
    calls: Mutex<Vec<MockCall>>,
    rpc_endpoint: Mutex<Option<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockBridge {
    /// Create new mock bridge with no scripted replies
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, command: &str, arg: Option<&str>, reply: Reply, once: bool) {
        self.rules.lock().push(Rule {
            command: command.to_string(),
            arg: arg.map(str::to_string),
            reply,
            once,
        });
    }

    /// Standing reply for `command`
    pub fn on(&self, command: &str, response: Result<Value>) -> &Self {
        self.push(command, None, Reply::Respond(response), false);
        self
    }

    /// Standing reply for `command` when one of its arguments is `arg`
    pub fn on_arg(&self, command: &str, arg: &str, response: Result<Value>) -> &Self {
        self.push(command, Some(arg), Reply::Respond(response), false);
        self
    }

    /// One-shot reply for `command`
    pub fn once(&self, command: &str, response: Result<Value>) -> &Self {
        self.push(command, None, Reply::Respond(response), true);
        self
    }

    /// Panic inside the call when `command` runs with argument `arg`
    pub fn panic_on_arg(&self, command: &str, arg: &str, message: &str) -> &Self {
        self.push(command, Some(arg), Reply::Panic(message.to_string()), false);
        self
    }

    /// Delay every `command` call
    pub fn delay(&self, command: &str, after: Duration) -> &Self {
        self.delays.lock().push(Delay {
            command: command.to_string(),
            arg: None,
            after,
        });
        self
    }

    /// Delay `command` calls carrying argument `arg`
    pub fn delay_arg(&self, command: &str, arg: &str, after: Duration) -> &Self {
        self.delays.lock().push(Delay {
            command: command.to_string(),
            arg: Some(arg.to_string()),
            after,
        });
        self
    }

    /// All invocations so far, in arrival order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Number of invocations of `command`
    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.command == command)
            .count()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Last endpoint passed to [`ExecutionBridge::set_rpc_endpoint`]
    pub fn rpc_endpoint(&self) -> Option<String> {
        self.rpc_endpoint.lock().clone()
    }

    fn delay_for(&self, command: &str, args: &[String]) -> Option<Duration> {
        let delays = self.delays.lock();
        delays
            .iter()
            .filter(|d| d.command == command)
            .find(|d| d.arg.as_ref().is_some_and(|a| args.iter().any(|x| x == a)))
            .or_else(|| {
                delays
                    .iter()
                    .find(|d| d.command == command && d.arg.is_none())
            })
            .map(|d| d.after)
    }

    fn take_reply(&self, command: &str, args: &[String]) -> Option<Reply> {
        let mut rules = self.rules.lock();
        let rank = |rule: &Rule| match (rule.arg.is_some(), rule.once) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };

        let index = rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(command, args))
            .min_by_key(|(i, rule)| (rank(rule), *i))
            .map(|(i, _)| i)?;

        if rules[index].once {
            Some(rules.remove(index).reply)
        } else {
            Some(rules[index].reply.clone())
        }
    }
}

#[async_trait]
impl ExecutionBridge for MockBridge {
    async fn invoke(&self, command: &str, args: &[String]) -> Result<Value> {
        self.calls.lock().push(MockCall {
            command: command.to_string(),
            args: args.to_vec(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(after) = self.delay_for(command, args) {
            tokio::time::sleep(after).await;
        }

        match self.take_reply(command, args) {
            Some(Reply::Respond(response)) => response,
            Some(Reply::Panic(message)) => panic!("{}", message),
            None => Err(Error::Process(format!(
                "no mock response for '{}'",
                command
            ))),
        }
    }

    fn set_rpc_endpoint(&self, endpoint: &str) {
        *self.rpc_endpoint.lock() = Some(endpoint.to_string());
    }
}
