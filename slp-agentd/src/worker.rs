use std::collections::BTreeMap;
use std::thread;
use anyhow::{Context, Result};
use regex::Regex;
use tokio::sync::{mpsc, oneshot};
use shared::path::ScrPath;
use shared::types::{ServiceEntry, ServiceType};
use shared::value::{Term, Value};
use crate::agent::ScrAgent;
use crate::catalog;
use crate::services::{self, Criteria};

/// Commands sent to the agent thread
pub enum AgentCommand {
    Read {
        path: ScrPath,
        arg: Value,
        reply: oneshot::Sender<Value>,
    },
    Write {
        path: ScrPath,
        value: Value,
        arg: Value,
        reply: oneshot::Sender<Value>,
    },
    Execute {
        path: ScrPath,
        value: Value,
        arg: Value,
        reply: oneshot::Sender<Value>,
    },
    Dir(ScrPath, oneshot::Sender<Value>),
    Other(Term, oneshot::Sender<Value>),
    Services {
        name: String,
        criteria: Criteria,
        reply: oneshot::Sender<Vec<ServiceEntry>>,
    },
    FindService {
        name: String,
        criteria: Criteria,
        reply: oneshot::Sender<Option<ServiceEntry>>,
    },
    Types(oneshot::Sender<Vec<ServiceType>>),
    Attributes {
        url: String,
        ip: String,
        reply: oneshot::Sender<BTreeMap<String, String>>,
    },
    Register(String, oneshot::Sender<bool>),
    Deregister(String, oneshot::Sender<bool>),
    MatchType(Regex, oneshot::Sender<Vec<Value>>),
    Shutdown,
}

/// Handle to the thread owning the agent.
///
/// OpenSLP calls block, and the agent must only ever run one of them at a
/// time; the thread takes commands one by one off the channel.
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<AgentCommand>,
}

impl AgentHandle {
    /// Spawn a new agent thread
    pub fn spawn<A>(mut agent: A) -> Self
    where
        A: ScrAgent + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<AgentCommand>(64);

        thread::spawn(move || {
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    AgentCommand::Read { path, arg, reply } => {
                        let _ = reply.send(agent.read(&path, &arg));
                    }
                    AgentCommand::Write { path, value, arg, reply } => {
                        let _ = reply.send(agent.write(&path, &value, &arg));
                    }
                    AgentCommand::Execute { path, value, arg, reply } => {
                        let _ = reply.send(agent.execute(&path, &value, &arg));
                    }
                    AgentCommand::Dir(path, reply) => {
                        let _ = reply.send(agent.dir(&path));
                    }
                    AgentCommand::Other(term, reply) => {
                        let _ = reply.send(agent.other_command(&term));
                    }
                    AgentCommand::Services { name, criteria, reply } => {
                        let _ = reply.send(services::all(&mut agent, &name, &criteria));
                    }
                    AgentCommand::FindService { name, criteria, reply } => {
                        let _ = reply.send(services::find(&mut agent, &name, &criteria));
                    }
                    AgentCommand::Types(reply) => {
                        let _ = reply.send(services::types(&mut agent));
                    }
                    AgentCommand::Attributes { url, ip, reply } => {
                        let _ = reply.send(catalog::unicast_attr_map(&mut agent, &url, &ip));
                    }
                    AgentCommand::Register(url, reply) => {
                        let _ = reply.send(catalog::reg(&mut agent, &url));
                    }
                    AgentCommand::Deregister(url, reply) => {
                        let _ = reply.send(catalog::dereg(&mut agent, &url));
                    }
                    AgentCommand::MatchType(pattern, reply) => {
                        let _ = reply.send(catalog::match_type(&mut agent, &pattern));
                    }
                    AgentCommand::Shutdown => {
                        tracing::info!("Agent thread shutting down");
                        break;
                    }
                }
            }
        });

        Self { tx }
    }

    async fn request<T>(&self, cmd: AgentCommand, rx: oneshot::Receiver<T>) -> Result<T> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| anyhow::anyhow!("Agent thread is gone"))?;
        rx.await.context("Agent thread dropped the request")
    }

    pub async fn read(&self, path: ScrPath, arg: Value) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Read { path, arg, reply }, rx).await
    }

    pub async fn write(&self, path: ScrPath, value: Value, arg: Value) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Write { path, value, arg, reply }, rx).await
    }

    pub async fn execute(&self, path: ScrPath, value: Value, arg: Value) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Execute { path, value, arg, reply }, rx).await
    }

    pub async fn dir(&self, path: ScrPath) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Dir(path, reply), rx).await
    }

    pub async fn other_command(&self, term: Term) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Other(term, reply), rx).await
    }

    /// Services named `name` matching `criteria`
    pub async fn services(&self, name: String, criteria: Criteria) -> Result<Vec<ServiceEntry>> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Services { name, criteria, reply }, rx).await
    }

    /// First service named `name` matching `criteria`
    pub async fn find_service(&self, name: String, criteria: Criteria) -> Result<Option<ServiceEntry>> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::FindService { name, criteria, reply }, rx).await
    }

    pub async fn types(&self) -> Result<Vec<ServiceType>> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Types(reply), rx).await
    }

    /// Attribute map of a service URL, asked from `ip` unless empty
    pub async fn attributes(&self, url: String, ip: String) -> Result<BTreeMap<String, String>> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Attributes { url, ip, reply }, rx).await
    }

    pub async fn register(&self, url: String) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Register(url, reply), rx).await
    }

    pub async fn deregister(&self, url: String) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::Deregister(url, reply), rx).await
    }

    pub async fn match_type(&self, pattern: Regex) -> Result<Vec<Value>> {
        let (reply, rx) = oneshot::channel();
        self.request(AgentCommand::MatchType(pattern, reply), rx).await
    }

    /// Shutdown the agent thread
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(AgentCommand::Shutdown)
            .await
            .map_err(|_| anyhow::anyhow!("Agent thread is gone"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SlpAgent;
    use crate::config::AgentConfig;
    use crate::openslp::fake::FakeSlp;

    fn spawn(lib: FakeSlp) -> AgentHandle {
        AgentHandle::spawn(SlpAgent::new(lib, AgentConfig::default()))
    }

    #[tokio::test]
    async fn test_read_and_execute_through_thread() {
        let lib = FakeSlp::new().with_srv_types(&["service:ntp,service:ldap"]);
        let handle = spawn(lib.clone());

        let types = handle
            .read(".slp.findsrvtypes".parse().unwrap(), Value::Null)
            .await
            .unwrap();
        assert_eq!(types, Value::from(vec!["service:ntp", "service:ldap"]));

        let ok = handle
            .execute(".slp.reg".parse().unwrap(), Value::from("service:ntp://t"), Value::Null)
            .await
            .unwrap();
        assert_eq!(ok, Value::Boolean(true));
        assert!(handle.deregister("service:ntp://t".to_string()).await.unwrap());

        let log = lib.log();
        assert_eq!(log.opened, 3);
        assert_eq!(log.closed, 3);
    }

    #[tokio::test]
    async fn test_concurrent_requests_run_one_at_a_time() {
        let lib = FakeSlp::new().with_urls(&[("service:x://h", 1)]);
        let handle = spawn(lib.clone());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.read(".slp.findsrvs".parse().unwrap(), Value::Null).await
            }));
        }
        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert_eq!(result.as_list().unwrap().len(), 1);
        }

        // open and find pairs never interleave
        let log = lib.log();
        for chunk in log.calls.chunks(2) {
            assert!(chunk[0].starts_with("open"));
            assert!(chunk[1].starts_with("findsrvs"));
        }
        assert_eq!(log.opened, 8);
        assert_eq!(log.closed, 8);
    }

    #[tokio::test]
    async fn test_other_dir_and_write() {
        let handle = spawn(FakeSlp::new());
        assert_eq!(handle.other_command(Term::new("SlpAgent")).await.unwrap(), Value::Void);
        assert_eq!(handle.dir(".slp".parse().unwrap()).await.unwrap(), Value::Null);
        assert_eq!(
            handle
                .write(".slp".parse().unwrap(), Value::Null, Value::Null)
                .await
                .unwrap(),
            Value::Boolean(false)
        );
    }

    #[tokio::test]
    async fn test_requests_fail_after_shutdown() {
        let handle = spawn(FakeSlp::new());
        handle.shutdown().await.unwrap();
        // The thread exits and drops the receiver
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(handle.types().await.is_err());
    }
}
