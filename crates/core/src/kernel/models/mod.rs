//! Actions are the fundamental unit of work in Delta Lake. Each action performs a single atomic
//! operation on the state of a Delta table. Actions are stored in the `_delta_log` directory of a
//! Delta table in JSON format. The log is a time series of actions that represent all the changes
//! made to a table.

use serde::{Deserialize, Serialize};

pub(crate) mod actions;

pub use actions::*;

#[derive(Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum Action {
    #[serde(rename = "metaData")]
    Metadata(Metadata),
    Protocol(Protocol),
    Add(Add),
    Remove(Remove),
    Txn(Transaction),
    CommitInfo(CommitInfo),
}

impl Action {
    /// The tag this action is stored under in the log
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Metadata(_) => "metaData",
            Action::Protocol(_) => "protocol",
            Action::Add(_) => "add",
            Action::Remove(_) => "remove",
            Action::Txn(_) => "txn",
            Action::CommitInfo(_) => "commitInfo",
        }
    }
}

impl From<Add> for Action {
    fn from(a: Add) -> Self {
        Self::Add(a)
    }
}

impl From<Remove> for Action {
    fn from(a: Remove) -> Self {
        Self::Remove(a)
    }
}

impl From<Metadata> for Action {
    fn from(a: Metadata) -> Self {
        Self::Metadata(a)
    }
}

impl From<Protocol> for Action {
    fn from(a: Protocol) -> Self {
        Self::Protocol(a)
    }
}

impl From<Transaction> for Action {
    fn from(a: Transaction) -> Self {
        Self::Txn(a)
    }
}

impl From<CommitInfo> for Action {
    fn from(a: CommitInfo) -> Self {
        Self::CommitInfo(a)
    }
}

/// One object of a commit file. A single object may carry several actions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogEntry {
    #[serde(rename = "metaData")]
    metadata: Option<Metadata>,
    protocol: Option<Protocol>,
    add: Option<Add>,
    remove: Option<Remove>,
    txn: Option<Transaction>,
    commit_info: Option<CommitInfo>,
}

impl LogEntry {
    /// The actions of this entry. metaData comes first so that partition values of an add in
    /// the same object resolve against the schema it announces.
    pub(crate) fn into_actions(self) -> impl Iterator<Item = Action> {
        [
            self.metadata.map(Action::Metadata),
            self.protocol.map(Action::Protocol),
            self.add.map(Action::Add),
            self.remove.map(Action::Remove),
            self.txn.map(Action::Txn),
            self.commit_info.map(Action::CommitInfo),
        ]
        .into_iter()
        .flatten()
    }
}
