#![allow(dead_code)]

//! An in-process stand-in for a database server, for tests only.
//!
//! It keeps just enough state to answer the scenarios' queries with the
//! visibility `MySQL`/InnoDB documents: uncommitted rows are visible to
//! their writer and to dirty readers, read committed sees every committed
//! row, and repeatable read sees rows committed before its first statement.
//! Every call is appended to a log so tests can assert ordering.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use isodemo_core::{Backend, IsolationLevel, Statement, TxSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Bootstrap,
    Reset,
    Begin(u64, Option<IsolationLevel>),
    Execute(u64, Statement),
    Fetch(u64, Statement),
    Commit(u64),
    Rollback(u64),
    Close(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefError {
    NotBootstrapped,
    Injected(Fail),
}

/// Where to inject a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Statement(Statement),
    /// The n-th reset (1-based).
    Reset(usize),
    Commit,
}

#[derive(Debug)]
struct Row {
    value: i32,
    writer: u64,
    committed_at: Option<u64>,
}

#[derive(Debug, Default)]
pub struct Db {
    bootstrapped: bool,
    rows: Vec<Row>,
    clock: u64,
    next_tx: u64,
    resets: usize,
    pub log: Vec<Call>,
    /// Connections handed out and not yet closed.
    pub open: usize,
}

impl Db {
    pub fn committed_values(&self) -> Vec<i32> {
        self.rows
            .iter()
            .filter(|row| row.committed_at.is_some())
            .map(|row| row.value)
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub const fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    fn discard_uncommitted(&mut self, tx: u64) {
        self.rows
            .retain(|row| row.writer != tx || row.committed_at.is_some());
    }
}

pub struct Reference {
    db: Rc<RefCell<Db>>,
    dirty_reads: bool,
    fail: Option<Fail>,
}

impl Reference {
    pub fn new(dirty_reads: bool) -> Self {
        Self {
            db: Rc::default(),
            dirty_reads,
            fail: None,
        }
    }

    /// Behaves like `MySQL`.
    pub fn mysql() -> Self {
        Self::new(true)
    }

    /// Behaves like `PostgreSQL`, which runs read uncommitted as read
    /// committed.
    pub fn postgres() -> Self {
        Self::new(false)
    }

    #[must_use]
    pub fn failing(mut self, fail: Fail) -> Self {
        self.fail = Some(fail);
        self
    }

    pub fn db(&self) -> Ref<'_, Db> {
        self.db.borrow()
    }
}

pub struct RefConn {
    db: Rc<RefCell<Db>>,
}

pub struct RefSession {
    db: Rc<RefCell<Db>>,
    id: u64,
    level: IsolationLevel,
    dirty_reads: bool,
    snapshot: Option<u64>,
    fail: Option<Fail>,
}

impl Backend for Reference {
    type Error = RefError;
    type Connection = RefConn;
    type Session = RefSession;

    fn name(&self) -> &'static str {
        "reference"
    }

    fn permits_dirty_reads(&self) -> bool {
        self.dirty_reads
    }

    async fn bootstrap(&self) -> Result<(), RefError> {
        let mut db = self.db.borrow_mut();
        db.log.push(Call::Bootstrap);
        db.rows.clear();
        db.bootstrapped = true;
        Ok(())
    }

    async fn reset(&self) -> Result<RefConn, RefError> {
        let mut db = self.db.borrow_mut();
        db.log.push(Call::Reset);
        db.resets += 1;
        if self.fail == Some(Fail::Reset(db.resets)) {
            return Err(RefError::Injected(Fail::Reset(db.resets)));
        }
        if !db.bootstrapped {
            return Err(RefError::NotBootstrapped);
        }
        db.rows.retain(|row| row.committed_at.is_none());
        db.open += 1;
        Ok(RefConn {
            db: Rc::clone(&self.db),
        })
    }

    async fn begin(
        &self,
        conn: RefConn,
        level: Option<IsolationLevel>,
    ) -> Result<RefSession, RefError> {
        let mut db = conn.db.borrow_mut();
        db.next_tx += 1;
        let id = db.next_tx;
        db.log.push(Call::Begin(id, level));
        drop(db);

        Ok(RefSession {
            db: conn.db,
            id,
            level: level.unwrap_or(IsolationLevel::RepeatableRead),
            dirty_reads: self.dirty_reads,
            snapshot: None,
            fail: self.fail,
        })
    }
}

impl RefSession {
    fn check(&self, stmt: Statement) -> Result<(), RefError> {
        match self.fail {
            Some(Fail::Statement(failing)) if failing == stmt => {
                Err(RefError::Injected(Fail::Statement(stmt)))
            }
            _ => Ok(()),
        }
    }

    fn visible(&mut self, db: &Db) -> Vec<i32> {
        let snapshot = *self.snapshot.get_or_insert(db.clock);
        let dirty = self.dirty_reads && self.level == IsolationLevel::ReadUncommitted;
        let snapshot_reads = !self.level.permits_non_repeatable_reads();

        db.rows
            .iter()
            .filter(|row| match row.committed_at {
                None => row.writer == self.id || dirty,
                Some(at) => !snapshot_reads || at <= snapshot,
            })
            .map(|row| row.value)
            .collect()
    }
}

impl TxSession for RefSession {
    type Error = RefError;

    async fn execute(&mut self, stmt: Statement) -> Result<u64, RefError> {
        let db = Rc::clone(&self.db);
        let mut db = db.borrow_mut();
        db.log.push(Call::Execute(self.id, stmt));
        self.check(stmt)?;

        let visible = self.visible(&db);
        match stmt {
            Statement::Insert(value) => {
                db.rows.push(Row {
                    value,
                    writer: self.id,
                    committed_at: None,
                });
                Ok(1)
            }
            Statement::Scan | Statement::SelectFirst | Statement::SelectEq(_) => {
                Ok(visible.len() as u64)
            }
        }
    }

    async fn fetch(&mut self, stmt: Statement) -> Result<Option<i32>, RefError> {
        let db = Rc::clone(&self.db);
        let mut db = db.borrow_mut();
        db.log.push(Call::Fetch(self.id, stmt));
        self.check(stmt)?;

        let visible = self.visible(&db);
        Ok(match stmt {
            Statement::SelectEq(wanted) => visible.into_iter().find(|v| *v == wanted),
            Statement::Scan | Statement::SelectFirst | Statement::Insert(_) => {
                visible.first().copied()
            }
        })
    }

    async fn commit(&mut self) -> Result<(), RefError> {
        let mut db = self.db.borrow_mut();
        db.log.push(Call::Commit(self.id));
        if self.fail == Some(Fail::Commit) {
            return Err(RefError::Injected(Fail::Commit));
        }
        db.clock += 1;
        let clock = db.clock;
        for row in db.rows.iter_mut().filter(|row| row.writer == self.id) {
            row.committed_at.get_or_insert(clock);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), RefError> {
        let mut db = self.db.borrow_mut();
        db.log.push(Call::Rollback(self.id));
        db.discard_uncommitted(self.id);
        Ok(())
    }

    async fn close(self) -> Result<(), RefError> {
        let mut db = self.db.borrow_mut();
        db.log.push(Call::Close(self.id));
        db.discard_uncommitted(self.id);
        db.open -= 1;
        Ok(())
    }
}
