//! Channel-level read and write on top of block aggregation.
//!
//! A concrete driver implements [`BlockDriver`] by describing how channels
//! map to tasks and how a merged block is transferred. The provided methods
//! then group channels by domain, aggregate each domain on its own, run the
//! resulting transfers and report one outcome per [`ChannelRecord`].
//!
//! Failures stay local:
//! - a record that cannot be turned into a task fails alone,
//! - an unfeasible domain fails all of its records and no other,
//! - a failed transfer fails the records served by that transfer,
//! - a channel that cannot be decoded or encoded fails alone, and a value
//!   that cannot be encoded never reaches the device.
//!
//! Only a failing [`connect`](BlockDriver::connect) makes `read`, `write`
//! or [`PreparedRead::execute`] return an error.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::task::{BlockTaskAggregator, ChannelTask, Mode, ProcessBuffer, TaskList};
use crate::{ChannelRecord, Result};

/// Builds the transport side of one merged block.
pub type TaskFactory<'a> = Box<dyn FnMut(u64, u64) -> Box<dyn ProcessBuffer> + 'a>;

/// A driver for a block-addressed device.
pub trait BlockDriver {
    /// Independent address space, such as a unit id or register bank.
    type Domain: Ord + Clone + fmt::Debug;

    fn connect(&mut self) -> Result<()>;

    /// Never called by the provided methods.
    fn disconnect(&mut self) -> Result<()>;

    /// Maps a record to its domain and channel task.
    ///
    /// `mode` is [`Mode::Read`] for reads and [`Mode::Write`] for writes. A
    /// write may be answered with an [`Mode::Update`] task.
    fn to_task(
        &mut self,
        record: &ChannelRecord,
        mode: Mode,
    ) -> Result<(Self::Domain, Box<dyn ChannelTask>)>;

    /// Returns the factory for top-level transfers of `domain` in `mode`,
    /// which is either [`Mode::Read`] or [`Mode::Write`].
    fn task_factory(&self, domain: &Self::Domain, mode: Mode) -> TaskFactory<'_>;

    /// Gap bridged when merging read blocks of `domain`.
    fn read_minimum_gap_size(&self, _domain: &Self::Domain) -> u64 {
        0
    }

    /// Called before each domain is aggregated, typically to add prohibited
    /// blocks. An error fails every record of the domain.
    fn before_aggregation(
        &mut self,
        _domain: &Self::Domain,
        _mode: Mode,
        _aggregator: &mut BlockTaskAggregator,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after each successful domain aggregation.
    fn after_aggregation(&mut self, _domain: &Self::Domain, _tasks: &TaskList) {}

    /// Reads every record and stores its value or failure on it.
    fn read(&mut self, records: &mut [ChannelRecord]) -> Result<()> {
        self.connect()?;
        self.optimize(records, Mode::Read).run(records);
        Ok(())
    }

    /// Writes the value carried by every record and stores the outcome on it.
    fn write(&mut self, records: &mut [ChannelRecord]) -> Result<()> {
        self.connect()?;
        self.optimize(records, Mode::Write).run(records);
        Ok(())
    }

    /// Aggregates a read once so that it can be executed repeatedly.
    fn prepare_read(&mut self, records: Vec<ChannelRecord>) -> PreparedRead {
        let plan = self.optimize(&records, Mode::Read);
        PreparedRead { records, plan }
    }

    /// Builds the execution plan for `records`. [`Mode::Update`] is treated
    /// as [`Mode::Write`].
    fn optimize(&mut self, records: &[ChannelRecord], mode: Mode) -> ExecutionPlan {
        let mut failures = Vec::new();
        let mut domains: BTreeMap<Self::Domain, Vec<(usize, Box<dyn ChannelTask>)>> =
            BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let request = if mode == Mode::Read {
                Mode::Read
            } else {
                Mode::Write
            };
            let (domain, task) = match self.to_task(record, request) {
                Ok(converted) => converted,
                Err(e) => {
                    failures.push((index, e.to_string()));
                    continue;
                }
            };
            let accepted = match request {
                Mode::Read => task.mode() == Mode::Read,
                _ => task.mode().writes(),
            };
            if !accepted {
                failures.push((
                    index,
                    format!("channel task mode {} cannot serve a {request}", task.mode()),
                ));
                continue;
            }
            if request == Mode::Write {
                if let Err(message) = check_encodable(record, task.as_ref()) {
                    failures.push((index, message));
                    continue;
                }
            }
            domains.entry(domain).or_default().push((index, task));
        }

        let mut lists = Vec::with_capacity(domains.len());
        for (domain, tasks) in domains {
            let indices: Vec<usize> = tasks.iter().map(|(index, _)| *index).collect();
            let mut aggregator = BlockTaskAggregator::new();
            for (index, task) in tasks {
                aggregator.add_task(index, task);
            }

            match aggregate_domain(self, &domain, mode, aggregator) {
                Ok(list) => {
                    debug!(
                        "domain {domain:?}: {} channels in {} transfers",
                        list.len(),
                        list.toplevels().len()
                    );
                    self.after_aggregation(&domain, &list);
                    lists.push(list);
                }
                Err(e) => {
                    warn!("domain {domain:?}: aggregation failed: {e}");
                    let message = e.to_string();
                    failures.extend(indices.into_iter().map(|index| (index, message.clone())));
                }
            }
        }

        ExecutionPlan {
            mode,
            lists,
            failures,
        }
    }
}

/// Encodes the record's value into a scratch buffer. A value that fails here
/// must not join a transfer, or its bytes would be flushed unwritten.
fn check_encodable(
    record: &ChannelRecord,
    task: &dyn ChannelTask,
) -> core::result::Result<(), String> {
    let value = record
        .value()
        .ok_or_else(|| "no value to write".to_string())?;
    let mut scratch = vec![0u8; task.block().len() as usize];
    task.write(&mut scratch, value).map_err(|e| e.to_string())
}

fn aggregate_domain<D>(
    driver: &mut D,
    domain: &D::Domain,
    mode: Mode,
    mut aggregator: BlockTaskAggregator,
) -> Result<TaskList>
where
    D: BlockDriver + ?Sized,
{
    driver.before_aggregation(domain, mode, &mut aggregator)?;

    if mode == Mode::Read {
        aggregator.set_minimum_gap_size(driver.read_minimum_gap_size(domain));
        return aggregator.aggregate(driver.task_factory(domain, Mode::Read));
    }

    if aggregator.has_update_tasks() {
        aggregator.set_minimum_gap_size(driver.read_minimum_gap_size(domain));
        aggregator.aggregate_update(
            driver.task_factory(domain, Mode::Read),
            driver.task_factory(domain, Mode::Write),
        )
    } else {
        aggregator.set_minimum_gap_size(0);
        aggregator.aggregate(driver.task_factory(domain, Mode::Write))
    }
}

/// Aggregated transfers for a set of records, plus the records that already
/// failed while the plan was built.
#[derive(Debug)]
pub struct ExecutionPlan {
    mode: Mode,
    lists: Vec<TaskList>,
    failures: Vec<(usize, String)>,
}

impl ExecutionPlan {
    /// [`Mode::Read`] for reads, otherwise the write mode it was built for.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// One task list per successfully aggregated domain, in domain order.
    pub fn task_lists(&self) -> &[TaskList] {
        &self.lists
    }

    /// Records that failed during planning and why.
    pub fn failures(&self) -> &[(usize, String)] {
        &self.failures
    }

    /// Runs every transfer and stores the outcome on `records`, which must be
    /// the records the plan was built from.
    pub fn run(&mut self, records: &mut [ChannelRecord]) {
        for (index, message) in &self.failures {
            let Some(record) = records.get_mut(*index) else {
                continue;
            };
            if self.mode == Mode::Read {
                record.set_read_failure(message.as_str());
            } else {
                record.set_failure(message.as_str());
            }
        }
        for list in &mut self.lists {
            list.run(records);
        }
    }
}

/// A read aggregated once and executed any number of times, for example on
/// every poll cycle.
#[derive(Debug)]
pub struct PreparedRead {
    records: Vec<ChannelRecord>,
    plan: ExecutionPlan,
}

impl PreparedRead {
    /// Connects through `driver` and performs the read again, returning the
    /// updated records.
    pub fn execute<D>(&mut self, driver: &mut D) -> Result<&[ChannelRecord]>
    where
        D: BlockDriver + ?Sized,
    {
        driver.connect()?;
        self.plan.run(&mut self.records);
        Ok(&self.records)
    }

    pub fn records(&self) -> &[ChannelRecord] {
        &self.records
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn into_records(self) -> Vec<ChannelRecord> {
        self.records
    }
}
