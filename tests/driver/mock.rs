//! In-memory device and a driver over it.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use fieldbus_blocks::binary::{BinaryData, Buffer};
use fieldbus_blocks::driver::TaskFactory;
use fieldbus_blocks::task::{
    BinaryDataTask, BitTask, BlockTaskAggregator, ChannelTask, ProcessBuffer, StringTask, TaskList,
};
use fieldbus_blocks::{Block, BlockDriver, ChannelRecord, DriverOptions, Error, Mode, Result};

pub const MEMORY_SIZE: usize = 64;

/// One recorded transfer: domain, mode and merged range.
pub type Transfer = (u32, Mode, u64, u64);

#[derive(Debug, Default)]
pub struct Device {
    pub memory: BTreeMap<u32, Vec<u8>>,
    pub transfers: Vec<Transfer>,
    pub failing_reads: Vec<(u32, u64)>,
    pub failing_writes: Vec<(u32, u64)>,
}

impl Device {
    pub fn memory(&mut self, domain: u32) -> &mut Vec<u8> {
        self.memory
            .entry(domain)
            .or_insert_with(|| vec![0; MEMORY_SIZE])
    }

    pub fn transfers_in(&self, mode: Mode) -> Vec<(u32, u64, u64)> {
        self.transfers
            .iter()
            .filter(|t| t.1 == mode)
            .map(|&(domain, _, start, end)| (domain, start, end))
            .collect()
    }
}

pub type SharedDevice = Rc<RefCell<Device>>;

struct DeviceTransfer {
    device: SharedDevice,
    domain: u32,
    buffer: Vec<u8>,
}

impl ProcessBuffer for DeviceTransfer {
    fn buffer(&self) -> &dyn Buffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut dyn Buffer {
        &mut self.buffer
    }

    fn process_buffer(&mut self, block: &Block, mode: Mode) -> Result<()> {
        let mut device = self.device.borrow_mut();
        let (start, end) = (block.start() as usize, block.end() as usize);
        device
            .transfers
            .push((self.domain, mode, block.start(), block.end()));
        let failing = match mode {
            Mode::Read => &device.failing_reads,
            _ => &device.failing_writes,
        };
        if failing.contains(&(self.domain, block.start())) {
            return Err(Error::Transport(format!("device rejected {block}")));
        }
        let memory = device.memory(self.domain);
        match mode {
            Mode::Read => self.buffer.copy_from_slice(&memory[start..end]),
            _ => memory[start..end].copy_from_slice(&self.buffer),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Layout {
    Data(u64, BinaryData),
    Bit(u64, u8),
    Text(u64, usize),
}

#[derive(Debug, Default)]
pub struct TestDriver {
    pub device: SharedDevice,
    pub channels: HashMap<String, (u32, Layout)>,
    pub options: HashMap<u32, DriverOptions>,
    pub connects: usize,
    pub refuse_connection: bool,
    pub aggregations: Vec<(u32, usize)>,
    pub factories: RefCell<Vec<(u32, Mode)>>,
}

impl TestDriver {
    pub fn new() -> Self {
        TestDriver::default()
    }

    pub fn channel(mut self, name: &str, domain: u32, layout: Layout) -> Self {
        self.channels.insert(name.to_string(), (domain, layout));
        self
    }

    pub fn options(mut self, domain: u32, options: DriverOptions) -> Self {
        self.options.insert(domain, options);
        self
    }

    pub fn fill(&self, domain: u32, offset: usize, bytes: &[u8]) {
        let mut device = self.device.borrow_mut();
        device.memory(domain)[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn peek(&self, domain: u32, offset: usize, len: usize) -> Vec<u8> {
        let mut device = self.device.borrow_mut();
        device.memory(domain)[offset..offset + len].to_vec()
    }
}

impl BlockDriver for TestDriver {
    type Domain = u32;

    fn connect(&mut self) -> Result<()> {
        if self.refuse_connection {
            return Err(Error::Connection("device unreachable".into()));
        }
        self.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }

    fn to_task(
        &mut self,
        record: &ChannelRecord,
        mode: Mode,
    ) -> Result<(u32, Box<dyn ChannelTask>)> {
        let (domain, layout) = self.channels.get(record.name()).copied().ok_or_else(|| {
            Error::InvalidConfiguration(format!("unknown channel {}", record.name()))
        })?;
        let task: Box<dyn ChannelTask> = match layout {
            Layout::Data(start, data) => {
                Box::new(BinaryDataTask::new(start, data, record.value_type(), mode)?)
            }
            Layout::Bit(start, bit) => Box::new(BitTask::new(start, bit, mode)?),
            Layout::Text(start, len) => Box::new(StringTask::new(start, len, mode)?),
        };
        Ok((domain, task))
    }

    fn task_factory(&self, domain: &u32, mode: Mode) -> TaskFactory<'_> {
        self.factories.borrow_mut().push((*domain, mode));
        let device = Rc::clone(&self.device);
        let domain = *domain;
        Box::new(move |start: u64, end: u64| -> Box<dyn ProcessBuffer> {
            Box::new(DeviceTransfer {
                device: Rc::clone(&device),
                domain,
                buffer: vec![0; (end - start) as usize],
            })
        })
    }

    fn read_minimum_gap_size(&self, domain: &u32) -> u64 {
        self.options
            .get(domain)
            .map_or(0, |o| o.read_minimum_gap_size)
    }

    fn before_aggregation(
        &mut self,
        domain: &u32,
        _mode: Mode,
        aggregator: &mut BlockTaskAggregator,
    ) -> Result<()> {
        if let Some(options) = self.options.get(domain) {
            for block in options.prohibited_blocks()? {
                aggregator.add_prohibited_block(block)?;
            }
        }
        Ok(())
    }

    fn after_aggregation(&mut self, domain: &u32, tasks: &TaskList) {
        self.aggregations.push((*domain, tasks.toplevels().len()));
    }
}
